use crate::util::RefId;
use std::cell::Cell;
use std::path::PathBuf;

/// On-wire variant of the target VM.
///
/// The dialects are incremental: Miami adds a target identifier to the
/// header's variables segment, SanAndreas adds three more header segments and
/// streamed scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Liberty,
    Miami,
    SanAndreas,
}

impl Dialect {
    /// Identifier byte stored right behind the first header trampoline.
    ///
    /// The oldest game executable predates the convention, so Liberty keeps
    /// a NUL there.
    pub fn target_id(self) -> i8 {
        match self {
            Dialect::Liberty => 0,
            Dialect::Miami => b'm' as i8,
            Dialect::SanAndreas => b's' as i8,
        }
    }
}

/// Role of a script within the compiled image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptType {
    /// The entry script of the image.
    Main,
    /// A script required alongside main (`LAUNCH_MISSION`).
    MainExtension,
    /// A script started from main on demand.
    Subscript,
    /// A mission script, loaded into a shared mission slot at runtime.
    Mission,
    /// A script streamed in from its own file (SanAndreas only).
    StreamedScript,
}

impl ScriptType {
    /// Whether label references inside this kind of script are encoded as
    /// negated local offsets.
    ///
    /// Missions and streamed scripts are relocated into a runtime buffer, so
    /// absolute positions in the image are meaningless to them.
    pub fn uses_local_offsets(self) -> bool {
        matches!(self, ScriptType::Mission | ScriptType::StreamedScript)
    }
}

/// One translation unit of the program.
///
/// `offset` and `size` start out unset. `size` is filled by the label
/// resolution pass, `offset` by the image layout step that runs between
/// resolution and emission. Both are write-once: once emission starts they
/// are read-only.
#[derive(Debug)]
pub struct ScriptData {
    pub path: PathBuf,
    pub script_type: ScriptType,

    /// Position of this script's code within the final image.
    pub offset: Cell<Option<u32>>,

    /// Size in bytes of this script's code.
    pub size: Cell<Option<u32>>,
}

pub type ScriptId<'a> = RefId<'a, ScriptData>;

impl ScriptData {
    pub fn new(path: impl Into<PathBuf>, script_type: ScriptType) -> ScriptData {
        ScriptData {
            path: path.into(),
            script_type,
            offset: Cell::new(None),
            size: Cell::new(None),
        }
    }

    /// Name of the script as it appears in the streamed scripts directory:
    /// the upper-cased stem of its file name.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_ascii_uppercase())
            .unwrap_or_default()
    }
}
