use crate::ir::ScriptId;
use crate::util::RefId;
use std::cell::Cell;

/// A position in a script that label references point at.
///
/// `local_offset` is a write-once cell: the label resolution pass fills it in,
/// and it is read-only from then on. Labels may be referenced from other
/// scripts, but only where the owning script's type allows absolute
/// references.
#[derive(Debug)]
pub struct LabelData<'a> {
    /// The script this label is defined in. Non-owning back-link.
    pub script: ScriptId<'a>,

    /// Byte position of the label within its owning script's code.
    pub local_offset: Cell<Option<u32>>,
}

pub type LabelId<'a> = RefId<'a, LabelData<'a>>;

impl<'a> LabelData<'a> {
    pub fn new(script: ScriptId<'a>) -> LabelData<'a> {
        LabelData {
            script,
            local_offset: Cell::new(None),
        }
    }

    /// Absolute byte position of the label within the final image.
    ///
    /// Panics if label resolution has not run yet or the owning script has
    /// not been placed in the image.
    pub fn offset(&self) -> u32 {
        let base = self
            .script
            .offset
            .get()
            .expect("script not placed in the image");
        base + self
            .local_offset
            .get()
            .expect("label not resolved")
    }
}
