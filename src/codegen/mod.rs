//! Bytecode generation from the linear IR
//!
//! ### Two phases
//!
//! Generating the image is a strict two phase affair:
//!
//!   1. __Resolve__ ([`resolve_labels`]): a serial pass over every script
//!      that assigns each label its byte position and each script its size.
//!      This is the only phase that writes to label and script cells.
//!
//!   2. __Emit__ ([`CodeGenerator`], [`crate::codegen::ScmHeader`]): each
//!      script's IR is written into its own [`ByteSink`], sized exactly from
//!      the resolve pass. Labels are read-only here, so emission of distinct
//!      scripts is independent.
//!
//! Between the phases the driver places the scripts in the image
//! ([`layout_scripts`]), since absolute label references need final
//! positions.
//!
//! ### Sizing discipline
//!
//! Every IR variant implements both [`CompiledSize`] and [`GenerateCode`],
//! kept textually adjacent per variant. The two must agree to the byte under
//! every option combination: the sink's capacity comes from the sizer, the
//! emitter asserts it fills the sink exactly. There is no relocation table
//! and no second patch-up pass; agreeing sizes are what make label offsets
//! correct.

mod args;
mod header;
mod labels;
mod sink;

pub use header::*;
pub use labels::*;
pub use sink::*;

use crate::diag::Diagnostics;
use crate::ir::{Command, Instr, ScriptId, ScriptType};
use crate::options::Options;

/// Number of bytes a node occupies on the wire under the given options.
///
/// Pure: no I/O, no mutation, and independent of where the node sits.
pub trait CompiledSize {
    fn compiled_size(&self, options: &Options) -> usize;
}

/// Emission of a node into the current script's sink.
pub trait GenerateCode<'a> {
    fn generate_code(&self, codegen: &mut CodeGenerator<'a, '_>);
}

/// Drives emission of one script's IR sequence.
///
/// Construct only after label resolution: the sink capacity is taken from
/// `script.size`. Emission must fill the sink exactly; any deviation means a
/// sizer and an emitter disagreed, and [`CodeGenerator::generate`] panics.
pub struct CodeGenerator<'a, 'd> {
    pub script: ScriptId<'a>,
    pub options: &'d Options,
    pub diag: &'d dyn Diagnostics,
    pub sink: ByteSink,
}

impl<'a, 'd> CodeGenerator<'a, 'd> {
    pub fn new(
        script: ScriptId<'a>,
        options: &'d Options,
        diag: &'d dyn Diagnostics,
    ) -> CodeGenerator<'a, 'd> {
        let size = script.size.get().expect("script size not resolved");
        CodeGenerator {
            script,
            options,
            diag,
            sink: ByteSink::new(size as usize),
        }
    }

    /// Emit the whole IR sequence and return the script's code blob.
    pub fn generate(mut self, ir: &[Instr<'a>]) -> Vec<u8> {
        for instr in ir {
            instr.generate_code(&mut self);
        }
        assert!(
            self.sink.is_full(),
            "script emission stopped at byte {} of {}",
            self.sink.cursor(),
            self.sink.capacity()
        );
        self.sink.into_bytes()
    }

    /// Emit a label position in local form: negated, so the VM can tell it
    /// apart from an absolute position. A zero offset cannot be negated into
    /// a distinguishable value; report it and keep going so later errors
    /// still surface.
    fn emit_local_offset(&mut self, offset: i32) {
        if offset == 0 {
            self.diag.error("reference to zero offset");
        }
        self.sink.emit_i32(-offset);
    }
}

impl<'a> CompiledSize for Command<'a> {
    fn compiled_size(&self, options: &Options) -> usize {
        let mut size = 2;
        for arg in &self.args {
            size += arg.compiled_size(options);
        }
        size
    }
}

impl<'a> GenerateCode<'a> for Command<'a> {
    fn generate_code(&self, codegen: &mut CodeGenerator<'a, '_>) {
        codegen.sink.emit_u16(self.opcode);
        for arg in &self.args {
            arg.generate_code(codegen);
        }
    }
}

impl<'a> CompiledSize for Instr<'a> {
    fn compiled_size(&self, options: &Options) -> usize {
        match self {
            Instr::Arg(arg) => arg.compiled_size(options),
            Instr::Command(command) => command.compiled_size(options),
            Instr::LabelDef(_) => 0,
            Instr::Hex(bytes) => bytes.len(),
        }
    }
}

impl<'a> GenerateCode<'a> for Instr<'a> {
    fn generate_code(&self, codegen: &mut CodeGenerator<'a, '_>) {
        match self {
            Instr::Arg(arg) => arg.generate_code(codegen),
            Instr::Command(command) => command.generate_code(codegen),
            // Label definitions have no physical representation.
            Instr::LabelDef(_) => {}
            Instr::Hex(bytes) => codegen.sink.emit_bytes(bytes),
        }
    }
}

/// A script together with its lowered IR, as handed over by the compiler.
pub struct ScriptUnit<'a> {
    pub script: ScriptId<'a>,
    pub ir: Vec<Instr<'a>>,
}

/// Place scripts in the image, one after the other, starting at
/// `base_offset` (usually the header size).
///
/// Streamed scripts each begin their own file and get offset zero. The order
/// of `scripts` is the image order; the caller is responsible for putting
/// missions behind the main scripts where the target expects that.
pub fn layout_scripts<'a>(base_offset: u32, scripts: impl IntoIterator<Item = ScriptId<'a>>) {
    let mut offset = base_offset;
    for script in scripts {
        if script.script_type == ScriptType::StreamedScript {
            script.offset.set(Some(0));
        } else {
            script.offset.set(Some(offset));
            offset += script.size.get().expect("script size not resolved");
        }
    }
}

/// Resolve, place and emit a whole program's scripts.
///
/// Runs the resolve phase serially over every unit, lays the scripts out
/// starting at `base_offset`, then emits each unit into its own buffer. The
/// returned blobs are in unit order; concatenation and file naming are the
/// caller's business.
pub fn generate_program<'a>(
    units: &[ScriptUnit<'a>],
    base_offset: u32,
    options: &Options,
    diag: &dyn Diagnostics,
) -> Vec<Vec<u8>> {
    for unit in units {
        resolve_labels(unit.script, &unit.ir, options);
    }
    layout_scripts(base_offset, units.iter().map(|unit| unit.script));

    units
        .iter()
        .map(|unit| CodeGenerator::new(unit.script, options, diag).generate(&unit.ir))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::diag::BufferedDiagnostics;
    use crate::ir::{Arg, ScriptData};
    use crate::sym::{SymArenas, SymTable};

    #[test]
    fn cross_script_references_see_final_positions() {
        let arenas = SymArenas::new();
        let symbols = SymTable::new(&arenas);
        let main = symbols.add_script(ScriptData::new("main.sc", ScriptType::Main));
        let sub = symbols.add_script(ScriptData::new("sub.sc", ScriptType::Subscript));
        let entry = symbols.add_label(sub);

        let units = vec![
            ScriptUnit {
                script: main,
                ir: vec![Instr::Command(Command {
                    opcode: 0x004F,
                    args: vec![Arg::Label(entry), Arg::Eoal],
                })],
            },
            ScriptUnit {
                script: sub,
                ir: vec![
                    Instr::Hex(vec![0; 6]),
                    Instr::LabelDef(entry),
                    Instr::Command(Command {
                        opcode: 0x004E,
                        args: vec![],
                    }),
                ],
            },
        ];

        let options = Options::default();
        let diag = BufferedDiagnostics::default();
        let blobs = generate_program(&units, 100, &options, &diag);

        // main is 8 bytes at offset 100, sub follows at 108, the label sits
        // 6 bytes into it.
        assert_eq!(main.offset.get(), Some(100));
        assert_eq!(sub.offset.get(), Some(108));
        assert_eq!(blobs[0], vec![0x4F, 0x00, 0x01, 114, 0, 0, 0, 0x00]);
        assert_eq!(blobs[1], vec![0, 0, 0, 0, 0, 0, 0x4E, 0x00]);
        assert_eq!(diag.error_count(), 0);
    }

    #[test]
    fn mission_scripts_use_negated_local_offsets() {
        let arenas = SymArenas::new();
        let symbols = SymTable::new(&arenas);
        let mission = symbols.add_script(ScriptData::new("m1.sc", ScriptType::Mission));
        let target = symbols.add_label(mission);

        let units = vec![ScriptUnit {
            script: mission,
            ir: vec![
                Instr::Hex(vec![0; 0x10]),
                Instr::LabelDef(target),
                Instr::Command(Command {
                    opcode: 0x0002,
                    args: vec![Arg::Label(target)],
                }),
            ],
        }];

        let options = Options::default();
        let diag = BufferedDiagnostics::default();
        let blobs = generate_program(&units, 0, &options, &diag);
        assert_eq!(&blobs[0][0x10..], &[0x02, 0x00, 0x01, 0xF0, 0xFF, 0xFF, 0xFF]);
        assert_eq!(diag.error_count(), 0);
    }

    #[test]
    fn zero_local_offset_is_reported_and_emission_continues() {
        let arenas = SymArenas::new();
        let symbols = SymTable::new(&arenas);
        let mission = symbols.add_script(ScriptData::new("m1.sc", ScriptType::Mission));
        let start = symbols.add_label(mission);

        let units = vec![ScriptUnit {
            script: mission,
            ir: vec![
                Instr::LabelDef(start),
                Instr::Command(Command {
                    opcode: 0x0002,
                    args: vec![Arg::Label(start)],
                }),
                Instr::Command(Command {
                    opcode: 0x004E,
                    args: vec![],
                }),
            ],
        }];

        let options = Options::default();
        let diag = BufferedDiagnostics::default();
        let blobs = generate_program(&units, 0, &options, &diag);

        assert_eq!(diag.messages(), vec!["reference to zero offset"]);
        // A zero is written and the rest of the script still comes out.
        assert_eq!(blobs[0], vec![0x02, 0x00, 0x01, 0, 0, 0, 0, 0x4E, 0x00]);
    }

    #[test]
    fn forced_local_offsets_negate_absolute_positions() {
        let arenas = SymArenas::new();
        let symbols = SymTable::new(&arenas);
        let main = symbols.add_script(ScriptData::new("main.sc", ScriptType::Main));
        let target = symbols.add_label(main);

        let units = vec![ScriptUnit {
            script: main,
            ir: vec![
                Instr::Hex(vec![0; 4]),
                Instr::LabelDef(target),
                Instr::Command(Command {
                    opcode: 0x0002,
                    args: vec![Arg::Label(target)],
                }),
            ],
        }];

        let options = Options {
            use_local_offsets: true,
            ..Options::default()
        };
        let diag = BufferedDiagnostics::default();
        let blobs = generate_program(&units, 0x20, &options, &diag);

        // Label sits at absolute 0x24; emitted negated even in a main script.
        assert_eq!(&blobs[0][4..], &[0x02, 0x00, 0x01, 0xDC, 0xFF, 0xFF, 0xFF]);
    }
}
