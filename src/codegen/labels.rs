use crate::codegen::CompiledSize;
use crate::ir::{Instr, ScriptId};
use crate::options::Options;

/// Assign every label defined in `ir` its byte position within the script.
///
/// Single forward pass: label definitions capture the running offset, every
/// other node advances it by its compiled size. The final offset is the size
/// of the script's code and is stored into `script.size` before being
/// returned.
///
/// This is the only step of code generation that mutates label state. Run it
/// (serially) over every script before any emission starts; the emitters
/// treat label and script cells as read-only.
pub fn resolve_labels<'a>(script: ScriptId<'a>, ir: &[Instr<'a>], options: &Options) -> u32 {
    let mut offset: u32 = 0;
    for instr in ir {
        match instr {
            Instr::LabelDef(label) => label.local_offset.set(Some(offset)),
            _ => offset += instr.compiled_size(options) as u32,
        }
    }
    script.size.set(Some(offset));
    offset
}
