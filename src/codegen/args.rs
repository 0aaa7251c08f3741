//! Typed argument encoding
//!
//! Every atomic argument is emitted as a one byte type tag followed by its
//! payload. The tags are part of the on-wire format and frozen:
//!
//! | Tag  | Meaning |
//! |------|---------|
//! | 0x00 | end of argument list |
//! | 0x01 | `i32` literal or label reference |
//! | 0x02 | global numeric var (byte offset follows) |
//! | 0x03 | local numeric var (index follows) |
//! | 0x04 | `i8` literal |
//! | 0x05 | `i16` literal |
//! | 0x06 | float (IEEE bits, or fixed-point `i16`) |
//! | 0x07 | global numeric var, array-indexed by var |
//! | 0x08 | local numeric var, array-indexed by var |
//! | 0x09 | 8-char text label with prefix |
//! | 0x0A | global text8 var |
//! | 0x0B | local text8 var |
//! | 0x0C | global text8 var, array-indexed by var |
//! | 0x0D | local text8 var, array-indexed by var |
//! | 0x0E | length-prefixed string |
//! | 0x0F | 16-char text label (always prefixed) |
//! | 0x10 | global text16 var |
//! | 0x11 | local text16 var |
//! | 0x12 | global text16 var, array-indexed by var |
//! | 0x13 | local text16 var, array-indexed by var |
//!
//! For every type here the sizer sits directly above its emitter; the two
//! must agree to the byte under every option combination.

use crate::codegen::{CodeGenerator, CompiledSize, GenerateCode};
use crate::ir::{Arg, InlineString, LabelData, StringKind, VarIndex, VarRef, VarType};
use crate::options::Options;

// The raw float encoding below reinterprets f32 bits as u32.
const _: () = assert!(f32::MANTISSA_DIGITS == 24 && std::mem::size_of::<f32>() == 4);

impl<'a> CompiledSize for Arg<'a> {
    fn compiled_size(&self, options: &Options) -> usize {
        match self {
            Arg::Eoal => 1,
            Arg::Int8(_) => 1 + 1,
            Arg::Int16(_) => 1 + 2,
            Arg::Int32(_) => 1 + 4,
            Arg::Float(value) => {
                if options.optimize_zero_floats && *value == 0.0 {
                    1 + 1
                } else if options.use_half_float {
                    1 + 2
                } else {
                    1 + 4
                }
            }
            Arg::Label(_) => 1 + 4,
            Arg::Var(var) => var.compiled_size(options),
            Arg::String(string) => string.compiled_size(options),
        }
    }
}

impl<'a> GenerateCode<'a> for Arg<'a> {
    fn generate_code(&self, codegen: &mut CodeGenerator<'a, '_>) {
        match self {
            Arg::Eoal => codegen.sink.emit_u8(0x00),
            Arg::Int8(value) => {
                codegen.sink.emit_u8(0x04);
                codegen.sink.emit_i8(*value);
            }
            Arg::Int16(value) => {
                codegen.sink.emit_u8(0x05);
                codegen.sink.emit_i16(*value);
            }
            Arg::Int32(value) => {
                codegen.sink.emit_u8(0x01);
                codegen.sink.emit_i32(*value);
            }
            Arg::Float(value) => {
                if codegen.options.optimize_zero_floats && *value == 0.0 {
                    codegen.sink.emit_u8(0x04);
                    codegen.sink.emit_i8(0);
                } else if codegen.options.use_half_float {
                    codegen.sink.emit_u8(0x06);
                    codegen.sink.emit_i16((*value * 16.0) as i16);
                } else {
                    codegen.sink.emit_u8(0x06);
                    codegen.sink.emit_u32(value.to_bits());
                }
            }
            Arg::Label(label) => label.generate_code(codegen),
            Arg::Var(var) => var.generate_code(codegen),
            Arg::String(string) => string.generate_code(codegen),
        }
    }
}

impl<'a> GenerateCode<'a> for LabelData<'a> {
    /// A label reference is the `i32` tag followed by a signed position.
    /// Local offsets are negated on the wire; the sign is how the VM tells
    /// them apart from absolute ones.
    fn generate_code(&self, codegen: &mut CodeGenerator<'a, '_>) {
        codegen.sink.emit_u8(0x01);

        if codegen.options.use_local_offsets {
            let absolute = self.offset() as i32;
            codegen.emit_local_offset(absolute);
        } else if self.script.script_type.uses_local_offsets() {
            // Cross-script references into relocated scripts are rejected
            // during semantic analysis.
            assert!(
                self.script == codegen.script,
                "local label reference crosses a script boundary"
            );
            let local = self.local_offset.get().expect("label not resolved") as i32;
            codegen.emit_local_offset(local);
        } else {
            codegen.sink.emit_i32(self.offset() as i32);
        }
    }
}

/// Tag for a variable reference without a runtime index.
fn plain_var_tag(var_type: VarType, global: bool) -> u8 {
    match var_type {
        VarType::Int | VarType::Float => {
            if global {
                0x02
            } else {
                0x03
            }
        }
        VarType::TextLabel => {
            if global {
                0x0A
            } else {
                0x0B
            }
        }
        VarType::TextLabel16 => {
            if global {
                0x10
            } else {
                0x11
            }
        }
    }
}

/// Tag for a variable reference indexed by another variable.
fn array_var_tag(var_type: VarType, global: bool) -> u8 {
    match var_type {
        VarType::Int | VarType::Float => {
            if global {
                0x07
            } else {
                0x08
            }
        }
        VarType::TextLabel => {
            if global {
                0x0C
            } else {
                0x0D
            }
        }
        VarType::TextLabel16 => {
            if global {
                0x12
            } else {
                0x13
            }
        }
    }
}

impl<'a> CompiledSize for VarRef<'a> {
    fn compiled_size(&self, _options: &Options) -> usize {
        match self.index {
            None | Some(VarIndex::Literal(_)) => 1 + 2,
            Some(VarIndex::Var(_)) => 1 + 2 + 2 + 1 + 1,
        }
    }
}

impl<'a> GenerateCode<'a> for VarRef<'a> {
    fn generate_code(&self, codegen: &mut CodeGenerator<'a, '_>) {
        let var = self.var;
        let global = var.global;

        match self.index {
            None => {
                codegen.sink.emit_u8(plain_var_tag(var.var_type, global));
                let value = if global { var.offset() } else { var.index };
                codegen.sink.emit_u16(value as u16);
            }
            Some(VarIndex::Literal(idx)) => {
                // Constant subscripts are folded into the emitted position.
                codegen.sink.emit_u8(plain_var_tag(var.var_type, global));
                let value = if global {
                    var.offset() as i32 + idx * 4
                } else {
                    var.index as i32 + idx
                };
                codegen.sink.emit_u16(value as u16);
            }
            Some(VarIndex::Var(index_var)) => {
                let count = var.count.expect("array reference to a scalar variable");
                assert!(
                    (1..=255).contains(&count),
                    "array length out of range: {}",
                    count
                );

                codegen.sink.emit_u8(array_var_tag(var.var_type, global));
                let target = if global { var.offset() } else { var.index };
                codegen.sink.emit_u16(target as u16);
                let index_pos = if index_var.global {
                    index_var.offset()
                } else {
                    index_var.index
                };
                codegen.sink.emit_u16(index_pos as u16);
                codegen.sink.emit_u8(count as u8);
                codegen
                    .sink
                    .emit_u8((var.var_type as u8 & 0x7F) | ((index_var.global as u8) << 7));
            }
        }
    }
}

impl CompiledSize for InlineString {
    fn compiled_size(&self, options: &Options) -> usize {
        match self.kind {
            StringKind::TextLabel8 => usize::from(options.has_text_label_prefix) + 8,
            StringKind::TextLabel16 => 1 + 16,
            StringKind::StringVar => 1 + 1 + self.storage.len(),
            StringKind::String128 => 128,
        }
    }
}

impl<'a> GenerateCode<'a> for InlineString {
    fn generate_code(&self, codegen: &mut CodeGenerator<'a, '_>) {
        // Length bounds are enforced by the annotation pass upstream.
        match self.kind {
            StringKind::TextLabel8 => {
                assert!(self.storage.len() <= 8, "text label longer than 8 bytes");
                if codegen.options.has_text_label_prefix {
                    codegen.sink.emit_u8(0x09);
                }
                codegen.sink.emit_chars(8, &self.storage);
            }
            StringKind::TextLabel16 => {
                assert!(self.storage.len() <= 16, "text label longer than 16 bytes");
                codegen.sink.emit_u8(0x0F);
                codegen.sink.emit_chars(16, &self.storage);
            }
            StringKind::StringVar => {
                assert!(self.storage.len() <= 127, "string longer than 127 bytes");
                codegen.sink.emit_u8(0x0E);
                codegen.sink.emit_u8(self.storage.len() as u8);
                codegen.sink.emit_chars(self.storage.len(), &self.storage);
            }
            StringKind::String128 => {
                assert!(self.storage.len() <= 128, "string longer than 128 bytes");
                codegen.sink.emit_chars(128, &self.storage);
            }
        }
    }
}
