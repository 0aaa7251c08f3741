use crate::ir::{LabelId, VarId};

/// Inline string flavors of the argument encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    /// Fixed 8 characters, zero-padded. Tagged only when the target VM
    /// expects a text label prefix.
    TextLabel8,
    /// Fixed 16 characters, zero-padded, always tagged.
    TextLabel16,
    /// Length-prefixed, up to 127 bytes.
    StringVar,
    /// Raw 128-character buffer, no tag, no length.
    String128,
}

/// An inline string argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineString {
    pub kind: StringKind,
    pub storage: String,
}

impl InlineString {
    pub fn new(kind: StringKind, storage: impl Into<String>) -> InlineString {
        InlineString {
            kind,
            storage: storage.into(),
        }
    }
}

/// Optional subscript of a variable reference.
#[derive(Debug, Clone, Copy)]
pub enum VarIndex<'a> {
    /// Compile-time constant index, folded into the emitted offset.
    Literal(i32),
    /// Runtime index held in another variable.
    Var(VarId<'a>),
}

/// A reference to a variable, possibly subscripted.
#[derive(Debug, Clone, Copy)]
pub struct VarRef<'a> {
    pub var: VarId<'a>,
    pub index: Option<VarIndex<'a>>,
}

impl<'a> VarRef<'a> {
    pub fn plain(var: VarId<'a>) -> VarRef<'a> {
        VarRef { var, index: None }
    }

    pub fn indexed(var: VarId<'a>, index: VarIndex<'a>) -> VarRef<'a> {
        VarRef {
            var,
            index: Some(index),
        }
    }
}

/// An atomic command argument.
#[derive(Debug, Clone)]
pub enum Arg<'a> {
    /// End-of-argument-list marker for variadic commands.
    Eoal,
    Int8(i8),
    Int16(i16),
    Int32(i32),
    /// Literal float. The on-wire encoding depends on the active options.
    Float(f32),
    /// Reference to a label; resolves to a signed offset.
    Label(LabelId<'a>),
    Var(VarRef<'a>),
    String(InlineString),
}

/// A command opcode with its arguments.
#[derive(Debug, Clone)]
pub struct Command<'a> {
    pub opcode: u16,
    pub args: Vec<Arg<'a>>,
}

/// One pseudo-instruction of the linear IR.
///
/// This is a closed sum: every variant is known here, and the code generator
/// dispatches on it with a plain `match`. Each variant has a sizer and an
/// emitter that must agree to the byte (see [`crate::codegen`]).
#[derive(Debug, Clone)]
pub enum Instr<'a> {
    /// A bare argument atom outside of any command.
    Arg(Arg<'a>),
    Command(Command<'a>),
    /// Marks the position of a label. Emits no bytes.
    LabelDef(LabelId<'a>),
    /// Raw bytes passed through untouched.
    Hex(Vec<u8>),
}
