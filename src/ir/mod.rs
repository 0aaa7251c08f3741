//! Intermediate representation handed over by the compiler
//!
//! The upstream compiler lowers each script into a linear sequence of
//! [`Instr`] pseudo-instructions. Scripts, labels and variables live in the
//! arenas of [`crate::sym::SymTable`] and are referred to by cheap
//! pointer-identity handles ([`ScriptId`], [`LabelId`], [`VarId`]); the IR
//! nodes only borrow them. A label carries a non-owning back-link to its
//! owning script so that the code generator can ask for the script type and
//! the absolute position without any reciprocal ownership.

mod data;
mod label;
mod script;
mod var;

pub use data::*;
pub use label::*;
pub use script::*;
pub use var::*;
