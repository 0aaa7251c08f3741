//! Bytecode generation for the mission-script VM family
//!
//! This crate turns the linear intermediate representation produced by the
//! compiler frontend into the byte-exact images the Liberty, Miami and
//! SanAndreas script VMs execute: one code blob per script, plus the
//! multi-segment header blob that opens the main image file. Writing the
//! blobs to disk, and everything before the IR (parsing, semantic analysis,
//! command tables), lives outside this crate.
//!
//! ### Example
//!
//! ```
//! use scmgen::codegen::{generate_program, ScriptUnit};
//! use scmgen::diag::BufferedDiagnostics;
//! use scmgen::ir::{Arg, Command, Instr, ScriptData, ScriptType};
//! use scmgen::options::Options;
//! use scmgen::sym::{SymArenas, SymTable};
//!
//! let arenas = SymArenas::new();
//! let symbols = SymTable::new(&arenas);
//! let script = symbols.add_script(ScriptData::new("main.sc", ScriptType::Main));
//! let top = symbols.add_label(script);
//!
//! // WAIT 100 / GOTO top
//! let ir = vec![
//!     Instr::LabelDef(top),
//!     Instr::Command(Command { opcode: 0x0001, args: vec![Arg::Int8(100)] }),
//!     Instr::Command(Command { opcode: 0x0002, args: vec![Arg::Label(top)] }),
//! ];
//!
//! let options = Options::default();
//! let diag = BufferedDiagnostics::default();
//! let blobs = generate_program(&[ScriptUnit { script, ir }], 0, &options, &diag);
//!
//! assert_eq!(blobs[0], vec![0x01, 0x00, 0x04, 100, 0x02, 0x00, 0x01, 0, 0, 0, 0]);
//! assert_eq!(diag.error_count(), 0);
//! ```

pub mod codegen;
pub mod diag;
pub mod ir;
pub mod options;
pub mod sym;
pub mod util;
