//! A two-pass assembler for the 16-bit "20465" pedagogical architecture,
//! featuring:
//! - a macro preprocessor (`mcro`/`mcroend`)
//! - a first pass building the symbol table and instruction/data images
//! - a second pass resolving fix-ups and emitting base-4 textual output
//!
//! The assembler recognizes the following directives:
//! - `.data v1, v2, ...`: store a list of signed 10-bit words
//! - `.string "text"`: store a zero-terminated string
//! - `.mat [R][C], v1, v2, ...`: store an R-by-C matrix, padded with zeros
//! - `.entry name`: export a label to the entry listing
//! - `.extern name`: import a label from another object file
//!
//! and the following instructions, grouped by operand arity:
//! - two operands: `mov`, `cmp`, `add`, `sub`, `lea`
//! - one operand: `clr`, `not`, `inc`, `dec`, `jmp`, `bne`, `jsr`, `red`, `prn`
//! - no operands: `rts`, `stop`
//!
//! Each accepts a subset of the four addressing modes: immediate (`#5`),
//! direct (`LABEL`), matrix access (`LABEL[r1][r2]`), and direct register
//! (`r0`..`r7`).

pub mod base4;
pub mod cli;
pub mod context;
pub mod directive;
pub mod driver;
pub mod error;
pub mod first_pass;
pub mod fixup;
pub mod instruction;
pub mod lex;
pub mod logging;
pub mod macros;
pub mod names;
pub mod second_pass;
pub mod symbol;
