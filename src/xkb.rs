//! XKB keymap compilation, symbols section.
//!
//! The modules split along the stages of a compile:
//!
//! - [`ast`] and [`include`]: the statement tree and how included files are found.
//! - [`keysym`], [`expr`], [`action`], [`vmod`]: resolving the values statements carry.
//! - [`keymap`]: the keymap the earlier sections produced and symbols are written onto.
//! - [`symbols`]: the compiler proper.
//! - [`dump`]: a serializable view of the result.
//!
//! Everything is driven through a [`context::Context`], which owns the atom table
//! and collects diagnostics.

pub mod action;
pub mod ast;
pub mod atom;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod dump;
pub mod error;
pub mod expr;
pub mod include;
pub mod keymap;
pub mod keysym;
pub mod symbols;
pub mod vmod;
