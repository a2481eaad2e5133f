//! # xkbsym
//!
//! A compiler for the symbols section of XKB keyboard descriptions: given the
//! already-compiled keycodes and key types of a keymap and a parsed symbols file,
//! it decides which keysyms, actions and modifiers every key produces.
//!
//! ```text
//! xkb_symbols "us" {
//!     include "latin"
//!     name[Group1] = "English (US)";
//!     key <AC01> { [ a, A ] };
//!     modifier_map Lock { Caps_Lock };
//! };
//! ```
//!
//! Statement trees are read from YAML or JSON (see [`xkb::ast`]); includes are
//! resolved through an [`IncludeLoader`]. A compile returns either a
//! [`CompileError`] or a [`MaterializeReport`], with diagnostics collected on the
//! [`Context`].

pub mod xkb;

pub use xkb::ast::{MergeMode, XkbFile};
pub use xkb::config::{Config, Loader as ConfigLoader};
pub use xkb::context::Context;
pub use xkb::diagnostics::{Diagnostic, Severity};
pub use xkb::dump::KeymapSummary;
pub use xkb::error::{CompileError, LoadError};
pub use xkb::include::{DirectoryLoader, IncludeLoader, MemoryLoader};
pub use xkb::keymap::{Keymap, KeymapDescription};
pub use xkb::symbols::{compile_symbols, MaterializeReport};
