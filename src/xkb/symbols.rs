//! The symbols compiler.
//!
//! Compiles the symbols section of a keymap: which keysyms and actions every key
//! produces on each group and shift level, plus the modifier map. Compilation runs
//! in two phases:
//!
//! 1. **Build.** The statement tree is walked in declaration order into a
//!    [`SymbolsInfo`] unit. Includes recurse into fresh units that are merged back
//!    according to their merge mode. Failed statements are counted; past
//!    [`info::MAX_ERRORS`] the rest of a file is abandoned.
//! 2. **Materialize.** If the top-level unit has keys and no errors, its keys are
//!    resolved against the keymap's keycodes and types and written onto the keymap.
//!
//! ```text
//! XkbFile ──build──▶ SymbolsInfo ──materialize──▶ Keymap
//!    ▲                  ▲
//!    └── include ───────┘   (recursive, merged by MergeMode)
//! ```

pub mod classify;
pub mod info;
pub mod merge;

mod builder;
mod group;
mod include;
mod materialize;

pub use classify::{find_automatic_type, AutomaticType};
pub use info::{GroupInfo, KeyInfo, KeyRepeat, ModMapEntry, ModMapTarget, SymbolsInfo, MAX_ERRORS};
pub use materialize::MaterializeReport;

use super::action::ActionsInfo;
use super::ast::{MergeMode, XkbFile};
use super::context::Context;
use super::error::CompileError;
use super::include::IncludeLoader;
use super::keymap::Keymap;

/// Nesting limit for include chains.
pub const MAX_INCLUDE_DEPTH: usize = 15;

/// State shared by every unit of one compile.
pub(crate) struct SymbolsCompiler<'a> {
    ctx: &'a mut Context,
    keymap: &'a mut Keymap,
    loader: &'a mut dyn IncludeLoader,
    actions: ActionsInfo,
    include_depth: usize,
}

impl<'a> SymbolsCompiler<'a> {
    pub(crate) fn new(
        ctx: &'a mut Context,
        keymap: &'a mut Keymap,
        loader: &'a mut dyn IncludeLoader,
    ) -> Self {
        Self {
            ctx,
            keymap,
            loader,
            actions: ActionsInfo::new(),
            include_depth: 0,
        }
    }
}

/// Compile `file` as the symbols section of `keymap`.
///
/// `keymap` must already hold the keycodes, aliases, key types and virtual
/// modifiers of the earlier sections. Includes are resolved through `loader`.
/// Every diagnostic is recorded on `ctx`.
///
/// Keys that cannot be materialized do not fail the compile; they are counted in
/// the returned report.
pub fn compile_symbols(
    ctx: &mut Context,
    keymap: &mut Keymap,
    file: &XkbFile,
    merge: MergeMode,
    loader: &mut dyn IncludeLoader,
) -> Result<MaterializeReport, CompileError> {
    let mut info = SymbolsInfo::new(file.id);
    info.dflt.merge = merge;

    let mut compiler = SymbolsCompiler::new(ctx, keymap, loader);
    compiler.handle_symbols_file(&mut info, file, merge);

    let section = info.display_name().to_string();
    if info.keys.is_empty() {
        return Err(CompileError::NoKeys { section });
    }
    if info.error_count != 0 {
        return Err(CompileError::Errors {
            section,
            count: info.error_count,
        });
    }

    tracing::debug!(target: "xkbsym", keys = info.keys.len(), "materializing symbols");
    Ok(compiler.copy_symbols_to_keymap(info))
}
