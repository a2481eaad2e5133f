//! Include chains: each directive is compiled into its own unit and folded into an
//! accumulator, which is then folded into the including unit.

use super::info::SymbolsInfo;
use super::merge::merge_included_symbols;
use super::{SymbolsCompiler, MAX_INCLUDE_DEPTH};
use crate::xkb::ast::{IncludeDirective, IncludeStmt, MergeMode};
use crate::xkb::keymap::MAX_GROUPS;

/// Error weight of an include that could not be loaded; enough to abandon the
/// including file.
const FAILED_INCLUDE_ERRORS: usize = 10;

impl SymbolsCompiler<'_> {
    pub(super) fn handle_include_symbols(
        &mut self,
        info: &mut SymbolsInfo,
        stmt: &IncludeStmt,
    ) -> bool {
        if self.include_depth >= MAX_INCLUDE_DEPTH {
            self.ctx.error(format!(
                "Exceeded include depth threshold ({}); Ignoring include \"{}\"",
                MAX_INCLUDE_DEPTH, stmt.text
            ));
            info.error_count += FAILED_INCLUDE_ERRORS;
            return false;
        }

        let mut included = SymbolsInfo::new(info.file_id);
        included.name = Some(stmt.text.clone());

        for directive in &stmt.directives {
            let file = match self
                .loader
                .load(self.ctx, &directive.file, directive.map.as_deref())
            {
                Ok(file) => file,
                Err(err) => {
                    self.ctx.error(format!(
                        "Error processing include \"{}\": {}",
                        stmt.text, err
                    ));
                    info.error_count += FAILED_INCLUDE_ERRORS;
                    return false;
                }
            };
            tracing::trace!(target: "xkbsym", file = %directive.file, id = file.id, "including");

            let mut next = SymbolsInfo::new(file.id);
            next.merge = MergeMode::Override;
            next.dflt.merge = MergeMode::Override;
            next.explicit_group = self.explicit_group_for(info, directive);

            self.include_depth += 1;
            self.handle_symbols_file(&mut next, &file, MergeMode::Override);
            self.include_depth -= 1;

            merge_included_symbols(self.ctx, self.keymap, &mut included, next, directive.merge);
        }

        merge_included_symbols(self.ctx, self.keymap, info, included, stmt.merge);
        info.error_count == 0
    }

    /// Explicit group for a directive: its own `:N` if valid, else the includer's.
    fn explicit_group_for(
        &mut self,
        info: &SymbolsInfo,
        directive: &IncludeDirective,
    ) -> Option<usize> {
        let Some(modifier) = &directive.modifier else {
            return info.explicit_group;
        };

        match modifier.trim().parse::<usize>() {
            Ok(group) if (1..=MAX_GROUPS).contains(&group) => Some(group - 1),
            _ => {
                self.ctx.error(format!(
                    "Cannot set explicit group to {} - must be between 1..{}; Ignoring group number",
                    modifier, MAX_GROUPS
                ));
                info.explicit_group
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xkb::ast::{Expr, Statement, SymbolsDef, VarDef, XkbFile};
    use crate::xkb::context::Context;
    use crate::xkb::diagnostics::Severity;
    use crate::xkb::include::MemoryLoader;
    use crate::xkb::keymap::{KeyName, Keymap};
    use crate::xkb::keysym::Keysym;

    fn key_file(name: &str, key: &str, syms: &[&str]) -> XkbFile {
        XkbFile::new(
            name,
            vec![Statement::Symbols(SymbolsDef {
                merge: MergeMode::Default,
                key: key.to_string(),
                body: vec![VarDef::bare(Expr::keysyms(syms))],
            })],
        )
    }

    fn include(text: &str) -> Statement {
        Statement::Include(IncludeStmt::parse(MergeMode::Default, text).expect("valid include"))
    }

    fn run(loader: &mut MemoryLoader, file: &XkbFile) -> (SymbolsInfo, Context) {
        let mut ctx = Context::new();
        let mut keymap = Keymap::new();
        keymap.add_key("AC01", 38).add_key("AC02", 39);
        let mut info = SymbolsInfo::new(file.id);
        let mut compiler = SymbolsCompiler::new(&mut ctx, &mut keymap, loader);
        compiler.handle_symbols_file(&mut info, file, MergeMode::Override);
        (info, ctx)
    }

    fn first_sym(info: &SymbolsInfo, key: &str, group: usize) -> Keysym {
        let keyi = info
            .keys
            .iter()
            .find(|k| k.name == KeyName::new(key))
            .expect("key present");
        keyi.groups[group].levels[0].syms.first()
    }

    #[test]
    fn chain_merges_with_directive_modes() {
        let mut loader = MemoryLoader::new()
            .with_map("base", key_file("base", "AC01", &["a"]))
            .with_map("over", key_file("over", "AC01", &["b"]))
            .with_map("aug", key_file("aug", "AC01", &["c"]));

        let (info, _) = run(&mut loader, &XkbFile::new("top", vec![include("base+over|aug")]));
        assert_eq!(info.error_count, 0);
        assert_eq!(info.keys.len(), 1);
        assert_eq!(first_sym(&info, "AC01", 0), Keysym::from_char('b'));
    }

    #[test]
    fn explicit_group_moves_included_symbols() {
        let mut loader = MemoryLoader::new()
            .with_map("us", key_file("us", "AC01", &["a", "A"]))
            .with_map("ru", key_file("ru", "AC01", &["Cyrillic_ef", "Cyrillic_EF"]));

        let (info, ctx) = run(&mut loader, &XkbFile::new("top", vec![include("us+ru:2")]));
        assert_eq!(info.error_count, 0);
        let keyi = &info.keys[0];
        assert_eq!(keyi.groups.len(), 2);
        assert_eq!(first_sym(&info, "AC01", 0), Keysym::from_char('a'));
        assert_eq!(first_sym(&info, "AC01", 1), Keysym(0x06c6));
        assert_eq!(keyi.groups[1].levels[1].syms.first(), Keysym(0x06e6));
        assert!(keyi.groups[1].defined.symbols);
        assert!(ctx.diagnostics().iter().all(|d| d.severity != Severity::Warning));
    }

    #[test]
    fn out_of_range_group_falls_back_to_caller() {
        let mut loader = MemoryLoader::new().with_map("us", key_file("us", "AC01", &["a"]));
        let (info, ctx) = run(&mut loader, &XkbFile::new("top", vec![include("us:7")]));
        assert_eq!(info.error_count, 0);
        assert_eq!(info.keys[0].groups.len(), 1);
        assert!(ctx.has_diagnostic("Cannot set explicit group to 7"));
    }

    #[test]
    fn missing_file_abandons_includer() {
        let mut loader = MemoryLoader::new();
        let file = XkbFile::new(
            "top",
            vec![include("nowhere"), Statement::Symbols(SymbolsDef {
                merge: MergeMode::Default,
                key: "AC02".into(),
                body: vec![VarDef::bare(Expr::keysyms(&["x"]))],
            })],
        );
        let (info, ctx) = run(&mut loader, &file);
        assert_eq!(info.error_count, FAILED_INCLUDE_ERRORS + 1);
        assert!(info.keys.is_empty());
        assert!(ctx.has_diagnostic("Abandoning symbols file \"top\""));
    }

    #[test]
    fn errors_inside_include_propagate() {
        let broken = XkbFile::new(
            "broken",
            vec![Statement::Var(VarDef::field("frobnicate", Expr::Integer(1)))],
        );
        let mut loader = MemoryLoader::new()
            .with_map("broken", broken)
            .with_map("us", key_file("us", "AC01", &["a"]));
        let (info, _) = run(&mut loader, &XkbFile::new("top", vec![include("us+broken")]));
        // The failing include statement counts once more on top of the propagated error.
        assert_eq!(info.error_count, 2);
    }

    #[test]
    fn recursive_include_is_cut_off() {
        let mut loader = MemoryLoader::new().with_map("loop", XkbFile::new("loop", vec![include("loop")]));
        let (info, ctx) = run(&mut loader, &XkbFile::new("top", vec![include("loop")]));
        assert!(info.error_count > 0);
        assert!(ctx.has_diagnostic("Exceeded include depth threshold"));
    }
}
