//! Placement of symbols and actions into a key's groups and levels.

use super::info::{GroupFields, GroupInfo, KeyInfo};
use super::SymbolsCompiler;
use crate::xkb::ast::Expr;
use crate::xkb::atom::Atom;
use crate::xkb::expr::resolve_group;
use crate::xkb::keymap::{LevelSyms, MAX_GROUPS};
use crate::xkb::keysym::{lookup_keysym, Keysym};

/// The two kinds of per-level content a group can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum GroupContent {
    Symbols,
    Actions,
}

impl GroupContent {
    fn name(self) -> &'static str {
        match self {
            GroupContent::Symbols => "symbols",
            GroupContent::Actions => "actions",
        }
    }

    fn is_defined(self, fields: GroupFields) -> bool {
        match self {
            GroupContent::Symbols => fields.symbols,
            GroupContent::Actions => fields.actions,
        }
    }
}

impl SymbolsCompiler<'_> {
    /// Zero-based group that `what` should go into, growing `keyi.groups` to hold it.
    ///
    /// Without a subscript this is the first group lacking `what`.
    pub(super) fn get_group_index(
        &mut self,
        keyi: &mut KeyInfo,
        index: Option<&Expr>,
        what: GroupContent,
    ) -> Option<usize> {
        let Some(index) = index else {
            if let Some(free) = keyi
                .groups
                .iter()
                .position(|g| !what.is_defined(g.defined))
            {
                return Some(free);
            }
            if keyi.groups.len() >= MAX_GROUPS {
                self.ctx.error(format!(
                    "Too many groups of {} for key {} (max {}); Ignoring {} defined for extra groups",
                    what.name(),
                    keyi.name,
                    MAX_GROUPS,
                    what.name()
                ));
                return None;
            }
            keyi.groups.push(GroupInfo::default());
            return Some(keyi.groups.len() - 1);
        };

        let Some(group) = resolve_group(self.ctx, index) else {
            self.ctx.error(format!(
                "Illegal group index for {} of key {}; Definition with non-integer array index ignored",
                what.name(),
                keyi.name
            ));
            return None;
        };

        let group = group as usize - 1;
        if group >= keyi.groups.len() {
            keyi.groups.resize_with(group + 1, GroupInfo::default);
        }
        Some(group)
    }

    pub(super) fn add_symbols_to_key(
        &mut self,
        group_names: &[Option<Atom>],
        keyi: &mut KeyInfo,
        index: Option<&Expr>,
        value: Option<&Expr>,
    ) -> bool {
        let Some(ndx) = self.get_group_index(keyi, index, GroupContent::Symbols) else {
            return false;
        };

        let Some(value) = value else {
            keyi.groups[ndx].defined.symbols = true;
            return true;
        };

        let Expr::KeysymList(levels) = value else {
            self.ctx.error(format!(
                "Expected a list of symbols, found {}; Ignoring symbols for group {} of {}",
                value.kind_name(),
                ndx + 1,
                keyi.name
            ));
            return false;
        };

        if keyi.groups[ndx].defined.symbols {
            self.ctx.error(format!(
                "Symbols for key {}, group {} already defined; Ignoring duplicate definition",
                keyi.name,
                ndx + 1
            ));
            return false;
        }

        let key_name = keyi.name;
        let groupi = &mut keyi.groups[ndx];
        if groupi.levels.len() < levels.len() {
            groupi.levels.resize_with(levels.len(), Default::default);
        }
        groupi.defined.symbols = true;

        for (i, names) in levels.iter().enumerate() {
            let resolved: Result<Vec<Keysym>, &str> = names
                .iter()
                .map(|name| lookup_keysym(name).ok_or(name.as_str()))
                .collect();

            groupi.levels[i].syms = match resolved {
                Ok(syms) if syms == [Keysym::NO_SYMBOL] => LevelSyms::None,
                Ok(syms) => LevelSyms::from_vec(syms),
                Err(unknown) => {
                    let group_name = group_names
                        .get(ndx)
                        .copied()
                        .flatten()
                        .map_or("unnamed", |atom| self.ctx.atom_text(atom))
                        .to_string();
                    self.ctx.warn(format!(
                        "Could not resolve keysym {} for key {}, group {} ({}), level {}",
                        unknown,
                        key_name,
                        ndx + 1,
                        group_name,
                        i + 1
                    ));
                    LevelSyms::None
                }
            };
        }

        true
    }

    pub(super) fn add_actions_to_key(
        &mut self,
        keyi: &mut KeyInfo,
        index: Option<&Expr>,
        value: Option<&Expr>,
    ) -> bool {
        let Some(ndx) = self.get_group_index(keyi, index, GroupContent::Actions) else {
            return false;
        };

        let Some(value) = value else {
            keyi.groups[ndx].defined.actions = true;
            return true;
        };

        let Expr::ActionList(actions) = value else {
            self.ctx.error(format!(
                "Bad expression type ({}) for action list value; Ignoring actions for group {} of {}",
                value.kind_name(),
                ndx + 1,
                keyi.name
            ));
            return false;
        };

        if keyi.groups[ndx].defined.actions {
            self.ctx.error(format!(
                "Actions for key {}, group {} already defined",
                keyi.name,
                ndx + 1
            ));
            return false;
        }

        let key_name = keyi.name;
        let groupi = &mut keyi.groups[ndx];
        if groupi.levels.len() < actions.len() {
            groupi.levels.resize_with(actions.len(), Default::default);
        }
        groupi.defined.actions = true;

        for (i, def) in actions.iter().enumerate() {
            match self.actions.handle_action_def(self.ctx, self.keymap, def) {
                Some(action) => groupi.levels[i].action = action,
                None => self.ctx.error(format!(
                    "Illegal action definition for {}; Action for group {}/level {} ignored",
                    key_name,
                    ndx + 1,
                    i + 1
                )),
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xkb::action::{Action, ModAction};
    use crate::xkb::context::Context;
    use crate::xkb::include::MemoryLoader;
    use crate::xkb::keymap::{KeyName, Keymap};

    fn with_compiler<R>(f: impl FnOnce(&mut SymbolsCompiler<'_>) -> R) -> (R, Context) {
        let mut ctx = Context::with_verbosity(5);
        let mut keymap = Keymap::new();
        let mut loader = MemoryLoader::new();
        let result = {
            let mut compiler = SymbolsCompiler::new(&mut ctx, &mut keymap, &mut loader);
            f(&mut compiler)
        };
        (result, ctx)
    }

    fn key() -> KeyInfo {
        let mut keyi = KeyInfo::new(1);
        keyi.name = KeyName::new("AC01");
        keyi
    }

    #[test]
    fn unsubscripted_lists_fill_successive_groups() {
        let (keyi, _) = with_compiler(|c| {
            let mut keyi = key();
            for list in [["a", "A"], ["b", "B"]] {
                assert!(c.add_symbols_to_key(&[], &mut keyi, None, Some(&Expr::keysyms(&list))));
            }
            keyi
        });
        assert_eq!(keyi.groups.len(), 2);
        assert_eq!(keyi.groups[1].levels[1].syms, LevelSyms::One(Keysym::from_char('B')));
    }

    #[test]
    fn symbols_and_actions_pick_groups_independently() {
        let (keyi, _) = with_compiler(|c| {
            let mut keyi = key();
            assert!(c.add_symbols_to_key(&[], &mut keyi, None, Some(&Expr::keysyms(&["a"]))));
            let actions = Expr::ActionList(vec![
                Expr::action("NoAction", vec![]),
                Expr::action("SetMods", vec![Expr::assign("modifiers", Expr::ident("Shift"))]),
            ]);
            assert!(c.add_actions_to_key(&mut keyi, None, Some(&actions)));
            keyi
        });
        assert_eq!(keyi.groups.len(), 1);
        assert_eq!(keyi.groups[0].levels.len(), 2);
        assert_eq!(
            keyi.groups[0].levels[1].action,
            Action::SetMods(ModAction {
                mods: 1,
                ..ModAction::default()
            })
        );
    }

    #[test]
    fn fifth_group_is_rejected() {
        let ((ok, groups), ctx) = with_compiler(|c| {
            let mut keyi = key();
            for _ in 0..MAX_GROUPS {
                c.add_symbols_to_key(&[], &mut keyi, None, Some(&Expr::keysyms(&["a"])));
            }
            let ok = c.add_symbols_to_key(&[], &mut keyi, None, Some(&Expr::keysyms(&["a"])));
            (ok, keyi.groups.len())
        });
        assert!(!ok);
        assert_eq!(groups, MAX_GROUPS);
        assert!(ctx.has_diagnostic("Too many groups of symbols for key <AC01>"));
    }

    #[test]
    fn subscript_grows_with_gaps() {
        let (keyi, _) = with_compiler(|c| {
            let mut keyi = key();
            let index = Expr::Integer(3);
            assert!(c.add_symbols_to_key(&[], &mut keyi, Some(&index), Some(&Expr::keysyms(&["x"]))));
            keyi
        });
        assert_eq!(keyi.groups.len(), 3);
        assert!(!keyi.groups[0].defined.any());
        assert!(keyi.groups[2].defined.symbols);
    }

    #[test]
    fn duplicate_symbols_in_one_statement_fail() {
        let (ok, ctx) = with_compiler(|c| {
            let mut keyi = key();
            let index = Expr::Integer(1);
            c.add_symbols_to_key(&[], &mut keyi, Some(&index), Some(&Expr::keysyms(&["a"])));
            c.add_symbols_to_key(&[], &mut keyi, Some(&index), Some(&Expr::keysyms(&["b"])))
        });
        assert!(!ok);
        assert!(ctx.has_diagnostic("already defined"));
    }

    #[test]
    fn unknown_keysym_clears_level_only() {
        let ((ok, keyi), ctx) = with_compiler(|c| {
            let mut keyi = key();
            let list = Expr::KeysymList(vec![
                vec!["a".into()],
                vec!["NotAKeysym".into()],
                vec!["nosymbol".into()],
                vec!["voidsymbol".into()],
                vec!["a".into(), "b".into()],
            ]);
            let names = [Some(c.ctx.intern("English"))];
            let ok = c.add_symbols_to_key(&names, &mut keyi, None, Some(&list));
            (ok, keyi)
        });
        assert!(ok);
        let levels = &keyi.groups[0].levels;
        assert_eq!(levels[0].syms, LevelSyms::One(Keysym::from_char('a')));
        assert_eq!(levels[1].syms, LevelSyms::None);
        assert_eq!(levels[2].syms, LevelSyms::None);
        assert_eq!(levels[3].syms, LevelSyms::One(Keysym::VOID_SYMBOL));
        assert_eq!(levels[4].syms.count(), 2);
        assert!(ctx.has_diagnostic(
            "Could not resolve keysym NotAKeysym for key <AC01>, group 1 (English), level 2"
        ));
    }

    #[test]
    fn wrong_value_kind_fails() {
        let (ok, ctx) = with_compiler(|c| {
            let mut keyi = key();
            c.add_symbols_to_key(&[], &mut keyi, None, Some(&Expr::string("a")))
        });
        assert!(!ok);
        assert!(ctx.has_diagnostic("Expected a list of symbols, found string"));
    }

    #[test]
    fn bad_action_is_diagnosed_but_kept_going() {
        let ((ok, keyi), ctx) = with_compiler(|c| {
            let mut keyi = key();
            let actions = Expr::ActionList(vec![
                Expr::action("Frobnicate", vec![]),
                Expr::action("LockGroup", vec![Expr::assign("group", Expr::Integer(2))]),
            ]);
            let ok = c.add_actions_to_key(&mut keyi, None, Some(&actions));
            (ok, keyi)
        });
        assert!(ok);
        assert!(keyi.groups[0].levels[0].action.is_none());
        assert!(!keyi.groups[0].levels[1].action.is_none());
        assert!(ctx.has_diagnostic("Action for group 1/level 1 ignored"));
    }
}
