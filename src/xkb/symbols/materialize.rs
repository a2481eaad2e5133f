//! Writing a finished unit onto the keymap.

use serde::Serialize;

use super::classify::find_automatic_type;
use super::info::{KeyInfo, KeyRepeat, ModMapEntry, ModMapTarget, SymbolsInfo};
use super::SymbolsCompiler;
use crate::xkb::keymap::{mod_index_text, KeyGroup, Keymap, Level, LevelSyms};
use crate::xkb::keysym::Keysym;

/// Entries that could not be materialized. These do not fail the compile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaterializeReport {
    pub keys_skipped: usize,
    pub modmaps_skipped: usize,
}

impl MaterializeReport {
    pub fn is_clean(&self) -> bool {
        self.keys_skipped == 0 && self.modmaps_skipped == 0
    }
}

/// Position of the key that best produces `sym`: exactly one symbol on a level,
/// lowest group first, then lowest level, then lowest keycode.
pub fn find_key_for_symbol(keymap: &Keymap, sym: Keysym) -> Option<usize> {
    let mut best: Option<(usize, usize, usize)> = None;

    for (pos, key) in keymap.keys().iter().enumerate() {
        for (group, groupi) in key.groups.iter().enumerate() {
            for (level, leveli) in groupi.levels.iter().enumerate() {
                if !matches!(leveli.syms, LevelSyms::One(s) if s == sym) {
                    continue;
                }
                let better = best.map_or(true, |(g, l, _)| (group, level) < (g, l));
                if better {
                    if group == 0 && level == 0 {
                        return Some(pos);
                    }
                    best = Some((group, level, pos));
                }
            }
        }
    }

    best.map(|(_, _, pos)| pos)
}

impl SymbolsCompiler<'_> {
    pub(super) fn copy_symbols_to_keymap(&mut self, info: SymbolsInfo) -> MaterializeReport {
        let mut report = MaterializeReport::default();

        let SymbolsInfo {
            name,
            keys,
            group_names,
            modmaps,
            ..
        } = info;
        self.keymap.symbols_section_name = name;
        self.keymap.group_names = group_names;

        for keyi in keys {
            if !self.copy_symbols_def(keyi) {
                report.keys_skipped += 1;
            }
        }

        if self.ctx.verbosity() > 3 {
            for key in self.keymap.keys() {
                if key.groups.is_empty() {
                    self.ctx.info(format!("No symbols defined for {}", key.name));
                }
            }
        }

        for entry in &modmaps {
            if !self.copy_modmap_def(entry) {
                report.modmaps_skipped += 1;
            }
        }

        report
    }

    fn copy_symbols_def(&mut self, mut keyi: KeyInfo) -> bool {
        let name = keyi.name;

        let Some(pos) = self.keymap.find_key_index(name, false) else {
            self.ctx.vrb(
                5,
                format!("Key {} not found in keycodes; Symbols ignored", name),
            );
            return false;
        };

        let Some(last) = keyi.groups.iter().rposition(|g| g.defined.any()) else {
            return false;
        };
        keyi.groups.truncate(last + 1);

        if let Some((group0, rest)) = keyi.groups.split_first_mut() {
            for (i, groupi) in rest.iter_mut().enumerate() {
                if groupi.defined.any() {
                    continue;
                }
                *groupi = group0.clone();
                self.ctx.info(format!(
                    "Group {} of key {} is empty; Using a copy of group 1",
                    i + 2,
                    name
                ));
            }
        }

        let has_actions = keyi.groups.iter().any(|g| g.defined.actions);

        let mut groups = Vec::with_capacity(keyi.groups.len());
        for groupi in keyi.groups {
            let mut automatic = false;
            let type_name = match groupi.type_name.or(keyi.default_type) {
                Some(type_name) => Some(type_name),
                None => match find_automatic_type(&groupi.levels) {
                    Some(found) => {
                        automatic = found.automatic;
                        Some(self.ctx.intern(found.name))
                    }
                    None => {
                        self.ctx.vrb(
                            5,
                            format!(
                                "No automatic type for {} levels; Using the default type for the {} key",
                                groupi.levels.len(),
                                name
                            ),
                        );
                        None
                    }
                },
            };

            let (type_index, explicit_type) =
                match type_name.and_then(|t| self.keymap.find_type(t)) {
                    Some(index) => (index, !automatic || groupi.levels.len() > 2),
                    None => {
                        if let Some(type_name) = type_name {
                            let message = format!(
                                "Type \"{}\" is not defined; Using default type for the {} key",
                                self.ctx.atom_text(type_name),
                                name
                            );
                            self.ctx.vrb(3, message);
                        }
                        (0, false)
                    }
                };

            let Some(key_type) = self.keymap.types.get(type_index).copied() else {
                self.ctx.error(format!(
                    "No key types defined; Symbols for key {} ignored",
                    name
                ));
                return false;
            };

            let mut levels = groupi.levels;
            if key_type.num_levels < levels.len() {
                let message = format!(
                    "Type \"{}\" has {} levels, but {} has {} levels; Ignoring extra symbols",
                    self.ctx.atom_text(key_type.name),
                    key_type.num_levels,
                    name,
                    levels.len()
                );
                self.ctx.vrb(1, message);
            }
            levels.resize_with(key_type.num_levels, Level::default);

            groups.push(KeyGroup {
                type_index,
                explicit_type,
                levels,
            });
        }

        let key = &mut self.keymap.keys_mut()[pos];
        key.groups = groups;

        if keyi.defined.group_info {
            key.out_of_range = keyi.out_of_range;
            key.explicit.group_info = true;
        }
        if keyi.defined.vmodmap {
            key.vmodmap = keyi.vmodmap;
            key.explicit.vmodmap = true;
        }
        if keyi.repeat != KeyRepeat::Undefined {
            key.repeats = keyi.repeat == KeyRepeat::Yes;
            key.explicit.repeat = true;
        }
        if has_actions {
            key.explicit.interp = true;
        }

        true
    }

    fn copy_modmap_def(&mut self, entry: &ModMapEntry) -> bool {
        let pos = match entry.target {
            ModMapTarget::Key(name) => match self.keymap.find_key_index(name, true) {
                Some(pos) => pos,
                None => {
                    self.ctx.vrb(
                        5,
                        format!(
                            "Key {} not found in keycodes; Modifier map entry for {} not updated",
                            name,
                            mod_index_text(entry.modifier)
                        ),
                    );
                    return false;
                }
            },
            ModMapTarget::Keysym(sym) => match find_key_for_symbol(self.keymap, sym) {
                Some(pos) => pos,
                None => {
                    self.ctx.vrb(
                        5,
                        format!(
                            "Key \"{}\" not found in symbol map; Modifier map entry for {} not updated",
                            sym,
                            mod_index_text(entry.modifier)
                        ),
                    );
                    return false;
                }
            },
        };

        self.keymap.keys_mut()[pos].modmap |= 1 << entry.modifier;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xkb::action::{Action, GroupAction};
    use crate::xkb::ast::MergeMode;
    use crate::xkb::context::Context;
    use crate::xkb::include::MemoryLoader;
    use crate::xkb::keymap::{standard_types, KeyName, RangeExceed};
    use crate::xkb::symbols::info::{GroupFields, GroupInfo};

    fn sym(c: char) -> Keysym {
        Keysym::from_char(c)
    }

    fn group(chars: &str) -> GroupInfo {
        GroupInfo {
            defined: GroupFields {
                symbols: true,
                ..GroupFields::default()
            },
            type_name: None,
            levels: chars
                .chars()
                .map(|c| Level::with_syms(LevelSyms::One(sym(c))))
                .collect(),
        }
    }

    fn key(name: &str, groups: Vec<GroupInfo>) -> KeyInfo {
        let mut keyi = KeyInfo::new(1);
        keyi.name = KeyName::new(name);
        keyi.groups = groups;
        keyi
    }

    fn materialize(
        ctx: &mut Context,
        keys: Vec<KeyInfo>,
        modmaps: Vec<ModMapEntry>,
    ) -> (Keymap, MaterializeReport) {
        let mut keymap = Keymap::new();
        keymap
            .add_key("AC01", 38)
            .add_key("AC02", 39)
            .add_key("AC03", 40)
            .add_alias("LatA", "AC01");
        keymap.types = standard_types(ctx);

        let mut info = SymbolsInfo::new(1);
        info.name = Some("test".into());
        info.keys = keys;
        info.modmaps = modmaps;

        let mut loader = MemoryLoader::new();
        let report = SymbolsCompiler::new(ctx, &mut keymap, &mut loader).copy_symbols_to_keymap(info);
        (keymap, report)
    }

    fn type_name<'a>(ctx: &'a Context, keymap: &Keymap, key: &str, group: usize) -> &'a str {
        let index = keymap.key(key).expect("key").groups[group].type_index;
        ctx.atom_text(keymap.types[index].name)
    }

    #[test]
    fn gaps_are_backfilled_from_group_one() {
        let mut ctx = Context::new();
        let groups = vec![group("aA"), GroupInfo::default(), group("bB")];
        let (keymap, report) = materialize(&mut ctx, vec![key("AC01", groups)], vec![]);
        assert!(report.is_clean());

        let key = keymap.key("AC01").expect("key");
        assert_eq!(key.groups.len(), 3);
        assert_eq!(key.groups[1].levels, key.groups[0].levels);
        assert_eq!(key.groups[2].levels[0].syms, LevelSyms::One(sym('b')));
    }

    #[test]
    fn trailing_empty_groups_are_dropped() {
        let mut ctx = Context::new();
        let groups = vec![group("a"), group("b"), GroupInfo::default()];
        let (keymap, _) = materialize(&mut ctx, vec![key("AC01", groups)], vec![]);
        assert_eq!(keymap.key("AC01").expect("key").groups.len(), 2);
    }

    #[test]
    fn types_are_inferred_and_flagged() {
        let mut ctx = Context::new();
        let keys = vec![
            key("AC01", vec![group("aA")]),
            key("AC02", vec![group("12")]),
            key("AC03", vec![group("aA1!")]),
        ];
        let (keymap, _) = materialize(&mut ctx, keys, vec![]);

        assert_eq!(type_name(&ctx, &keymap, "AC01", 0), "ALPHABETIC");
        assert!(keymap.key("AC01").expect("key").groups[0].explicit_type);
        assert_eq!(type_name(&ctx, &keymap, "AC02", 0), "TWO_LEVEL");
        assert!(!keymap.key("AC02").expect("key").groups[0].explicit_type);
        assert_eq!(type_name(&ctx, &keymap, "AC03", 0), "FOUR_LEVEL_SEMIALPHABETIC");
    }

    #[test]
    fn unknown_type_falls_back_to_first_and_truncates() {
        let mut ctx = Context::with_verbosity(3);
        let mut keyi = key("AC01", vec![group("abc")]);
        keyi.default_type = Some(ctx.intern("NO_SUCH_TYPE"));
        let (keymap, _) = materialize(&mut ctx, vec![keyi], vec![]);

        let key = keymap.key("AC01").expect("key");
        assert_eq!(key.groups[0].type_index, 0);
        assert!(!key.groups[0].explicit_type);
        assert_eq!(key.groups[0].levels.len(), 1);
        assert!(ctx.has_diagnostic("Type \"NO_SUCH_TYPE\" is not defined"));
        assert!(ctx.has_diagnostic("Ignoring extra symbols"));
    }

    #[test]
    fn scalar_fields_are_marked_explicit() {
        let mut ctx = Context::new();
        let mut keyi = key("AC01", vec![group("a")]);
        keyi.repeat = KeyRepeat::No;
        keyi.vmodmap = 0x3;
        keyi.defined.vmodmap = true;
        keyi.out_of_range = RangeExceed::Redirect(1);
        keyi.defined.group_info = true;
        keyi.groups[0].defined.actions = true;
        keyi.groups[0].levels[0].action = Action::LockGroup(GroupAction::default());

        let (keymap, _) = materialize(&mut ctx, vec![keyi, key("AC02", vec![group("b")])], vec![]);
        let key = keymap.key("AC01").expect("key");
        assert!(!key.repeats);
        assert_eq!(key.vmodmap, 0x3);
        assert_eq!(key.out_of_range, RangeExceed::Redirect(1));
        assert!(key.explicit.repeat && key.explicit.vmodmap && key.explicit.group_info);
        assert!(key.explicit.interp);

        let plain = keymap.key("AC02").expect("key");
        assert!(plain.repeats);
        assert_eq!(plain.explicit, Default::default());
    }

    #[test]
    fn unknown_keys_are_skipped_not_fatal() {
        let mut ctx = Context::with_verbosity(5);
        let keys = vec![key("AC01", vec![group("a")]), key("ZZZZ", vec![group("z")])];
        let (keymap, report) = materialize(&mut ctx, keys, vec![]);
        assert_eq!(report.keys_skipped, 1);
        assert_eq!(keymap.key("AC01").expect("key").groups.len(), 1);
        assert!(ctx.has_diagnostic("Key <ZZZZ> not found in keycodes"));
        assert!(ctx.has_diagnostic("No symbols defined for <AC02>"));
    }

    #[test]
    fn modmap_by_symbol_prefers_lowest_group() {
        let mut ctx = Context::new();
        let keys = vec![
            key("AC01", vec![group("qw"), group("xy")]),
            key("AC02", vec![group("zx")]),
        ];
        let entry = ModMapEntry {
            merge: MergeMode::Override,
            target: ModMapTarget::Keysym(sym('x')),
            modifier: 3,
        };
        let (keymap, report) = materialize(&mut ctx, keys, vec![entry]);
        assert!(report.is_clean());
        assert_eq!(keymap.key("AC02").expect("key").modmap, 1 << 3);
        assert_eq!(keymap.key("AC01").expect("key").modmap, 0);
    }

    #[test]
    fn modmap_by_key_resolves_aliases_and_accumulates() {
        let mut ctx = Context::new();
        let entries = vec![
            ModMapEntry {
                merge: MergeMode::Override,
                target: ModMapTarget::Key(KeyName::new("LatA")),
                modifier: 0,
            },
            ModMapEntry {
                merge: MergeMode::Override,
                target: ModMapTarget::Keysym(sym('a')),
                modifier: 2,
            },
            ModMapEntry {
                merge: MergeMode::Override,
                target: ModMapTarget::Keysym(sym('9')),
                modifier: 2,
            },
        ];
        let (keymap, report) = materialize(&mut ctx, vec![key("AC01", vec![group("a")])], entries);
        assert_eq!(keymap.key("AC01").expect("key").modmap, 0b101);
        assert_eq!(report.modmaps_skipped, 1);
    }

    #[test]
    fn multi_symbol_levels_never_match() {
        let mut keymap = Keymap::new();
        keymap.add_key("AC01", 38);
        keymap.keys_mut()[0].groups.push(KeyGroup {
            type_index: 0,
            explicit_type: false,
            levels: vec![Level::with_syms(LevelSyms::Many(vec![sym('x'), sym('y')]))],
        });
        assert_eq!(find_key_for_symbol(&keymap, sym('x')), None);
    }
}
