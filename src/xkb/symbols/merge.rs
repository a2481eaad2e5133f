//! Conflict resolution between two definitions of the same group, key, modifier map
//! entry or whole compilation unit.
//!
//! All merges take the incoming side by value: whatever is not kept is dropped with
//! it, and nothing is left behind in the source.

use super::info::{GroupInfo, KeyFields, KeyInfo, ModMapEntry, ModMapTarget, SymbolsInfo};
use crate::xkb::ast::MergeMode;
use crate::xkb::context::Context;
use crate::xkb::keymap::{mod_index_text, Keymap, KeyName};

/// Whether collisions between `into` and `from` should be reported.
fn should_report(ctx: &Context, into_file: u32, from_file: u32) -> bool {
    let verbosity = ctx.verbosity();
    verbosity > 9 || (into_file == from_file && verbosity > 0)
}

pub fn merge_groups(
    ctx: &mut Context,
    into: &mut GroupInfo,
    from: GroupInfo,
    clobber: bool,
    report: bool,
    group: usize,
    key: KeyName,
) {
    match (into.type_name, from.type_name) {
        (_, None) => {}
        (None, Some(new)) => into.type_name = Some(new),
        (Some(old), Some(new)) if old != new => {
            let (used, ignored) = if clobber { (new, old) } else { (old, new) };
            if report {
                ctx.warn(format!(
                    "Multiple definitions for group {} type of key {}; Using {}, ignoring {}",
                    group + 1,
                    key,
                    ctx.atom_text(used),
                    ctx.atom_text(ignored)
                ));
            }
            into.type_name = Some(used);
        }
        _ => {}
    }

    into.defined = into.defined.union(from.defined);

    let levels_in_both = into.levels.len().min(from.levels.len());
    for (i, from_level) in from.levels.into_iter().enumerate() {
        if i >= levels_in_both {
            into.levels.push(from_level);
            continue;
        }
        let into_level = &mut into.levels[i];

        if !from_level.action.is_none() {
            if into_level.action.is_none() {
                into_level.action = from_level.action;
            } else if into_level.action != from_level.action {
                let (used, ignored) = if clobber {
                    (from_level.action, into_level.action)
                } else {
                    (into_level.action, from_level.action)
                };
                if report {
                    ctx.warn(format!(
                        "Multiple actions for level {}/group {} on key {}; Using {}, ignoring {}",
                        i + 1,
                        group + 1,
                        key,
                        used.action_type(),
                        ignored.action_type()
                    ));
                }
                into_level.action = used;
            }
        }

        if !from_level.syms.is_empty() {
            if into_level.syms.is_empty() {
                into_level.syms = from_level.syms;
            } else if into_level.syms != from_level.syms {
                if report {
                    let describe = |syms: &[crate::xkb::keysym::Keysym]| {
                        syms.iter().map(|s| s.name()).collect::<Vec<_>>().join(" ")
                    };
                    let (used, ignored) = if clobber {
                        (&from_level.syms, &into_level.syms)
                    } else {
                        (&into_level.syms, &from_level.syms)
                    };
                    let message = format!(
                        "Multiple symbols for level {}/group {} on key {}; Using {}, ignoring {}",
                        i + 1,
                        group + 1,
                        key,
                        describe(used.as_slice()),
                        describe(ignored.as_slice())
                    );
                    ctx.warn(message);
                }
                if clobber {
                    into_level.syms = from_level.syms;
                }
            }
        }
    }
}

/// Decide whether the incoming value of one scalar key field should be used.
fn use_new_field(old: bool, new: bool, clobber: bool, report: bool, collide: &mut bool) -> bool {
    if !old {
        return new;
    }
    if new {
        if report {
            *collide = true;
        }
        if clobber {
            return true;
        }
    }
    false
}

pub fn merge_keys(ctx: &mut Context, into: &mut KeyInfo, from: KeyInfo) {
    if from.merge == MergeMode::Replace {
        *into = from;
        return;
    }

    let clobber = from.merge.clobbers();
    let report = should_report(ctx, into.file_id, from.file_id);
    let name = into.name;

    let KeyInfo {
        defined,
        groups,
        repeat,
        vmodmap,
        default_type,
        out_of_range,
        ..
    } = from;

    let groups_in_both = into.groups.len().min(groups.len());
    for (i, group) in groups.into_iter().enumerate() {
        if i < groups_in_both {
            merge_groups(ctx, &mut into.groups[i], group, clobber, report, i, name);
        } else {
            into.groups.push(group);
        }
    }

    let mut collide = KeyFields::default();
    if use_new_field(
        into.defined.vmodmap,
        defined.vmodmap,
        clobber,
        report,
        &mut collide.vmodmap,
    ) {
        into.vmodmap = vmodmap;
        into.defined.vmodmap = true;
    }
    if use_new_field(
        into.defined.repeat,
        defined.repeat,
        clobber,
        report,
        &mut collide.repeat,
    ) {
        into.repeat = repeat;
        into.defined.repeat = true;
    }
    if use_new_field(
        into.defined.default_type,
        defined.default_type,
        clobber,
        report,
        &mut collide.default_type,
    ) {
        into.default_type = default_type;
        into.defined.default_type = true;
    }
    if use_new_field(
        into.defined.group_info,
        defined.group_info,
        clobber,
        report,
        &mut collide.group_info,
    ) {
        into.out_of_range = out_of_range;
        into.defined.group_info = true;
    }

    if collide.any() {
        ctx.warn(format!(
            "Symbol map for key {} redefined; Using {} definition for conflicting fields ({})",
            name,
            if clobber { "last" } else { "first" },
            collide.names().join(", ")
        ));
    }
}

/// Add a key to a unit, merging with an existing definition of the same key.
///
/// Aliases are resolved first so a unit never holds two entries for one key.
pub fn add_key_symbols(ctx: &mut Context, keymap: &Keymap, info: &mut SymbolsInfo, mut key: KeyInfo) {
    if let Some(real) = keymap.find_key_name_for_alias(key.name) {
        key.name = real;
    }

    match info.keys.iter_mut().find(|existing| existing.name == key.name) {
        Some(existing) => merge_keys(ctx, existing, key),
        None => info.keys.push(key),
    }
}

pub fn add_modmap_entry(ctx: &mut Context, info: &mut SymbolsInfo, new: ModMapEntry) {
    let clobber = new.merge.clobbers();

    let Some(pos) = info.modmaps.iter().position(|mm| mm.target == new.target) else {
        info.modmaps.push(new);
        return;
    };
    let existing = &mut info.modmaps[pos];

    if existing.modifier == new.modifier {
        return;
    }

    let (used, ignored) = if clobber {
        (new.modifier, existing.modifier)
    } else {
        (existing.modifier, new.modifier)
    };
    let target = match new.target {
        ModMapTarget::Keysym(sym) => sym.name(),
        ModMapTarget::Key(name) => format!("Key {}", name),
    };
    ctx.warn(format!(
        "{} added to symbol map for multiple modifiers; Using {}, ignoring {}",
        target,
        mod_index_text(used),
        mod_index_text(ignored)
    ));
    existing.modifier = used;
}

/// Fold an included unit into `into`.
///
/// A unit that had errors contributes only its error count. `merge` overrides the
/// merge mode recorded on each incoming key and modifier map entry unless it is
/// [`MergeMode::Default`].
pub fn merge_included_symbols(
    ctx: &mut Context,
    keymap: &Keymap,
    into: &mut SymbolsInfo,
    from: SymbolsInfo,
    merge: MergeMode,
) {
    if from.error_count > 0 {
        into.error_count += from.error_count;
        return;
    }

    if into.name.is_none() {
        into.name = from.name;
    }

    let names_in_both = into.group_names.len().min(from.group_names.len());
    for (i, name) in from.group_names.into_iter().enumerate() {
        if i >= names_in_both {
            into.group_names.push(name);
            continue;
        }
        if name.is_none() {
            continue;
        }
        if merge == MergeMode::Augment && into.group_names[i].is_some() {
            continue;
        }
        into.group_names[i] = name;
    }

    for mut key in from.keys {
        if merge != MergeMode::Default {
            key.merge = merge;
        }
        add_key_symbols(ctx, keymap, into, key);
    }

    for mut entry in from.modmaps {
        if merge != MergeMode::Default {
            entry.merge = merge;
        }
        add_modmap_entry(ctx, into, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xkb::action::{Action, GroupAction};
    use crate::xkb::keymap::{Level, LevelSyms, RangeExceed};
    use crate::xkb::keysym::Keysym;
    use crate::xkb::symbols::info::{GroupFields, KeyRepeat};

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
                .map(|c| {
                    if c == '_' {
                        Level::default()
                    } else {
                        Level::with_syms(LevelSyms::One(sym(c)))
                    }
                })
                .collect(),
        }
    }

    fn key(name: &str, merge: MergeMode, groups: Vec<GroupInfo>) -> KeyInfo {
        let mut info = KeyInfo::new(1);
        info.name = KeyName::new(name);
        info.merge = merge;
        info.groups = groups;
        info
    }

    fn first_syms(info: &KeyInfo, g: usize) -> Vec<Keysym> {
        info.groups[g].levels.iter().map(|l| l.syms.first()).collect()
    }

    #[test]
    fn override_takes_incoming_levels() {
        let mut ctx = Context::new();
        let mut into = key("AC01", MergeMode::Override, vec![group("ab_")]);
        let from = key("AC01", MergeMode::Override, vec![group("x_yz")]);
        merge_keys(&mut ctx, &mut into, from);
        assert_eq!(
            first_syms(&into, 0),
            vec![sym('x'), sym('b'), sym('y'), sym('z')]
        );
    }

    #[test]
    fn augment_only_fills_gaps() {
        let mut ctx = Context::new();
        let mut into = key("AC01", MergeMode::Override, vec![group("ab_")]);
        let from = key("AC01", MergeMode::Augment, vec![group("x_yz"), group("q")]);
        merge_keys(&mut ctx, &mut into, from);
        assert_eq!(
            first_syms(&into, 0),
            vec![sym('a'), sym('b'), sym('y'), sym('z')]
        );
        assert_eq!(into.groups.len(), 2);
        assert_eq!(first_syms(&into, 1), vec![sym('q')]);
    }

    #[test]
    fn replace_discards_destination() {
        let mut ctx = Context::new();
        let mut into = key("AC01", MergeMode::Override, vec![group("ab"), group("cd")]);
        into.repeat = KeyRepeat::No;
        into.defined.repeat = true;
        let from = key("AC01", MergeMode::Replace, vec![group("x")]);
        let expected = from.clone();
        merge_keys(&mut ctx, &mut into, from);
        assert_eq!(into, expected);
    }

    #[test]
    fn group_types_follow_clobber_direction() {
        let mut ctx = Context::with_verbosity(10);
        let alpha = ctx.intern("ALPHABETIC");
        let two = ctx.intern("TWO_LEVEL");

        let mut into = group("ab");
        into.type_name = Some(alpha);
        let mut from = group("ab");
        from.type_name = Some(two);
        merge_groups(&mut ctx, &mut into, from.clone(), false, true, 0, KeyName::new("AC01"));
        assert_eq!(into.type_name, Some(alpha));

        merge_groups(&mut ctx, &mut into, from, true, true, 0, KeyName::new("AC01"));
        assert_eq!(into.type_name, Some(two));
        assert!(ctx.has_diagnostic("Using TWO_LEVEL, ignoring ALPHABETIC"));
    }

    #[test]
    fn defined_bits_are_ored() {
        let mut ctx = Context::new();
        let mut into = group("a");
        let mut from = GroupInfo::default();
        from.defined.actions = true;
        from.levels.push(Level {
            syms: LevelSyms::None,
            action: Action::LockGroup(GroupAction::default()),
        });
        merge_groups(&mut ctx, &mut into, from, false, false, 0, KeyName::new("AC01"));
        assert!(into.defined.symbols && into.defined.actions);
        assert_eq!(into.levels[0].action, Action::LockGroup(GroupAction::default()));
        assert_eq!(into.levels[0].syms, LevelSyms::One(sym('a')));
    }

    #[test]
    fn scalar_fields_union_and_collide() {
        let mut ctx = Context::with_verbosity(1);
        let mut into = key("AC01", MergeMode::Override, vec![]);
        into.repeat = KeyRepeat::No;
        into.defined.repeat = true;

        let mut from = key("AC01", MergeMode::Override, vec![]);
        from.repeat = KeyRepeat::Yes;
        from.defined.repeat = true;
        from.vmodmap = 0x4;
        from.defined.vmodmap = true;
        from.out_of_range = RangeExceed::Saturate;
        from.defined.group_info = true;

        merge_keys(&mut ctx, &mut into, from);
        assert_eq!(into.repeat, KeyRepeat::Yes);
        assert_eq!(into.vmodmap, 0x4);
        assert_eq!(into.out_of_range, RangeExceed::Saturate);
        assert!(ctx.has_diagnostic("Using last definition for conflicting fields (repeat)"));
    }

    #[test]
    fn collisions_are_quiet_across_files_at_low_verbosity() {
        let mut ctx = Context::with_verbosity(1);
        let mut into = key("AC01", MergeMode::Override, vec![group("a")]);
        let mut from = key("AC01", MergeMode::Override, vec![group("b")]);
        from.file_id = 2;
        merge_keys(&mut ctx, &mut into, from);
        assert_eq!(first_syms(&into, 0), vec![sym('b')]);
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn aliases_collapse_onto_one_entry() {
        let mut ctx = Context::new();
        let mut keymap = Keymap::new();
        keymap.add_key("LatQ", 24).add_alias("AD01", "LatQ");
        let mut info = SymbolsInfo::new(1);

        add_key_symbols(&mut ctx, &keymap, &mut info, key("LatQ", MergeMode::Override, vec![group("q")]));
        add_key_symbols(&mut ctx, &keymap, &mut info, key("AD01", MergeMode::Override, vec![group("Q")]));
        assert_eq!(info.keys.len(), 1);
        assert_eq!(first_syms(&info.keys[0], 0), vec![sym('Q')]);
    }

    #[test]
    fn modmap_entries_match_by_target_kind() {
        let mut ctx = Context::new();
        let mut info = SymbolsInfo::new(1);
        let caps = ModMapTarget::Keysym(Keysym(0xffe5));
        let caps_key = ModMapTarget::Key(KeyName::new("CAPS"));

        let entry = |target, modifier, merge| ModMapEntry {
            merge,
            target,
            modifier,
        };
        add_modmap_entry(&mut ctx, &mut info, entry(caps, 1, MergeMode::Override));
        add_modmap_entry(&mut ctx, &mut info, entry(caps_key, 1, MergeMode::Override));
        assert_eq!(info.modmaps.len(), 2);

        add_modmap_entry(&mut ctx, &mut info, entry(caps, 2, MergeMode::Augment));
        assert_eq!(info.modmaps[0].modifier, 1);
        add_modmap_entry(&mut ctx, &mut info, entry(caps, 2, MergeMode::Override));
        assert_eq!(info.modmaps[0].modifier, 2);
        assert!(ctx.has_diagnostic("Caps_Lock added to symbol map for multiple modifiers"));
    }

    #[test]
    fn failed_include_contributes_only_errors() {
        let mut ctx = Context::new();
        let keymap = Keymap::new();
        let mut into = SymbolsInfo::new(1);
        let mut from = SymbolsInfo::new(2);
        from.error_count = 3;
        from.keys.push(key("AC01", MergeMode::Override, vec![group("a")]));
        merge_included_symbols(&mut ctx, &keymap, &mut into, from, MergeMode::Override);
        assert_eq!(into.error_count, 3);
        assert!(into.keys.is_empty());
    }

    #[test]
    fn group_names_merge_position_wise() {
        let mut ctx = Context::new();
        let keymap = Keymap::new();
        let us = ctx.intern("US");
        let de = ctx.intern("German");
        let ru = ctx.intern("Russian");

        let mut into = SymbolsInfo::new(1);
        into.group_names = vec![Some(us), None];
        let mut from = SymbolsInfo::new(2);
        from.group_names = vec![Some(de), Some(ru), Some(de)];
        from.name = Some("de".into());

        merge_included_symbols(&mut ctx, &keymap, &mut into, from.clone(), MergeMode::Augment);
        assert_eq!(into.group_names, vec![Some(us), Some(ru), Some(de)]);
        assert_eq!(into.name.as_deref(), Some("de"));

        merge_included_symbols(&mut ctx, &keymap, &mut into, from, MergeMode::Override);
        assert_eq!(into.group_names, vec![Some(de), Some(ru), Some(de)]);
    }
}
