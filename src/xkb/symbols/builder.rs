//! Statement handling: turns one file's statement list into a [`SymbolsInfo`].

use super::info::{GroupInfo, KeyInfo, KeyRepeat, ModMapEntry, ModMapTarget, SymbolsInfo, MAX_ERRORS};
use super::merge::{add_key_symbols, add_modmap_entry};
use super::SymbolsCompiler;
use crate::xkb::ast::{Expr, MergeMode, ModMapDef, Statement, SymbolsDef, VarDef, XkbFile};
use crate::xkb::atom::Atom;
use crate::xkb::expr::{
    resolve_boolean, resolve_enum, resolve_group, resolve_keysym, resolve_lhs, resolve_mod_mask,
    resolve_string,
};
use crate::xkb::keymap::{core_mod_index, mod_index_text, KeyName, RangeExceed, NUM_CORE_MODS};
use crate::xkb::vmod::handle_vmod_def;

const REPEAT_ENTRIES: &[(&str, KeyRepeat)] = &[
    ("true", KeyRepeat::Yes),
    ("yes", KeyRepeat::Yes),
    ("on", KeyRepeat::Yes),
    ("false", KeyRepeat::No),
    ("no", KeyRepeat::No),
    ("off", KeyRepeat::No),
    ("default", KeyRepeat::Undefined),
];

impl SymbolsCompiler<'_> {
    /// Process every statement of `file` into `info`, stopping early once the
    /// unit has accumulated more than [`MAX_ERRORS`] errors.
    pub(super) fn handle_symbols_file(
        &mut self,
        info: &mut SymbolsInfo,
        file: &XkbFile,
        merge: MergeMode,
    ) {
        info.name = Some(file.name.clone());

        for stmt in &file.statements {
            let ok = match stmt {
                Statement::Include(include) => self.handle_include_symbols(info, include),
                Statement::Symbols(def) => self.handle_symbols_def(info, def),
                Statement::Var(def) => self.handle_global_var(info, def),
                Statement::VMod(def) => {
                    handle_vmod_def(self.ctx, self.keymap, def, merge)
                }
                Statement::ModMap(def) => self.handle_modmap_def(info, def),
            };

            if !ok {
                info.error_count += 1;
            }

            if info.error_count > MAX_ERRORS {
                self.ctx
                    .error(format!("Abandoning symbols file \"{}\"", file.name));
                break;
            }
        }
    }

    fn handle_symbols_def(&mut self, info: &mut SymbolsInfo, def: &SymbolsDef) -> bool {
        let mut keyi = info.dflt.clone();
        keyi.merge = def.merge;
        keyi.name = KeyName::new(&def.key);

        if !self.handle_symbols_body(&info.group_names, &def.body, &mut keyi) {
            return false;
        }

        self.set_explicit_group(info, &mut keyi);
        add_key_symbols(self.ctx, self.keymap, info, keyi);
        true
    }

    /// Apply a key statement's body. Every entry is processed so all problems are
    /// reported; any failure rejects the statement.
    fn handle_symbols_body(
        &mut self,
        group_names: &[Option<Atom>],
        body: &[VarDef],
        keyi: &mut KeyInfo,
    ) -> bool {
        let mut ok = true;

        for def in body {
            let applied = match &def.name {
                Some(Expr::FieldRef { .. }) => {
                    self.ctx.error(
                        "Cannot set a global default value from within a key statement; \
                         Move statements to the global file scope",
                    );
                    continue;
                }
                None => {
                    let field = match &def.value {
                        None | Some(Expr::KeysymList(_)) => "symbols",
                        Some(_) => "actions",
                    };
                    self.set_symbols_field(group_names, keyi, field, None, def.value.as_ref())
                }
                Some(name) => match resolve_lhs(name) {
                    Some(lhs) => self.set_symbols_field(
                        group_names,
                        keyi,
                        lhs.field,
                        lhs.index,
                        def.value.as_ref(),
                    ),
                    None => {
                        self.ctx.error(format!(
                            "Expected a field name in the body of key {}, found {}",
                            keyi.name,
                            name.kind_name()
                        ));
                        false
                    }
                },
            };
            ok = applied && ok;
        }

        ok
    }

    /// Set one field of a key (or of the unit's default key).
    fn set_symbols_field(
        &mut self,
        group_names: &[Option<Atom>],
        keyi: &mut KeyInfo,
        field: &str,
        index: Option<&Expr>,
        value: Option<&Expr>,
    ) -> bool {
        let field = field.to_ascii_lowercase();

        match field.as_str() {
            "symbols" => return self.add_symbols_to_key(group_names, keyi, index, value),
            "actions" => return self.add_actions_to_key(keyi, index, value),
            "locking" | "lock" | "locks" => {
                self.ctx.error(format!(
                    "Key behaviors not supported; Ignoring locking specification for key {}",
                    keyi.name
                ));
                return true;
            }
            "radiogroup" | "permanentradiogroup" | "allownone" => {
                self.ctx.error(format!(
                    "Radio groups not supported; Ignoring radio group specification for key {}",
                    keyi.name
                ));
                return true;
            }
            f if f.starts_with("overlay") || f.starts_with("permanentoverlay") => {
                self.ctx.error(format!(
                    "Overlays not supported; Ignoring overlay specification for key {}",
                    keyi.name
                ));
                return true;
            }
            _ => {}
        }

        let Some(value) = value else {
            self.ctx.error(format!(
                "Missing value for field {} of key {}; Definition ignored",
                field, keyi.name
            ));
            return false;
        };

        match field.as_str() {
            "type" => {
                let Some(type_name) = resolve_string(value) else {
                    self.ctx.error(format!(
                        "The type field of a key symbol map must be a string, found {}; \
                         Ignoring illegal type definition",
                        value.kind_name()
                    ));
                    return false;
                };
                let type_name = self.ctx.intern(type_name);

                match index {
                    None => {
                        keyi.default_type = Some(type_name);
                        keyi.defined.default_type = true;
                    }
                    Some(index) => {
                        let Some(group) = resolve_group(self.ctx, index) else {
                            self.ctx.error(format!(
                                "Illegal group index for type of key {}; \
                                 Definition with non-integer array index ignored",
                                keyi.name
                            ));
                            return false;
                        };
                        let group = group as usize - 1;
                        if group >= keyi.groups.len() {
                            keyi.groups.resize_with(group + 1, GroupInfo::default);
                        }
                        keyi.groups[group].type_name = Some(type_name);
                        keyi.groups[group].defined.key_type = true;
                    }
                }
                true
            }
            "vmods" | "virtualmods" | "virtualmodifiers" => {
                match resolve_mod_mask(self.ctx, self.keymap, value) {
                    Some(mask) => {
                        keyi.vmodmap = (mask >> NUM_CORE_MODS) & 0xffff;
                        keyi.defined.vmodmap = true;
                        true
                    }
                    None => {
                        self.ctx.error(format!(
                            "Expected a virtual modifier mask, found {}; \
                             Ignoring virtual modifiers definition for key {}",
                            value.kind_name(),
                            keyi.name
                        ));
                        false
                    }
                }
            }
            "repeating" | "repeats" | "repeat" => match resolve_enum(value, REPEAT_ENTRIES) {
                Some(repeat) => {
                    keyi.repeat = repeat;
                    keyi.defined.repeat = true;
                    true
                }
                None => {
                    self.ctx.error(format!(
                        "Illegal repeat setting for {}; Non-boolean repeat setting ignored",
                        keyi.name
                    ));
                    false
                }
            },
            "groupswrap" | "wrapgroups" | "groupsclamp" | "clampgroups" => {
                let Some(set) = resolve_boolean(value) else {
                    self.ctx.error(format!(
                        "Illegal {} setting for {}; Non-boolean value ignored",
                        field, keyi.name
                    ));
                    return false;
                };
                let wrap = field.contains("wrap");
                keyi.out_of_range = if set == wrap {
                    RangeExceed::Wrap
                } else {
                    RangeExceed::Saturate
                };
                keyi.defined.group_info = true;
                true
            }
            "groupsredirect" | "redirectgroups" => {
                let Some(group) = resolve_group(self.ctx, value) else {
                    self.ctx.error(format!(
                        "Illegal group index for redirect of key {}; \
                         Definition with non-integer group ignored",
                        keyi.name
                    ));
                    return false;
                };
                keyi.out_of_range = RangeExceed::Redirect(group - 1);
                keyi.defined.group_info = true;
                true
            }
            _ => {
                self.ctx.error(format!(
                    "Unknown field {} in a symbol interpretation; Definition ignored",
                    field
                ));
                false
            }
        }
    }

    fn set_group_name(
        &mut self,
        info: &mut SymbolsInfo,
        index: Option<&Expr>,
        value: Option<&Expr>,
    ) -> bool {
        let Some(index) = index else {
            self.ctx.vrb(
                1,
                "You must specify an index when specifying a group name; \
                 Group name definition without array subscript ignored",
            );
            return false;
        };

        let Some(group) = resolve_group(self.ctx, index) else {
            self.ctx.error(
                "Illegal index in group name definition; \
                 Definition with non-integer array index ignored",
            );
            return false;
        };

        let Some(name) = value.and_then(resolve_string) else {
            self.ctx.error(format!(
                "Group name must be a string; Illegal name for group {} ignored",
                group
            ));
            return false;
        };

        let target = match info.explicit_group {
            None => group as usize - 1,
            Some(explicit) if group == 1 => explicit,
            Some(_) => {
                self.ctx.warn(format!(
                    "An explicit group was specified for the '{}' map, but it provides a name \
                     for a group other than Group1 ({}); Ignoring group name '{}'",
                    info.display_name(),
                    group,
                    name
                ));
                return false;
            }
        };

        let name = self.ctx.intern(name);
        if target >= info.group_names.len() {
            info.group_names.resize(target + 1, None);
        }
        info.group_names[target] = Some(name);
        true
    }

    fn handle_global_var(&mut self, info: &mut SymbolsInfo, def: &VarDef) -> bool {
        let Some(lhs) = def.name.as_ref().and_then(resolve_lhs) else {
            self.ctx
                .error("Expected a field name in a global definition; Definition ignored");
            return false;
        };
        let field = lhs.field.to_ascii_lowercase();

        match lhs.element {
            Some(element) if element.eq_ignore_ascii_case("key") => self.set_symbols_field(
                &info.group_names,
                &mut info.dflt,
                lhs.field,
                lhs.index,
                def.value.as_ref(),
            ),
            Some(element) => match def.value.as_ref() {
                Some(value) => self.actions.set_action_field(
                    self.ctx,
                    self.keymap,
                    Some(element),
                    lhs.field,
                    lhs.index,
                    value,
                ),
                None => {
                    self.ctx.error(format!(
                        "Missing value for {}.{}; Definition ignored",
                        element, lhs.field
                    ));
                    false
                }
            },
            None => match field.as_str() {
                "name" | "groupname" => self.set_group_name(info, lhs.index, def.value.as_ref()),
                "groupswrap" | "wrapgroups" => {
                    self.ctx.error("Global \"groupswrap\" not supported; Ignored");
                    true
                }
                "groupsclamp" | "clampgroups" => {
                    self.ctx.error("Global \"groupsclamp\" not supported; Ignored");
                    true
                }
                "groupsredirect" | "redirectgroups" => {
                    self.ctx
                        .error("Global \"groupsredirect\" not supported; Ignored");
                    true
                }
                "allownone" => {
                    self.ctx.error(
                        "Radio groups not supported; Ignoring \"allownone\" specification",
                    );
                    true
                }
                _ => match def.value.as_ref() {
                    Some(value) => self.actions.set_action_field(
                        self.ctx,
                        self.keymap,
                        None,
                        lhs.field,
                        lhs.index,
                        value,
                    ),
                    None => {
                        self.ctx.error(format!(
                            "Unknown field {} in a symbol interpretation; Definition ignored",
                            lhs.field
                        ));
                        false
                    }
                },
            },
        }
    }

    /// Force every group of `keyi` into the unit's explicit group, if one is set.
    ///
    /// Only group 1 survives; anything defined beyond it is dropped.
    fn set_explicit_group(&mut self, info: &SymbolsInfo, keyi: &mut KeyInfo) {
        let Some(explicit) = info.explicit_group else {
            return;
        };

        let mut dropped = false;
        for groupi in keyi.groups.iter_mut().skip(1) {
            if groupi.defined.any() {
                dropped = true;
                *groupi = GroupInfo::default();
            }
        }
        if dropped {
            self.ctx.warn(format!(
                "For the map {} an explicit group specified, but key {} has more than one \
                 group defined; All groups except first one will be ignored",
                info.display_name(),
                keyi.name
            ));
        }

        keyi.groups.resize_with(explicit + 1, GroupInfo::default);
        if explicit > 0 {
            keyi.groups[explicit] = std::mem::take(&mut keyi.groups[0]);
        }
    }

    fn handle_modmap_def(&mut self, info: &mut SymbolsInfo, def: &ModMapDef) -> bool {
        let Some(modifier) = core_mod_index(&def.modifier) else {
            self.ctx.error(format!(
                "Illegal modifier map definition; Ignoring map for non-modifier \"{}\"",
                def.modifier
            ));
            return false;
        };

        for key in &def.keys {
            let target = match key {
                Expr::KeyName(name) => ModMapTarget::Key(KeyName::new(name)),
                other => match resolve_keysym(other) {
                    Some(sym) => ModMapTarget::Keysym(sym),
                    None => {
                        self.ctx.error(format!(
                            "Modmap entries may contain only key names or keysyms; \
                             Illegal definition for {} modifier ignored",
                            mod_index_text(modifier)
                        ));
                        continue;
                    }
                },
            };

            add_modmap_entry(
                self.ctx,
                info,
                ModMapEntry {
                    merge: def.merge,
                    target,
                    modifier,
                },
            );
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xkb::ast::{ModMapDef, VModDef};
    use crate::xkb::context::Context;
    use crate::xkb::include::MemoryLoader;
    use crate::xkb::keymap::{Keymap, VirtualModifier};
    use crate::xkb::keysym::Keysym;
    use rstest::rstest;

    fn keymap() -> Keymap {
        let mut keymap = Keymap::new();
        keymap.add_key("AC01", 38).add_key("AC02", 39);
        keymap
    }

    /// Run `file` through the statement builder and return the resulting unit.
    fn build(ctx: &mut Context, file: &XkbFile) -> SymbolsInfo {
        let mut keymap = keymap();
        let mut loader = MemoryLoader::new();
        let mut info = SymbolsInfo::new(file.id);
        let mut compiler = SymbolsCompiler::new(ctx, &mut keymap, &mut loader);
        compiler.handle_symbols_file(&mut info, file, MergeMode::Override);
        info
    }

    fn key_stmt(name: &str, body: Vec<VarDef>) -> Statement {
        Statement::Symbols(SymbolsDef {
            merge: MergeMode::Default,
            key: name.to_string(),
            body,
        })
    }

    fn bad_stmt() -> Statement {
        key_stmt("AC01", vec![VarDef::field("bogus", Expr::Integer(1))])
    }

    #[test]
    fn key_statement_uses_running_defaults() {
        let mut ctx = Context::new();
        let file = XkbFile::new(
            "basic",
            vec![
                Statement::Var(VarDef::element("key", "repeat", Expr::ident("no"))),
                key_stmt("AC01", vec![VarDef::bare(Expr::keysyms(&["a", "A"]))]),
            ],
        );
        let info = build(&mut ctx, &file);
        assert_eq!(info.error_count, 0);
        assert_eq!(info.name.as_deref(), Some("basic"));
        assert_eq!(info.keys.len(), 1);
        assert_eq!(info.keys[0].repeat, KeyRepeat::No);
        assert!(info.keys[0].defined.repeat);
        assert_eq!(info.keys[0].groups[0].levels.len(), 2);
    }

    #[rstest]
    #[case("groupsWrap", Expr::ident("true"), RangeExceed::Wrap)]
    #[case("wrapGroups", Expr::ident("false"), RangeExceed::Saturate)]
    #[case("groupsClamp", Expr::ident("on"), RangeExceed::Saturate)]
    #[case("clampGroups", Expr::ident("off"), RangeExceed::Wrap)]
    #[case("groupsRedirect", Expr::ident("Group2"), RangeExceed::Redirect(1))]
    fn group_range_fields(#[case] field: &str, #[case] value: Expr, #[case] expected: RangeExceed) {
        let mut ctx = Context::new();
        let file = XkbFile::new("f", vec![key_stmt("AC01", vec![VarDef::field(field, value)])]);
        let info = build(&mut ctx, &file);
        assert_eq!(info.error_count, 0);
        assert_eq!(info.keys[0].out_of_range, expected);
        assert!(info.keys[0].defined.group_info);
    }

    #[test]
    fn typed_groups_and_default_type() {
        let mut ctx = Context::new();
        let file = XkbFile::new(
            "f",
            vec![key_stmt(
                "AC01",
                vec![
                    VarDef::field("type", Expr::string("FOUR_LEVEL")),
                    VarDef::indexed("type", 2, Expr::string("TWO_LEVEL")),
                    VarDef::indexed("symbols", 1, Expr::keysyms(&["a", "A", "b", "B"])),
                ],
            )],
        );
        let info = build(&mut ctx, &file);
        let keyi = &info.keys[0];
        let four = ctx.lookup_atom("FOUR_LEVEL");
        let two = ctx.lookup_atom("TWO_LEVEL");
        assert_eq!(keyi.default_type, four);
        assert_eq!(keyi.groups.len(), 2);
        assert_eq!(keyi.groups[1].type_name, two);
        assert!(keyi.groups[1].defined.key_type);
    }

    #[test]
    fn unsupported_fields_are_diagnosed_not_counted() {
        let mut ctx = Context::new();
        let file = XkbFile::new(
            "f",
            vec![
                key_stmt(
                    "AC01",
                    vec![
                        VarDef::field("locking", Expr::ident("true")),
                        VarDef::field("overlay1", Expr::key_name("AC02")),
                    ],
                ),
                Statement::Var(VarDef::field("groupswrap", Expr::ident("true"))),
                Statement::Var(VarDef::field("allownone", Expr::ident("true"))),
            ],
        );
        let info = build(&mut ctx, &file);
        assert_eq!(info.error_count, 0);
        assert!(ctx.has_diagnostic("Key behaviors not supported"));
        assert!(ctx.has_diagnostic("Overlays not supported"));
        assert!(ctx.has_diagnostic("Global \"groupswrap\" not supported"));
    }

    #[test]
    fn field_reference_in_body_is_skipped() {
        let mut ctx = Context::new();
        let file = XkbFile::new(
            "f",
            vec![key_stmt(
                "AC01",
                vec![
                    VarDef::element("key", "repeat", Expr::ident("no")),
                    VarDef::bare(Expr::keysyms(&["a"])),
                ],
            )],
        );
        let info = build(&mut ctx, &file);
        assert_eq!(info.error_count, 0);
        assert_eq!(info.keys[0].repeat, KeyRepeat::Undefined);
        assert!(ctx.has_diagnostic("Cannot set a global default value from within a key statement"));
    }

    #[test]
    fn nameless_action_list_goes_to_actions() {
        let mut ctx = Context::new();
        let actions = Expr::ActionList(vec![Expr::action("Terminate", vec![])]);
        let file = XkbFile::new("f", vec![key_stmt("AC01", vec![VarDef::bare(actions)])]);
        let info = build(&mut ctx, &file);
        let groupi = &info.keys[0].groups[0];
        assert!(groupi.defined.actions);
        assert!(!groupi.defined.symbols);
    }

    #[test]
    fn failed_field_drops_whole_key() {
        let mut ctx = Context::new();
        let file = XkbFile::new(
            "f",
            vec![key_stmt(
                "AC01",
                vec![
                    VarDef::bare(Expr::keysyms(&["a"])),
                    VarDef::field("repeat", Expr::string("sometimes")),
                ],
            )],
        );
        let info = build(&mut ctx, &file);
        assert_eq!(info.error_count, 1);
        assert!(info.keys.is_empty());
    }

    #[test]
    fn group_names_need_a_subscript() {
        let mut ctx = Context::with_verbosity(1);
        let file = XkbFile::new(
            "f",
            vec![
                Statement::Var(VarDef::indexed("name", 2, Expr::string("German"))),
                Statement::Var(VarDef::field("name", Expr::string("Nowhere"))),
            ],
        );
        let info = build(&mut ctx, &file);
        assert_eq!(info.error_count, 1);
        assert_eq!(info.group_names.len(), 2);
        assert_eq!(info.group_names[0], None);
        assert_eq!(info.group_names[1], ctx.lookup_atom("German"));
        assert!(ctx.has_diagnostic("You must specify an index"));
    }

    #[test]
    fn explicit_group_relocates_first_group() {
        let mut ctx = Context::new();
        let mut keymap = keymap();
        let mut loader = MemoryLoader::new();
        let mut info = SymbolsInfo::new(1);
        info.explicit_group = Some(2);
        let file = XkbFile::new(
            "f",
            vec![
                Statement::Var(VarDef::indexed("name", 1, Expr::string("Third"))),
                Statement::Var(VarDef::indexed("name", 2, Expr::string("Ignored"))),
                key_stmt(
                    "AC01",
                    vec![
                        VarDef::bare(Expr::keysyms(&["a"])),
                        VarDef::bare(Expr::keysyms(&["b"])),
                    ],
                ),
            ],
        );
        let mut compiler = SymbolsCompiler::new(&mut ctx, &mut keymap, &mut loader);
        compiler.handle_symbols_file(&mut info, &file, MergeMode::Override);

        assert_eq!(info.error_count, 1);
        assert_eq!(info.group_names.len(), 3);
        assert_eq!(info.group_names[2], ctx.lookup_atom("Third"));
        let keyi = &info.keys[0];
        assert_eq!(keyi.groups.len(), 3);
        assert!(!keyi.groups[0].defined.any());
        assert!(!keyi.groups[1].defined.any());
        assert_eq!(keyi.groups[2].levels[0].syms.first(), Keysym::from_char('a'));
        assert!(ctx.has_diagnostic("All groups except first one will be ignored"));
    }

    #[test]
    fn modmap_accepts_keys_and_keysyms() {
        let mut ctx = Context::new();
        let file = XkbFile::new(
            "f",
            vec![Statement::ModMap(ModMapDef {
                merge: MergeMode::Default,
                modifier: "Lock".into(),
                keys: vec![
                    Expr::key_name("CAPS"),
                    Expr::ident("Caps_Lock"),
                    Expr::string("oops"),
                ],
            })],
        );
        let info = build(&mut ctx, &file);
        assert_eq!(info.error_count, 0);
        assert_eq!(info.modmaps.len(), 2);
        assert_eq!(info.modmaps[0].target, ModMapTarget::Key(KeyName::new("CAPS")));
        assert_eq!(info.modmaps[1].modifier, 1);
        assert!(ctx.has_diagnostic("Illegal definition for Lock modifier ignored"));
    }

    #[test]
    fn modmap_rejects_unknown_modifier() {
        let mut ctx = Context::new();
        let file = XkbFile::new(
            "f",
            vec![Statement::ModMap(ModMapDef {
                merge: MergeMode::Default,
                modifier: "Hyper".into(),
                keys: vec![Expr::key_name("CAPS")],
            })],
        );
        let info = build(&mut ctx, &file);
        assert_eq!(info.error_count, 1);
        assert!(info.modmaps.is_empty());
    }

    #[test]
    fn vmods_field_uses_declared_modifiers() {
        let mut ctx = Context::new();
        let mut keymap = keymap();
        let num_lock = ctx.intern("NumLock");
        keymap.vmods.push(VirtualModifier {
            name: num_lock,
            mapping: 0,
        });
        let mut loader = MemoryLoader::new();
        let mut info = SymbolsInfo::new(1);
        let file = XkbFile::new(
            "f",
            vec![
                Statement::VMod(VModDef {
                    merge: MergeMode::Default,
                    name: "AltGr".into(),
                    value: None,
                }),
                key_stmt("AC01", vec![VarDef::field("vmods", Expr::ident("AltGr"))]),
            ],
        );
        let mut compiler = SymbolsCompiler::new(&mut ctx, &mut keymap, &mut loader);
        compiler.handle_symbols_file(&mut info, &file, MergeMode::Override);
        assert_eq!(info.error_count, 0);
        assert_eq!(info.keys[0].vmodmap, 0b10);
    }

    #[test]
    fn ten_errors_are_tolerated() {
        let mut ctx = Context::new();
        let mut statements: Vec<Statement> = (0..MAX_ERRORS).map(|_| bad_stmt()).collect();
        statements.push(key_stmt("AC02", vec![VarDef::bare(Expr::keysyms(&["b"]))]));
        let info = build(&mut ctx, &XkbFile::new("f", statements));
        assert_eq!(info.error_count, MAX_ERRORS);
        assert_eq!(info.keys.len(), 1);
        assert!(!ctx.has_diagnostic("Abandoning"));
    }

    #[test]
    fn eleventh_error_abandons_the_file() {
        let mut ctx = Context::new();
        let mut statements: Vec<Statement> = (0..=MAX_ERRORS).map(|_| bad_stmt()).collect();
        statements.push(key_stmt("AC02", vec![VarDef::bare(Expr::keysyms(&["b"]))]));
        let info = build(&mut ctx, &XkbFile::new("f", statements));
        assert_eq!(info.error_count, MAX_ERRORS + 1);
        assert!(info.keys.is_empty());
        assert!(ctx.has_diagnostic("Abandoning symbols file \"f\""));
    }

    #[test]
    fn action_defaults_are_routed_to_actions() {
        let mut ctx = Context::new();
        let file = XkbFile::new(
            "f",
            vec![
                Statement::Var(VarDef::element("SetMods", "clearLocks", Expr::ident("true"))),
                key_stmt(
                    "AC01",
                    vec![VarDef::bare(Expr::ActionList(vec![Expr::action("SetMods", vec![])]))],
                ),
                Statement::Var(VarDef::field("frobnicate", Expr::Integer(1))),
            ],
        );
        let info = build(&mut ctx, &file);
        assert_eq!(info.error_count, 1);
        match info.keys[0].groups[0].levels[0].action {
            crate::xkb::action::Action::SetMods(m) => assert!(m.clear_locks),
            other => panic!("unexpected action {:?}", other),
        }
    }
}
