//! Serializable view of a compiled keymap, with atoms and keysyms resolved to text.
//!
//! Only keys that received symbols or modifiers are listed.

use serde::Serialize;

use super::action::Action;
use super::context::Context;
use super::keymap::{mod_index_text, ExplicitComponents, Key, Keymap, RangeExceed, NUM_CORE_MODS};
use super::symbols::MaterializeReport;

#[derive(Debug, Clone, Serialize)]
pub struct KeymapSummary {
    pub symbols: Option<String>,
    pub group_names: Vec<Option<String>>,
    pub keys: Vec<KeySummary>,
    pub report: MaterializeReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeySummary {
    pub name: String,
    pub keycode: u32,
    pub repeats: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub virtual_modifiers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,
    pub out_of_range: RangeExceed,
    pub explicit: ExplicitComponents,
    pub groups: Vec<GroupSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    #[serde(rename = "type")]
    pub type_name: String,
    pub explicit_type: bool,
    pub levels: Vec<LevelSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelSummary {
    pub symbols: Vec<String>,
    #[serde(skip_serializing_if = "Action::is_none")]
    pub action: Action,
}

impl KeymapSummary {
    pub fn new(ctx: &Context, keymap: &Keymap, report: MaterializeReport) -> Self {
        Self {
            symbols: keymap.symbols_section_name.clone(),
            group_names: keymap
                .group_names
                .iter()
                .map(|name| name.map(|atom| ctx.atom_text(atom).to_string()))
                .collect(),
            keys: keymap
                .keys()
                .iter()
                .filter(|key| !key.groups.is_empty() || key.modmap != 0)
                .map(|key| KeySummary::new(ctx, keymap, key))
                .collect(),
            report,
        }
    }
}

impl KeySummary {
    fn new(ctx: &Context, keymap: &Keymap, key: &Key) -> Self {
        let modifiers = (0..NUM_CORE_MODS)
            .filter(|&i| key.modmap & (1 << i) != 0)
            .map(mod_index_text)
            .collect();
        let virtual_modifiers = keymap
            .vmods
            .iter()
            .enumerate()
            .filter(|&(i, _)| key.vmodmap & (1 << i) != 0)
            .map(|(_, vmod)| ctx.atom_text(vmod.name).to_string())
            .collect();

        let groups = key
            .groups
            .iter()
            .map(|group| GroupSummary {
                type_name: keymap
                    .types
                    .get(group.type_index)
                    .map_or_else(String::new, |t| ctx.atom_text(t.name).to_string()),
                explicit_type: group.explicit_type,
                levels: group
                    .levels
                    .iter()
                    .map(|level| LevelSummary {
                        symbols: level.syms.as_slice().iter().map(|s| s.name()).collect(),
                        action: level.action,
                    })
                    .collect(),
            })
            .collect();

        Self {
            name: key.name.as_str().to_string(),
            keycode: key.keycode,
            repeats: key.repeats,
            virtual_modifiers,
            modifiers,
            out_of_range: key.out_of_range,
            explicit: key.explicit,
            groups,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xkb::keymap::{standard_types, KeyGroup, Level, LevelSyms};
    use crate::xkb::keysym::Keysym;

    #[test]
    fn summarizes_only_touched_keys() {
        let mut ctx = Context::new();
        let mut keymap = Keymap::new();
        keymap.add_key("AC01", 38).add_key("AC02", 39).add_key("CAPS", 66);
        keymap.types = standard_types(&mut ctx);
        let alpha = keymap.find_type(ctx.intern("ALPHABETIC")).expect("standard type");
        keymap.group_names = vec![Some(ctx.intern("English (US)"))];
        keymap.symbols_section_name = Some("us".into());

        {
            let keys = keymap.keys_mut();
            keys[0].groups.push(KeyGroup {
                type_index: alpha,
                explicit_type: true,
                levels: vec![
                    Level::with_syms(LevelSyms::One(Keysym::from_char('a'))),
                    Level::with_syms(LevelSyms::One(Keysym::from_char('A'))),
                ],
            });
            keys[2].modmap = 1 << 1;
        }

        let summary = KeymapSummary::new(&ctx, &keymap, MaterializeReport::default());
        assert_eq!(summary.keys.len(), 2);
        assert_eq!(summary.group_names, vec![Some("English (US)".to_string())]);

        let json = serde_json::to_value(&summary).expect("serializes");
        assert_eq!(json["keys"][0]["groups"][0]["type"], "ALPHABETIC");
        assert_eq!(json["keys"][0]["groups"][0]["levels"][1]["symbols"][0], "A");
        assert_eq!(json["keys"][1]["name"], "CAPS");
        assert_eq!(json["keys"][1]["modifiers"][0], "Lock");
    }
}
