//! The keymap the symbols compiler writes into.
//!
//! Keycodes, key types and virtual modifiers are produced by earlier compile stages;
//! this module models their results so the symbols compiler can look keys and types
//! up, and holds the per-key data the compiler fills in.

use super::action::Action;
use super::atom::Atom;
use super::context::Context;
use super::keysym::Keysym;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of groups a key may have.
pub const MAX_GROUPS: usize = 4;
pub const NUM_CORE_MODS: u32 = 8;
pub const MAX_VMODS: usize = 16;

const CORE_MOD_NAMES: [&str; NUM_CORE_MODS as usize] = [
    "Shift", "Lock", "Control", "Mod1", "Mod2", "Mod3", "Mod4", "Mod5",
];

/// Index of a core modifier by (case-insensitive) name.
pub fn core_mod_index(name: &str) -> Option<u32> {
    CORE_MOD_NAMES
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .map(|i| i as u32)
}

pub fn mod_index_text(index: u32) -> String {
    CORE_MOD_NAMES
        .get(index as usize)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Mod{}", index))
}

/// A key identifier of up to four characters, as in `<AC01>`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct KeyName([u8; 4]);

impl KeyName {
    /// Build from text; characters that do not fit in four bytes are dropped.
    pub fn new(text: &str) -> Self {
        let text = text.trim_start_matches('<').trim_end_matches('>');
        let len = text
            .char_indices()
            .map(|(i, c)| i + c.len_utf8())
            .take_while(|end| *end <= 4)
            .last()
            .unwrap_or(0);
        let mut bytes = [0u8; 4];
        bytes[..len].copy_from_slice(&text.as_bytes()[..len]);
        KeyName(bytes)
    }

    pub fn as_str(&self) -> &str {
        let len = self.0.iter().position(|b| *b == 0).unwrap_or(4);
        std::str::from_utf8(&self.0[..len]).unwrap_or("")
    }
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.as_str())
    }
}

impl fmt::Debug for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyName({})", self)
    }
}

impl Serialize for KeyName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Symbols produced by one level: none, one stored inline, or several owned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LevelSyms {
    #[default]
    None,
    One(Keysym),
    Many(Vec<Keysym>),
}

impl LevelSyms {
    pub fn from_vec(mut syms: Vec<Keysym>) -> Self {
        match syms.len() {
            0 => LevelSyms::None,
            1 => LevelSyms::One(syms.remove(0)),
            _ => LevelSyms::Many(syms),
        }
    }

    pub fn count(&self) -> usize {
        match self {
            LevelSyms::None => 0,
            LevelSyms::One(_) => 1,
            LevelSyms::Many(syms) => syms.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, LevelSyms::None)
    }

    pub fn as_slice(&self) -> &[Keysym] {
        match self {
            LevelSyms::None => &[],
            LevelSyms::One(sym) => std::slice::from_ref(sym),
            LevelSyms::Many(syms) => syms,
        }
    }

    /// First symbol, or `NoSymbol` for an empty level.
    pub fn first(&self) -> Keysym {
        self.as_slice().first().copied().unwrap_or(Keysym::NO_SYMBOL)
    }
}

/// One shift level of a group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Level {
    pub syms: LevelSyms,
    pub action: Action,
}

impl Level {
    pub fn with_syms(syms: LevelSyms) -> Self {
        Self {
            syms,
            action: Action::None,
        }
    }
}

/// What happens when the effective group is past a key's last group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeExceed {
    #[default]
    Wrap,
    Saturate,
    /// Redirect to the given zero-based group.
    Redirect(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyType {
    pub name: Atom,
    pub num_levels: usize,
}

impl KeyType {
    pub fn new(ctx: &mut Context, name: &str, num_levels: usize) -> Self {
        Self {
            name: ctx.intern(name),
            num_levels,
        }
    }
}

/// The canonical types the automatic classifier can pick, `ONE_LEVEL` first.
pub fn standard_types(ctx: &mut Context) -> Vec<KeyType> {
    [
        ("ONE_LEVEL", 1),
        ("TWO_LEVEL", 2),
        ("ALPHABETIC", 2),
        ("KEYPAD", 2),
        ("FOUR_LEVEL", 4),
        ("FOUR_LEVEL_ALPHABETIC", 4),
        ("FOUR_LEVEL_SEMIALPHABETIC", 4),
        ("FOUR_LEVEL_KEYPAD", 4),
    ]
    .into_iter()
    .map(|(name, levels)| KeyType::new(ctx, name, levels))
    .collect()
}

/// Which key fields were set by the layout rather than left to later stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ExplicitComponents {
    pub repeat: bool,
    pub vmodmap: bool,
    pub interp: bool,
    pub group_info: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyGroup {
    pub type_index: usize,
    pub explicit_type: bool,
    pub levels: Vec<Level>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    pub name: KeyName,
    pub keycode: u32,
    pub groups: Vec<KeyGroup>,
    pub repeats: bool,
    pub vmodmap: u32,
    pub modmap: u32,
    pub out_of_range: RangeExceed,
    pub explicit: ExplicitComponents,
}

impl Key {
    pub fn new(name: KeyName, keycode: u32) -> Self {
        Self {
            name,
            keycode,
            groups: Vec::new(),
            repeats: true,
            vmodmap: 0,
            modmap: 0,
            out_of_range: RangeExceed::Wrap,
            explicit: ExplicitComponents::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyAlias {
    pub alias: KeyName,
    pub real: KeyName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualModifier {
    pub name: Atom,
    pub mapping: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Keymap {
    /// Kept in ascending keycode order.
    keys: Vec<Key>,
    pub aliases: Vec<KeyAlias>,
    pub types: Vec<KeyType>,
    pub vmods: Vec<VirtualModifier>,
    pub group_names: Vec<Option<Atom>>,
    pub symbols_section_name: Option<String>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key, replacing any key with the same keycode.
    pub fn add_key(&mut self, name: &str, keycode: u32) -> &mut Self {
        let key = Key::new(KeyName::new(name), keycode);
        match self.keys.binary_search_by_key(&keycode, |k| k.keycode) {
            Ok(pos) => self.keys[pos] = key,
            Err(pos) => self.keys.insert(pos, key),
        }
        self
    }

    pub fn add_alias(&mut self, alias: &str, real: &str) -> &mut Self {
        self.aliases.push(KeyAlias {
            alias: KeyName::new(alias),
            real: KeyName::new(real),
        });
        self
    }

    pub fn add_type(&mut self, key_type: KeyType) -> &mut Self {
        self.types.push(key_type);
        self
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn keys_mut(&mut self) -> &mut [Key] {
        &mut self.keys
    }

    /// Real name for `alias`, if it is one.
    pub fn find_key_name_for_alias(&self, alias: KeyName) -> Option<KeyName> {
        self.aliases
            .iter()
            .find(|a| a.alias == alias)
            .map(|a| a.real)
    }

    /// Position of the key called `name`, optionally resolving aliases.
    pub fn find_key_index(&self, name: KeyName, use_aliases: bool) -> Option<usize> {
        if let Some(pos) = self.keys.iter().position(|k| k.name == name) {
            return Some(pos);
        }
        if use_aliases {
            let real = self.find_key_name_for_alias(name)?;
            return self.find_key_index(real, false);
        }
        None
    }

    pub fn key(&self, name: &str) -> Option<&Key> {
        self.find_key_index(KeyName::new(name), true)
            .map(|pos| &self.keys[pos])
    }

    pub fn find_type(&self, name: Atom) -> Option<usize> {
        self.types.iter().position(|t| t.name == name)
    }

    /// Bit index (beyond the core modifiers) of a virtual modifier.
    pub fn find_vmod(&self, name: Atom) -> Option<usize> {
        self.vmods.iter().position(|v| v.name == name)
    }

    pub fn build(ctx: &mut Context, description: &KeymapDescription) -> Self {
        let mut keymap = Keymap::new();
        for key in &description.keys {
            keymap.add_key(&key.name, key.keycode);
        }
        for alias in &description.aliases {
            keymap.add_alias(&alias.alias, &alias.real);
        }
        match &description.types {
            Some(types) => {
                for t in types {
                    let key_type = KeyType::new(ctx, &t.name, t.levels);
                    keymap.add_type(key_type);
                }
            }
            None => keymap.types = standard_types(ctx),
        }
        for name in description.virtual_modifiers.iter().take(MAX_VMODS) {
            let name = ctx.intern(name);
            keymap.vmods.push(VirtualModifier { name, mapping: 0 });
        }
        keymap
    }
}

/// Results of the keycodes/types stages, as read from YAML or JSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeymapDescription {
    #[serde(default)]
    pub keys: Vec<KeycodeEntry>,
    #[serde(default)]
    pub aliases: Vec<AliasEntry>,
    /// Missing means the standard type set.
    #[serde(default)]
    pub types: Option<Vec<TypeEntry>>,
    #[serde(default)]
    pub virtual_modifiers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeycodeEntry {
    pub name: String,
    pub keycode: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AliasEntry {
    pub alias: String,
    pub real: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeEntry {
    pub name: String,
    pub levels: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_truncate_and_strip_brackets() {
        assert_eq!(KeyName::new("<AC01>").as_str(), "AC01");
        assert_eq!(KeyName::new("LONGNAME").as_str(), "LONG");
        assert_eq!(KeyName::new("ESC").to_string(), "<ESC>");
    }

    #[test]
    fn key_names_truncate_on_char_boundaries() {
        assert_eq!(KeyName::new("ÄÖÜ").as_str(), "ÄÖ");
        assert_eq!(KeyName::new("AÄÖ").as_str(), "AÄ");
        assert_eq!(KeyName::new("<€€>").as_str(), "€");
    }

    #[test]
    fn keys_stay_in_keycode_order() {
        let mut keymap = Keymap::new();
        keymap.add_key("AC02", 39).add_key("AC01", 38).add_key("ESC", 9);
        let codes: Vec<u32> = keymap.keys().iter().map(|k| k.keycode).collect();
        assert_eq!(codes, vec![9, 38, 39]);
    }

    #[test]
    fn aliases_resolve_only_when_asked() {
        let mut keymap = Keymap::new();
        keymap.add_key("LatQ", 24).add_alias("AD01", "LatQ");
        assert!(keymap.find_key_index(KeyName::new("AD01"), true).is_some());
        assert!(keymap.find_key_index(KeyName::new("AD01"), false).is_none());
        assert_eq!(
            keymap.find_key_name_for_alias(KeyName::new("AD01")),
            Some(KeyName::new("LatQ"))
        );
    }

    #[test]
    fn level_syms_storage() {
        let none = LevelSyms::from_vec(vec![]);
        let one = LevelSyms::from_vec(vec![Keysym(0x61)]);
        let many = LevelSyms::from_vec(vec![Keysym(0x61), Keysym(0x62)]);
        assert_eq!(none.count(), 0);
        assert_eq!(none.first(), Keysym::NO_SYMBOL);
        assert_eq!(one, LevelSyms::One(Keysym(0x61)));
        assert_eq!(many.count(), 2);
        assert_eq!(many.first(), Keysym(0x61));
    }

    #[test]
    fn description_defaults_to_standard_types() {
        let mut ctx = Context::new();
        let description: KeymapDescription = serde_json::from_str(
            r#"{ "keys": [ { "name": "AC01", "keycode": 38 } ], "virtual_modifiers": ["NumLock"] }"#,
        )
        .unwrap();
        let keymap = Keymap::build(&mut ctx, &description);
        assert_eq!(keymap.keys().len(), 1);
        assert_eq!(ctx.atom_text(keymap.types[0].name), "ONE_LEVEL");
        assert_eq!(keymap.types.len(), 8);
        assert_eq!(keymap.vmods.len(), 1);
    }
}
