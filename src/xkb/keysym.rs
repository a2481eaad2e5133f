//! Keysym resolution and classification.
//!
//! A keysym is the numeric code for a character or function a key can produce.
//! Two sentinels matter to the compiler: [`Keysym::NO_SYMBOL`] (nothing at all) and
//! [`Keysym::VOID_SYMBOL`], which explicitly suppresses any fallback.

mod table;

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct Keysym(pub u32);

impl Keysym {
    pub const NO_SYMBOL: Keysym = Keysym(0);
    pub const VOID_SYMBOL: Keysym = Keysym(0x00ff_ffff);

    const UNICODE_OFFSET: u32 = 0x0100_0000;
    const KP_SPACE: u32 = 0xff80;
    const KP_EQUAL: u32 = 0xffbd;

    /// Look a keysym up by its exact name. Also accepts `Uxxxx` and `0xNNNN` forms.
    pub fn from_name(name: &str) -> Option<Keysym> {
        if let Some(value) = NAME_TO_KEYSYM.get(name) {
            return Some(Keysym(*value));
        }

        if let Some(hex) = name.strip_prefix('U') {
            let code = u32::from_str_radix(hex, 16).ok()?;
            if code < 0x20 || (code > 0x7e && code < 0xa0) || code > 0x10_ffff {
                return None;
            }
            if code < 0x100 {
                return Some(Keysym(code));
            }
            return Some(Keysym(code | Self::UNICODE_OFFSET));
        }

        if let Some(hex) = name.strip_prefix("0x") {
            return u32::from_str_radix(hex, 16).ok().map(Keysym);
        }

        None
    }

    /// Keysym for a character, preferring a legacy keysym where one exists.
    pub fn from_char(c: char) -> Keysym {
        if is_latin1(c) {
            return Keysym(c as u32);
        }
        match UNICODE_TO_LEGACY.get(&(c as u32)) {
            Some(legacy) => Keysym(*legacy),
            None => Self::from_unicode(c),
        }
    }

    fn from_unicode(c: char) -> Keysym {
        if is_latin1(c) {
            Keysym(c as u32)
        } else {
            Keysym(c as u32 | Self::UNICODE_OFFSET)
        }
    }

    pub fn to_char(self) -> Option<char> {
        match self.0 {
            0x20..=0x7e | 0xa0..=0xff => char::from_u32(self.0),
            0x0100_0100..=0x0110_ffff => char::from_u32(self.0 - Self::UNICODE_OFFSET),
            code => table::LEGACY_TO_UNICODE
                .binary_search_by_key(&code, |(keysym, _)| *keysym)
                .ok()
                .and_then(|i| char::from_u32(table::LEGACY_TO_UNICODE[i].1)),
        }
    }

    /// Lower and upper case forms; both equal `self` for caseless keysyms.
    pub fn convert_case(self) -> (Keysym, Keysym) {
        let Some(c) = self.to_char() else {
            return (self, self);
        };
        // Case partners keep the encoding of `self`.
        let encode: fn(char) -> Keysym = if self.0 >= Self::UNICODE_OFFSET {
            Keysym::from_unicode
        } else {
            Keysym::from_char
        };
        let lower = single_char(c.to_lowercase()).map_or(self, encode);
        let upper = single_char(c.to_uppercase()).map_or(self, encode);
        (lower, upper)
    }

    pub fn is_lower(self) -> bool {
        let (lower, upper) = self.convert_case();
        lower != upper && self == lower
    }

    pub fn is_upper(self) -> bool {
        let (lower, upper) = self.convert_case();
        lower != upper && self == upper
    }

    pub fn is_keypad(self) -> bool {
        (Self::KP_SPACE..=Self::KP_EQUAL).contains(&self.0)
    }

    /// Canonical name, or a numeric rendering for unnamed keysyms.
    pub fn name(self) -> String {
        if let Some(name) = KEYSYM_TO_NAME.get(&self.0) {
            return (*name).to_string();
        }
        if (0x0100_0100..=0x0110_ffff).contains(&self.0) {
            return format!("U{:04X}", self.0 - Self::UNICODE_OFFSET);
        }
        format!("0x{:08x}", self.0)
    }
}

impl fmt::Display for Keysym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

fn is_latin1(c: char) -> bool {
    matches!(c as u32, 0x20..=0x7e | 0xa0..=0xff)
}

fn single_char(mut chars: impl Iterator<Item = char>) -> Option<char> {
    let first = chars.next()?;
    match chars.next() {
        None => Some(first),
        Some(_) => None,
    }
}

static NAME_TO_KEYSYM: Lazy<HashMap<String, u32>> = Lazy::new(|| {
    let mut map: HashMap<String, u32> = table::NAMED_KEYSYMS
        .iter()
        .map(|(name, value)| (name.to_string(), *value))
        .collect();
    for c in ('0'..='9').chain('A'..='Z').chain('a'..='z') {
        map.insert(c.to_string(), c as u32);
    }
    map
});

static UNICODE_TO_LEGACY: Lazy<HashMap<u32, u32>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for (keysym, code) in table::LEGACY_TO_UNICODE {
        map.entry(*code).or_insert(*keysym);
    }
    map
});

static KEYSYM_TO_NAME: Lazy<HashMap<u32, String>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for c in ('0'..='9').chain('A'..='Z').chain('a'..='z') {
        map.insert(c as u32, c.to_string());
    }
    for (name, value) in table::NAMED_KEYSYMS {
        map.entry(*value).or_insert_with(|| name.to_string());
    }
    map
});

/// Resolve a symbol name as written in a layout.
///
/// `any`/`nosymbol` give [`Keysym::NO_SYMBOL`], `none`/`voidsymbol` give
/// [`Keysym::VOID_SYMBOL`] (both case-insensitive); anything else must be a known
/// keysym name.
pub fn lookup_keysym(name: &str) -> Option<Keysym> {
    if name.eq_ignore_ascii_case("any") || name.eq_ignore_ascii_case("nosymbol") {
        return Some(Keysym::NO_SYMBOL);
    }
    if name.eq_ignore_ascii_case("none") || name.eq_ignore_ascii_case("voidsymbol") {
        return Some(Keysym::VOID_SYMBOL);
    }
    match Keysym::from_name(name) {
        Some(sym) if sym != Keysym::NO_SYMBOL => Some(sym),
        _ => None,
    }
}
