//! Automatic key type selection for groups that were given no type.
//!
//! Only the first symbol of each of the first four levels is looked at; levels
//! carrying several symbols are classified by their first one.

use crate::xkb::keymap::Level;
use crate::xkb::keysym::Keysym;

/// Type picked for a group, and whether the choice was purely structural.
///
/// `automatic` is false for the alphabetic and four-level picks, which are then
/// recorded on the key as if the layout had named them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutomaticType {
    pub name: &'static str,
    pub automatic: bool,
}

impl AutomaticType {
    const fn new(name: &'static str, automatic: bool) -> Self {
        Self { name, automatic }
    }
}

fn sym_at(levels: &[Level], index: usize) -> Keysym {
    levels
        .get(index)
        .map_or(Keysym::NO_SYMBOL, |level| level.syms.first())
}

fn is_alphabetic_pair(lower: Keysym, upper: Keysym) -> bool {
    lower.is_lower() && upper.is_upper()
}

/// Classify a group by its width and keysyms. Groups wider than four levels have
/// no automatic type.
pub fn find_automatic_type(levels: &[Level]) -> Option<AutomaticType> {
    let width = levels.len();
    match width {
        0 | 1 => Some(AutomaticType::new("ONE_LEVEL", true)),
        2 => {
            let (sym0, sym1) = (sym_at(levels, 0), sym_at(levels, 1));
            if is_alphabetic_pair(sym0, sym1) {
                Some(AutomaticType::new("ALPHABETIC", false))
            } else if sym0.is_keypad() || sym1.is_keypad() {
                Some(AutomaticType::new("KEYPAD", true))
            } else {
                Some(AutomaticType::new("TWO_LEVEL", true))
            }
        }
        3 | 4 => {
            let (sym0, sym1) = (sym_at(levels, 0), sym_at(levels, 1));
            let (sym2, sym3) = (sym_at(levels, 2), sym_at(levels, 3));
            let name = if is_alphabetic_pair(sym0, sym1) {
                if is_alphabetic_pair(sym2, sym3) {
                    "FOUR_LEVEL_ALPHABETIC"
                } else {
                    "FOUR_LEVEL_SEMIALPHABETIC"
                }
            } else if sym0.is_keypad() || sym1.is_keypad() {
                "FOUR_LEVEL_KEYPAD"
            } else {
                "FOUR_LEVEL"
            };
            Some(AutomaticType::new(name, false))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xkb::keymap::LevelSyms;
    use crate::xkb::keysym::lookup_keysym;
    use rstest::rstest;

    fn levels(names: &[&str]) -> Vec<Level> {
        names
            .iter()
            .map(|name| match lookup_keysym(name) {
                Some(sym) if sym != Keysym::NO_SYMBOL => Level::with_syms(LevelSyms::One(sym)),
                _ => Level::default(),
            })
            .collect()
    }

    #[rstest]
    #[case(&[], "ONE_LEVEL")]
    #[case(&["Escape"], "ONE_LEVEL")]
    #[case(&["a", "A"], "ALPHABETIC")]
    #[case(&["A", "a"], "TWO_LEVEL")]
    #[case(&["1", "exclam"], "TWO_LEVEL")]
    #[case(&["KP_Home", "KP_7"], "KEYPAD")]
    #[case(&["a", "A", "1", "exclam"], "FOUR_LEVEL_SEMIALPHABETIC")]
    #[case(&["a", "A", "ae", "AE"], "FOUR_LEVEL_ALPHABETIC")]
    #[case(&["KP_Delete", "KP_Decimal", "comma", "period"], "FOUR_LEVEL_KEYPAD")]
    #[case(&["1", "exclam", "onesuperior", "exclamdown"], "FOUR_LEVEL")]
    #[case(&["a", "A", "ae"], "FOUR_LEVEL_SEMIALPHABETIC")]
    fn picks_type(#[case] names: &[&str], #[case] expected: &str) {
        let found = find_automatic_type(&levels(names)).expect("classifiable width");
        assert_eq!(found.name, expected);
    }

    #[test]
    fn structural_flag() {
        assert!(find_automatic_type(&levels(&["a"])).unwrap().automatic);
        assert!(find_automatic_type(&levels(&["1", "2"])).unwrap().automatic);
        assert!(!find_automatic_type(&levels(&["a", "A"])).unwrap().automatic);
        assert!(!find_automatic_type(&levels(&["1", "2", "3"])).unwrap().automatic);
    }

    #[test]
    fn wide_groups_have_no_automatic_type() {
        let wide = levels(&["a", "A", "b", "B", "c"]);
        assert_eq!(find_automatic_type(&wide), None);
    }

    #[test]
    fn only_first_symbol_of_a_level_counts() {
        let mut group = levels(&["a", "A"]);
        group[1].syms = LevelSyms::Many(vec![
            lookup_keysym("A").unwrap(),
            lookup_keysym("b").unwrap(),
        ]);
        assert_eq!(find_automatic_type(&group).unwrap().name, "ALPHABETIC");
    }
}
