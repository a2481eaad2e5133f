//! Resolution of expression nodes into concrete values.
//!
//! Resolvers return `None` when the expression has the wrong shape; reporting that
//! is left to the caller, which knows which field was being set. Range problems the
//! caller cannot describe better (group numbers) are reported here.

use super::ast::Expr;
use super::context::Context;
use super::keymap::{core_mod_index, Keymap, MAX_GROUPS, NUM_CORE_MODS};
use super::keysym::{lookup_keysym, Keysym};

/// Left-hand side of an assignment: `[element.]field[[index]]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lhs<'a> {
    pub element: Option<&'a str>,
    pub field: &'a str,
    pub index: Option<&'a Expr>,
}

pub fn resolve_lhs(expr: &Expr) -> Option<Lhs<'_>> {
    match expr {
        Expr::Ident(field) => Some(Lhs {
            element: None,
            field,
            index: None,
        }),
        Expr::FieldRef { element, field } => Some(Lhs {
            element: Some(element),
            field,
            index: None,
        }),
        Expr::ArrayRef {
            element,
            field,
            index,
        } => Some(Lhs {
            element: element.as_deref(),
            field,
            index: Some(index),
        }),
        _ => None,
    }
}

pub fn resolve_string(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::String(text) => Some(text),
        _ => None,
    }
}

pub fn resolve_boolean(expr: &Expr) -> Option<bool> {
    match expr {
        Expr::Integer(value) => Some(*value != 0),
        Expr::Ident(name) => {
            let name = name.to_ascii_lowercase();
            match name.as_str() {
                "true" | "yes" | "on" => Some(true),
                "false" | "no" | "off" => Some(false),
                _ => None,
            }
        }
        Expr::Not(inner) => resolve_boolean(inner).map(|b| !b),
        _ => None,
    }
}

pub fn resolve_integer(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Integer(value) => Some(*value),
        Expr::Negate(inner) => resolve_integer(inner)?.checked_neg(),
        Expr::UnaryPlus(inner) => resolve_integer(inner),
        Expr::Add(lhs, rhs) => resolve_integer(lhs)?.checked_add(resolve_integer(rhs)?),
        _ => None,
    }
}

/// Resolve an identifier against a case-insensitive lookup table.
pub fn resolve_enum<T: Copy>(expr: &Expr, table: &[(&str, T)]) -> Option<T> {
    let Expr::Ident(name) = expr else {
        return None;
    };
    table
        .iter()
        .find(|(entry, _)| entry.eq_ignore_ascii_case(name))
        .map(|(_, value)| *value)
}

/// Resolve a one-based group number (`2`, `Group2`), checking it is in range.
pub fn resolve_group(ctx: &mut Context, expr: &Expr) -> Option<u32> {
    let value = match expr {
        Expr::Ident(name) => {
            let lower = name.to_ascii_lowercase();
            let digits = lower.strip_prefix("group")?;
            digits.parse::<i64>().ok().filter(|n| (1..=8).contains(n))?
        }
        other => resolve_integer(other)?,
    };

    if value < 1 || value > MAX_GROUPS as i64 {
        ctx.error(format!(
            "Group index {} is out of range (1..{})",
            value, MAX_GROUPS
        ));
        return None;
    }
    Some(value as u32)
}

/// Resolve a keysym given by name, or a digit given as a bare integer.
pub fn resolve_keysym(expr: &Expr) -> Option<Keysym> {
    match expr {
        Expr::Ident(name) => lookup_keysym(name),
        Expr::Integer(value) if (0..=9).contains(value) => {
            Some(Keysym(u32::from(b'0') + *value as u32))
        }
        _ => None,
    }
}

/// Resolve a modifier mask over core and virtual modifiers.
///
/// Virtual modifier bits start right after the core modifiers.
pub fn resolve_mod_mask(ctx: &Context, keymap: &Keymap, expr: &Expr) -> Option<u32> {
    match expr {
        Expr::Integer(value) if *value >= 0 => Some(*value as u32),
        Expr::Ident(name) => {
            if name.eq_ignore_ascii_case("none") {
                return Some(0);
            }
            if name.eq_ignore_ascii_case("all") {
                let vmod_bits = ((1u32 << keymap.vmods.len()) - 1) << NUM_CORE_MODS;
                return Some(0xff | vmod_bits);
            }
            if let Some(index) = core_mod_index(name) {
                return Some(1 << index);
            }
            let atom = ctx.lookup_atom(name)?;
            keymap
                .find_vmod(atom)
                .map(|index| 1 << (NUM_CORE_MODS as usize + index))
        }
        Expr::Add(lhs, rhs) => {
            Some(resolve_mod_mask(ctx, keymap, lhs)? | resolve_mod_mask(ctx, keymap, rhs)?)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xkb::keymap::VirtualModifier;
    use rstest::rstest;

    #[rstest]
    #[case(Expr::Integer(1), Some(1))]
    #[case(Expr::Integer(4), Some(4))]
    #[case(Expr::ident("Group2"), Some(2))]
    #[case(Expr::ident("group3"), Some(3))]
    #[case(Expr::Integer(0), None)]
    #[case(Expr::Integer(5), None)]
    #[case(Expr::ident("Group7"), None)]
    #[case(Expr::string("1"), None)]
    fn groups(#[case] expr: Expr, #[case] expected: Option<u32>) {
        let mut ctx = Context::new();
        assert_eq!(resolve_group(&mut ctx, &expr), expected);
    }

    #[test]
    fn out_of_range_group_is_reported() {
        let mut ctx = Context::new();
        resolve_group(&mut ctx, &Expr::Integer(9));
        assert!(ctx.has_diagnostic("out of range"));
    }

    #[rstest]
    #[case(Expr::ident("True"), Some(true))]
    #[case(Expr::ident("off"), Some(false))]
    #[case(Expr::Not(Box::new(Expr::ident("yes"))), Some(false))]
    #[case(Expr::string("true"), None)]
    fn booleans(#[case] expr: Expr, #[case] expected: Option<bool>) {
        assert_eq!(resolve_boolean(&expr), expected);
    }

    #[test]
    fn lhs_shapes() {
        let plain = Expr::ident("repeat");
        assert_eq!(resolve_lhs(&plain).unwrap().field, "repeat");

        let field = Expr::FieldRef {
            element: "key".into(),
            field: "type".into(),
        };
        assert_eq!(resolve_lhs(&field).unwrap().element, Some("key"));

        let indexed = Expr::ArrayRef {
            element: None,
            field: "symbols".into(),
            index: Box::new(Expr::Integer(2)),
        };
        let lhs = resolve_lhs(&indexed).unwrap();
        assert_eq!(lhs.index, Some(&Expr::Integer(2)));

        assert!(resolve_lhs(&Expr::Integer(3)).is_none());
    }

    #[test]
    fn integer_overflow_is_not_a_value() {
        let negated_min = Expr::Negate(Box::new(Expr::Integer(i64::MIN)));
        assert_eq!(resolve_integer(&negated_min), None);

        let sum = Expr::Add(Box::new(Expr::Integer(i64::MAX)), Box::new(Expr::Integer(1)));
        assert_eq!(resolve_integer(&sum), None);

        let fits = Expr::Add(
            Box::new(Expr::Integer(2)),
            Box::new(Expr::Negate(Box::new(Expr::Integer(3)))),
        );
        assert_eq!(resolve_integer(&fits), Some(-1));
    }

    #[test]
    fn keysyms_from_names_and_digits() {
        assert_eq!(resolve_keysym(&Expr::ident("Caps_Lock")), Some(Keysym(0xffe5)));
        assert_eq!(resolve_keysym(&Expr::Integer(1)), Some(Keysym(0x31)));
        assert_eq!(resolve_keysym(&Expr::Integer(10)), None);
        assert_eq!(resolve_keysym(&Expr::ident("bogus")), None);
    }

    #[test]
    fn mod_masks() {
        let mut ctx = Context::new();
        let mut keymap = Keymap::new();
        let numlock = ctx.intern("NumLock");
        keymap.vmods.push(VirtualModifier {
            name: numlock,
            mapping: 0,
        });

        let shift_ctrl = Expr::Add(
            Box::new(Expr::ident("Shift")),
            Box::new(Expr::ident("control")),
        );
        assert_eq!(resolve_mod_mask(&ctx, &keymap, &shift_ctrl), Some(0b101));
        assert_eq!(
            resolve_mod_mask(&ctx, &keymap, &Expr::ident("NumLock")),
            Some(1 << 8)
        );
        assert_eq!(resolve_mod_mask(&ctx, &keymap, &Expr::ident("Bogus")), None);
    }
}
