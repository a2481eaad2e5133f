//! Key actions and the statements that define them.
//!
//! Only the part of the action grammar the symbols compiler needs is handled here:
//! modifier and group actions, `NoAction()` and `Terminate()`. Global statements
//! such as `SetMods.clearLocks = true;` update the defaults every later action of
//! that type starts from.

use super::ast::Expr;
use super::context::Context;
use super::expr::{resolve_boolean, resolve_integer, resolve_lhs, resolve_mod_mask};
use super::keymap::Keymap;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ModAction {
    pub mods: u32,
    /// Take the modifiers from the key's modifier map instead of `mods`.
    pub use_mod_map_mods: bool,
    pub clear_locks: bool,
    pub latch_to_lock: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GroupAction {
    /// Zero-based when absolute, a signed offset otherwise.
    pub group: i32,
    pub absolute: bool,
    pub clear_locks: bool,
    pub latch_to_lock: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    #[default]
    None,
    SetMods(ModAction),
    LatchMods(ModAction),
    LockMods(ModAction),
    SetGroup(GroupAction),
    LatchGroup(GroupAction),
    LockGroup(GroupAction),
    Terminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    None,
    SetMods,
    LatchMods,
    LockMods,
    SetGroup,
    LatchGroup,
    LockGroup,
    Terminate,
}

const ACTION_TYPES: [(&str, ActionType); 9] = [
    ("NoAction", ActionType::None),
    ("SetMods", ActionType::SetMods),
    ("LatchMods", ActionType::LatchMods),
    ("LockMods", ActionType::LockMods),
    ("SetGroup", ActionType::SetGroup),
    ("LatchGroup", ActionType::LatchGroup),
    ("LockGroup", ActionType::LockGroup),
    ("Terminate", ActionType::Terminate),
    ("TerminateServer", ActionType::Terminate),
];

impl ActionType {
    pub fn lookup(name: &str) -> Option<ActionType> {
        ACTION_TYPES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, t)| *t)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = ACTION_TYPES
            .iter()
            .find(|(_, t)| t == self)
            .map_or("Unknown", |(n, _)| n);
        f.write_str(name)
    }
}

impl Action {
    pub fn action_type(&self) -> ActionType {
        match self {
            Action::None => ActionType::None,
            Action::SetMods(_) => ActionType::SetMods,
            Action::LatchMods(_) => ActionType::LatchMods,
            Action::LockMods(_) => ActionType::LockMods,
            Action::SetGroup(_) => ActionType::SetGroup,
            Action::LatchGroup(_) => ActionType::LatchGroup,
            Action::LockGroup(_) => ActionType::LockGroup,
            Action::Terminate => ActionType::Terminate,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Action::None)
    }

    fn default_for(action_type: ActionType) -> Action {
        match action_type {
            ActionType::None => Action::None,
            ActionType::SetMods => Action::SetMods(ModAction::default()),
            ActionType::LatchMods => Action::LatchMods(ModAction::default()),
            ActionType::LockMods => Action::LockMods(ModAction::default()),
            ActionType::SetGroup => Action::SetGroup(GroupAction::default()),
            ActionType::LatchGroup => Action::LatchGroup(GroupAction::default()),
            ActionType::LockGroup => Action::LockGroup(GroupAction::default()),
            ActionType::Terminate => Action::Terminate,
        }
    }

    /// Apply one `field = value` argument.
    fn set_field(&mut self, ctx: &mut Context, keymap: &Keymap, field: &str, value: &Expr) -> bool {
        let field = field.to_ascii_lowercase();
        match self {
            Action::SetMods(m) | Action::LatchMods(m) | Action::LockMods(m) => {
                match field.as_str() {
                    "modifiers" | "mods" => {
                        if let Expr::Ident(name) = value {
                            if name.eq_ignore_ascii_case("usemodmapmods")
                                || name.eq_ignore_ascii_case("modmapmods")
                            {
                                m.use_mod_map_mods = true;
                                m.mods = 0;
                                return true;
                            }
                        }
                        match resolve_mod_mask(ctx, keymap, value) {
                            Some(mask) => {
                                m.mods = mask;
                                m.use_mod_map_mods = false;
                                true
                            }
                            None => false,
                        }
                    }
                    "clearlocks" => set_bool(&mut m.clear_locks, value),
                    "latchtolock" => set_bool(&mut m.latch_to_lock, value),
                    _ => false,
                }
            }
            Action::SetGroup(g) | Action::LatchGroup(g) | Action::LockGroup(g) => {
                match field.as_str() {
                    "group" => {
                        let Some(number) = resolve_integer(value) else {
                            return false;
                        };
                        let Ok(number) = i32::try_from(number) else {
                            ctx.error(format!("Group number {} is out of range", number));
                            return false;
                        };
                        match value {
                            Expr::Negate(_) | Expr::UnaryPlus(_) => {
                                g.absolute = false;
                                g.group = number;
                            }
                            _ => {
                                let Some(group) = number.checked_sub(1) else {
                                    ctx.error(format!("Group number {} is out of range", number));
                                    return false;
                                };
                                g.absolute = true;
                                g.group = group;
                            }
                        }
                        true
                    }
                    "clearlocks" => set_bool(&mut g.clear_locks, value),
                    "latchtolock" => set_bool(&mut g.latch_to_lock, value),
                    _ => false,
                }
            }
            Action::None | Action::Terminate => false,
        }
    }
}

fn set_bool(slot: &mut bool, value: &Expr) -> bool {
    match resolve_boolean(value) {
        Some(b) => {
            *slot = b;
            true
        }
        None => false,
    }
}

/// Per-action-type defaults set by global statements.
#[derive(Debug, Clone)]
pub struct ActionsInfo {
    defaults: [Action; 8],
}

impl Default for ActionsInfo {
    fn default() -> Self {
        Self {
            defaults: [
                Action::default_for(ActionType::None),
                Action::default_for(ActionType::SetMods),
                Action::default_for(ActionType::LatchMods),
                Action::default_for(ActionType::LockMods),
                Action::default_for(ActionType::SetGroup),
                Action::default_for(ActionType::LatchGroup),
                Action::default_for(ActionType::LockGroup),
                Action::default_for(ActionType::Terminate),
            ],
        }
    }
}

impl ActionsInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an action from an action declaration such as
    /// `SetMods(modifiers = Shift, clearLocks)`.
    pub fn handle_action_def(
        &self,
        ctx: &mut Context,
        keymap: &Keymap,
        expr: &Expr,
    ) -> Option<Action> {
        let Expr::Action { name, args } = expr else {
            ctx.error(format!(
                "Expected an action definition, found {}",
                expr.kind_name()
            ));
            return None;
        };

        let Some(action_type) = ActionType::lookup(name) else {
            ctx.error(format!("Unknown action {}", name));
            return None;
        };

        let mut action = self.defaults[action_type.index()];
        for arg in args {
            let (field, value) = match arg {
                Expr::Assign { lhs, value } => match resolve_lhs(lhs) {
                    Some(lhs) => (lhs.field, value.as_ref().clone()),
                    None => return None,
                },
                Expr::Not(inner) => match inner.as_ref() {
                    Expr::Ident(field) => (field.as_str(), Expr::ident("false")),
                    _ => return None,
                },
                Expr::Ident(field) => (field.as_str(), Expr::ident("true")),
                other => {
                    ctx.error(format!(
                        "Unexpected {} in arguments of {}",
                        other.kind_name(),
                        action_type
                    ));
                    return None;
                }
            };

            if !action.set_field(ctx, keymap, field, &value) {
                ctx.error(format!(
                    "Invalid field or value for {} in action {}",
                    field, action_type
                ));
                return None;
            }
        }

        Some(action)
    }

    /// Handle a global `Element.field = value;` statement for an action type.
    pub fn set_action_field(
        &mut self,
        ctx: &mut Context,
        keymap: &Keymap,
        element: Option<&str>,
        field: &str,
        index: Option<&Expr>,
        value: &Expr,
    ) -> bool {
        let Some(element) = element else {
            ctx.error(format!(
                "Unknown field {} in a symbol interpretation; Definition ignored",
                field
            ));
            return false;
        };

        let Some(action_type) = ActionType::lookup(element) else {
            ctx.error(format!(
                "Unknown statement type {}; Definition of {}.{} ignored",
                element, element, field
            ));
            return false;
        };

        if index.is_some() {
            ctx.error(format!(
                "The {} field of {} is not an array; Index ignored",
                field, action_type
            ));
            return false;
        }

        if !self.defaults[action_type.index()].set_field(ctx, keymap, field, value) {
            ctx.error(format!(
                "Invalid default for {}.{}; Definition ignored",
                action_type, field
            ));
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_mod_action_with_flags() {
        let mut ctx = Context::new();
        let keymap = Keymap::new();
        let actions = ActionsInfo::new();
        let expr = Expr::action(
            "SetMods",
            vec![Expr::assign("modifiers", Expr::ident("Shift")), Expr::ident("clearLocks")],
        );
        let action = actions.handle_action_def(&mut ctx, &keymap, &expr).unwrap();
        assert_eq!(
            action,
            Action::SetMods(ModAction {
                mods: 1,
                use_mod_map_mods: false,
                clear_locks: true,
                latch_to_lock: false,
            })
        );
    }

    #[test]
    fn group_actions_absolute_and_relative() {
        let mut ctx = Context::new();
        let keymap = Keymap::new();
        let actions = ActionsInfo::new();

        let absolute = Expr::action("LockGroup", vec![Expr::assign("group", Expr::Integer(2))]);
        let Some(Action::LockGroup(g)) = actions.handle_action_def(&mut ctx, &keymap, &absolute)
        else {
            panic!("expected LockGroup");
        };
        assert!(g.absolute);
        assert_eq!(g.group, 1);

        let relative = Expr::action(
            "SetGroup",
            vec![Expr::assign("group", Expr::Negate(Box::new(Expr::Integer(1))))],
        );
        let Some(Action::SetGroup(g)) = actions.handle_action_def(&mut ctx, &keymap, &relative)
        else {
            panic!("expected SetGroup");
        };
        assert!(!g.absolute);
        assert_eq!(g.group, -1);
    }

    #[test]
    fn group_numbers_outside_i32_are_rejected() {
        let mut ctx = Context::new();
        let keymap = Keymap::new();
        let actions = ActionsInfo::new();

        let huge = Expr::action("LockGroup", vec![Expr::assign("group", Expr::Integer(4_294_967_297))]);
        assert!(actions.handle_action_def(&mut ctx, &keymap, &huge).is_none());
        assert!(ctx.has_diagnostic("Group number 4294967297 is out of range"));

        let lowest = Expr::action(
            "SetGroup",
            vec![Expr::assign("group", Expr::Integer(i64::from(i32::MIN)))],
        );
        assert!(actions.handle_action_def(&mut ctx, &keymap, &lowest).is_none());
    }

    #[test]
    fn global_defaults_apply_to_later_actions() {
        let mut ctx = Context::new();
        let keymap = Keymap::new();
        let mut actions = ActionsInfo::new();
        assert!(actions.set_action_field(
            &mut ctx,
            &keymap,
            Some("setmods"),
            "clearLocks",
            None,
            &Expr::ident("true"),
        ));
        let action = actions
            .handle_action_def(&mut ctx, &keymap, &Expr::action("SetMods", vec![]))
            .unwrap();
        let Action::SetMods(m) = action else {
            panic!("expected SetMods");
        };
        assert!(m.clear_locks);
    }

    #[test]
    fn unknown_actions_and_fields_fail() {
        let mut ctx = Context::new();
        let keymap = Keymap::new();
        let mut actions = ActionsInfo::new();
        assert!(actions
            .handle_action_def(&mut ctx, &keymap, &Expr::action("MovePtr", vec![]))
            .is_none());
        assert!(actions
            .handle_action_def(
                &mut ctx,
                &keymap,
                &Expr::action("SetMods", vec![Expr::assign("bogus", Expr::Integer(1))]),
            )
            .is_none());
        assert!(!actions.set_action_field(
            &mut ctx,
            &keymap,
            None,
            "frobnicate",
            None,
            &Expr::Integer(1)
        ));
    }

    #[test]
    fn action_type_names() {
        assert_eq!(ActionType::lookup("nOaCtIoN"), Some(ActionType::None));
        assert_eq!(ActionType::LockGroup.to_string(), "LockGroup");
        assert_eq!(ActionType::Terminate.to_string(), "Terminate");
    }
}
