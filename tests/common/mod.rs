//! Shared builders for the integration tests.
#![allow(dead_code)]

use xkbsym::xkb::ast::{Expr, IncludeStmt, ModMapDef, Statement, SymbolsDef, VarDef};
use xkbsym::xkb::keymap::standard_types;
use xkbsym::{Context, Keymap, MergeMode};

/// A pc105-ish slice of keycodes with the standard key types.
pub fn keymap(ctx: &mut Context) -> Keymap {
    let mut keymap = Keymap::new();
    keymap
        .add_key("ESC", 9)
        .add_key("AE01", 10)
        .add_key("AD01", 24)
        .add_key("AC01", 38)
        .add_key("AC02", 39)
        .add_key("CAPS", 66)
        .add_key("KP1", 87)
        .add_alias("LatQ", "AD01");
    keymap.types = standard_types(ctx);
    keymap
}

pub fn key(name: &str, body: Vec<VarDef>) -> Statement {
    key_with(MergeMode::Default, name, body)
}

pub fn key_with(merge: MergeMode, name: &str, body: Vec<VarDef>) -> Statement {
    Statement::Symbols(SymbolsDef {
        merge,
        key: name.to_string(),
        body,
    })
}

/// `key <NAME> { [ syms... ] };`
pub fn simple_key(name: &str, syms: &[&str]) -> Statement {
    key(name, vec![VarDef::bare(Expr::keysyms(syms))])
}

pub fn include(text: &str) -> Statement {
    Statement::Include(IncludeStmt::parse(MergeMode::Default, text).expect("valid include"))
}

pub fn modmap(modifier: &str, keys: Vec<Expr>) -> Statement {
    Statement::ModMap(ModMapDef {
        merge: MergeMode::Default,
        modifier: modifier.to_string(),
        keys,
    })
}

pub fn group_name(group: i64, name: &str) -> Statement {
    Statement::Var(VarDef::indexed("name", group, Expr::string(name)))
}
