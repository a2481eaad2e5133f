//! Transient per-file state of the symbols compiler.
//!
//! A [`SymbolsInfo`] accumulates one file's statements (and everything its includes
//! pull in). It is either folded into a parent unit or, at the top level, frozen onto
//! the keymap; it never outlives the compile.

use crate::xkb::ast::MergeMode;
use crate::xkb::atom::Atom;
use crate::xkb::keymap::{KeyName, Level, RangeExceed};
use crate::xkb::keysym::Keysym;

/// Cumulative error count past which the rest of a file is abandoned.
pub const MAX_ERRORS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyRepeat {
    #[default]
    Undefined,
    Yes,
    No,
}

/// Which parts of a group have been given content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupFields {
    pub symbols: bool,
    pub actions: bool,
    pub key_type: bool,
}

impl GroupFields {
    pub fn any(self) -> bool {
        self.symbols || self.actions || self.key_type
    }

    pub fn union(self, other: GroupFields) -> GroupFields {
        GroupFields {
            symbols: self.symbols || other.symbols,
            actions: self.actions || other.actions,
            key_type: self.key_type || other.key_type,
        }
    }
}

/// Which scalar key fields have been set explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyFields {
    pub repeat: bool,
    pub default_type: bool,
    pub group_info: bool,
    pub vmodmap: bool,
}

impl KeyFields {
    pub fn any(self) -> bool {
        self.repeat || self.default_type || self.group_info || self.vmodmap
    }

    /// Field names that are set, for diagnostics.
    pub fn names(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.vmodmap {
            names.push("virtual modifiers");
        }
        if self.repeat {
            names.push("repeat");
        }
        if self.default_type {
            names.push("type");
        }
        if self.group_info {
            names.push("groups behavior");
        }
        names
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupInfo {
    pub defined: GroupFields,
    pub type_name: Option<Atom>,
    pub levels: Vec<Level>,
}

/// A key's pending symbol definition.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyInfo {
    pub defined: KeyFields,
    pub file_id: u32,
    pub merge: MergeMode,
    pub name: KeyName,
    pub groups: Vec<GroupInfo>,
    pub repeat: KeyRepeat,
    pub vmodmap: u32,
    pub default_type: Option<Atom>,
    pub out_of_range: RangeExceed,
}

impl KeyInfo {
    pub fn new(file_id: u32) -> Self {
        Self {
            defined: KeyFields::default(),
            file_id,
            merge: MergeMode::Override,
            name: KeyName::new("*"),
            groups: Vec::new(),
            repeat: KeyRepeat::Undefined,
            vmodmap: 0,
            default_type: None,
            out_of_range: RangeExceed::Wrap,
        }
    }
}

/// What a modifier map entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModMapTarget {
    Key(KeyName),
    Keysym(Keysym),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModMapEntry {
    pub merge: MergeMode,
    pub target: ModMapTarget,
    pub modifier: u32,
}

/// One file's (or include chain's) accumulated symbols.
#[derive(Debug, Clone)]
pub struct SymbolsInfo {
    pub name: Option<String>,
    pub error_count: usize,
    pub file_id: u32,
    pub merge: MergeMode,
    /// Zero-based group every key of this unit is forced into.
    pub explicit_group: Option<usize>,
    pub keys: Vec<KeyInfo>,
    /// Template every key statement starts from.
    pub dflt: KeyInfo,
    pub group_names: Vec<Option<Atom>>,
    pub modmaps: Vec<ModMapEntry>,
}

impl SymbolsInfo {
    pub fn new(file_id: u32) -> Self {
        Self {
            name: None,
            error_count: 0,
            file_id,
            merge: MergeMode::Override,
            explicit_group: None,
            keys: Vec::new(),
            dflt: KeyInfo::new(file_id),
            group_names: Vec::new(),
            modmaps: Vec::new(),
        }
    }

    /// Name used in messages.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(unnamed)")
    }
}
