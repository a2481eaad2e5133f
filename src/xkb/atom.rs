//! String interning for symbol, type and group names.
//!
//! Names are compared constantly while merging keys, so they are stored once in an
//! [`AtomTable`] owned by the compile [`Context`](crate::xkb::context::Context) and
//! passed around as small [`Atom`] handles.

use std::collections::HashMap;

/// Opaque handle to an interned string. Only meaningful for the table that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(u32);

#[derive(Debug, Default)]
pub struct AtomTable {
    strings: Vec<String>,
    index: HashMap<String, Atom>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `text`, returning the existing handle if it was seen before.
    pub fn intern(&mut self, text: &str) -> Atom {
        if let Some(atom) = self.index.get(text) {
            return *atom;
        }
        let atom = Atom(self.strings.len() as u32);
        self.strings.push(text.to_string());
        self.index.insert(text.to_string(), atom);
        atom
    }

    /// Look up a string without interning it.
    pub fn lookup(&self, text: &str) -> Option<Atom> {
        self.index.get(text).copied()
    }

    pub fn text(&self, atom: Atom) -> &str {
        self.strings
            .get(atom.0 as usize)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
