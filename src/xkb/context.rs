//! Compile context shared by every stage.
//!
//! The context owns the atom table and the diagnostic sink. It is passed
//! explicitly (`&mut Context`) to anything that interns names or reports problems;
//! there is no global state.

use super::atom::{Atom, AtomTable};
use super::config::Config;
use super::diagnostics::{Diagnostic, Severity};

#[derive(Debug, Default)]
pub struct Context {
    atoms: AtomTable,
    verbosity: i32,
    diagnostics: Vec<Diagnostic>,
    next_file_id: u32,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbosity(verbosity: i32) -> Self {
        Self {
            verbosity,
            ..Self::default()
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_verbosity(config.log.verbosity)
    }

    pub fn verbosity(&self) -> i32 {
        self.verbosity
    }

    pub fn intern(&mut self, text: &str) -> Atom {
        self.atoms.intern(text)
    }

    pub fn lookup_atom(&self, text: &str) -> Option<Atom> {
        self.atoms.lookup(text)
    }

    pub fn atom_text(&self, atom: Atom) -> &str {
        self.atoms.text(atom)
    }

    /// Hand out a fresh identifier for a loaded file.
    pub fn next_file_id(&mut self) -> u32 {
        self.next_file_id += 1;
        self.next_file_id
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => tracing::error!(target: "xkbsym", "{}", diagnostic.message),
            Severity::Warning => tracing::warn!(target: "xkbsym", "{}", diagnostic.message),
            Severity::Info => tracing::info!(target: "xkbsym", "{}", diagnostic.message),
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.emit(Diagnostic::new(Severity::Error, message));
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.emit(Diagnostic::new(Severity::Warning, message));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.emit(Diagnostic::new(Severity::Info, message));
    }

    /// Verbosity-gated warning; dropped unless `level <= verbosity`.
    pub fn vrb(&mut self, level: i32, message: impl Into<String>) {
        if level <= self.verbosity {
            self.warn(message);
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// True if any recorded diagnostic contains `needle`. Intended for tests.
    pub fn has_diagnostic(&self, needle: &str) -> bool {
        self.diagnostics.iter().any(|d| d.message.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gated_messages_respect_verbosity() {
        let mut ctx = Context::with_verbosity(3);
        ctx.vrb(5, "hidden");
        ctx.vrb(1, "shown");
        assert_eq!(ctx.diagnostics().len(), 1);
        assert!(ctx.has_diagnostic("shown"));
    }

    #[test]
    fn file_ids_are_unique() {
        let mut ctx = Context::new();
        let a = ctx.next_file_id();
        let b = ctx.next_file_id();
        assert_ne!(a, b);
    }
}
