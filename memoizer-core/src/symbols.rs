//! Identifiers visible in one translation unit
//!
//! Used to verify that a mangled name is unused before a rename is committed.

use regex::Regex;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    names: BTreeSet<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conservative table built from every identifier-shaped token in `source`
    ///
    /// Identifiers inside comments and string literals are included, so a
    /// collision may be reported where a parser would see none, but never the
    /// other way around.
    pub fn scan(source: &str) -> Self {
        static IDENT_RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
        let ident_re = IDENT_RE.get_or_init(|| {
            Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\b").expect("identifier pattern is valid")
        });

        ident_re
            .find_iter(source)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

impl Extend<String> for SymbolTable {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.names.extend(iter);
    }
}

impl IntoIterator for SymbolTable {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

impl FromIterator<String> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        SymbolTable {
            names: iter.into_iter().collect(),
        }
    }
}
