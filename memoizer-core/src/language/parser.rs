//! Language-agnostic front-end traits

use crate::sequencer::Candidate;
use crate::symbols::SymbolTable;
use anyhow::Result;

/// Front-end parser interface
///
/// A front end turns source text into a [`ParsedUnit`] that can report the
/// tagged functions of the unit. The rewrite core never sees the syntax tree.
pub trait LanguageParser {
    /// Parse source code into a unit
    ///
    /// # Arguments
    ///
    /// * `source` - The source code to parse
    /// * `filename` - The name of the file being parsed (for error messages)
    fn parse(&self, source: &str, filename: &str) -> Result<Box<dyn ParsedUnit>>;
}

/// One parsed translation unit
pub trait ParsedUnit {
    /// Every definition or declaration tagged with `marker`, in source order
    ///
    /// Tagged functions the front end cannot describe are returned as
    /// failures so they are reported instead of silently skipped.
    fn discover_functions(&self, marker: &str) -> Vec<Candidate>;

    /// Identifiers declared or referenced anywhere in the unit
    fn symbols(&self) -> SymbolTable;

    /// Whether the parser had to recover from syntax errors anywhere in the unit
    fn has_syntax_errors(&self) -> bool;
}
