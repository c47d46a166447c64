//! Source-language front ends
//!
//! The rewrite core works on byte spans and [`crate::descriptor::MatchedFunction`]
//! records only. Everything that understands the syntax of a source language
//! lives below this module.

pub mod cpp;
pub mod parser;
pub mod span;
pub mod tree_sitter_utils;

use std::path::Path;

pub use cpp::CppParser;
pub use parser::{LanguageParser, ParsedUnit};
pub use span::SourceSpan;

/// File extensions (without the dot) treated as C++ sources and headers
pub const CPP_EXTENSIONS: &[&str] = &["cpp", "cc", "cxx", "c++", "hpp", "hh", "hxx", "h", "ipp"];

/// Check whether a file extension belongs to a supported source file
///
/// # Examples
///
/// ```
/// use memoizer_core::language::is_supported_extension;
///
/// assert!(is_supported_extension("cpp"));
/// assert!(is_supported_extension("HPP"));
/// assert!(!is_supported_extension("rs"));
/// ```
pub fn is_supported_extension(ext: &str) -> bool {
    CPP_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
}

/// Check whether a path names a supported source file
pub fn is_supported_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(is_supported_extension)
}
