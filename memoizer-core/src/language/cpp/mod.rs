//! C++ language support
//!
//! This module discovers attribute-tagged function definitions in C++ sources
//! using the tree-sitter-cpp parser.

pub mod parser;

pub use parser::CppParser;
