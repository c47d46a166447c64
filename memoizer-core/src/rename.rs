//! Renaming of the original implementation
//!
//! The original definition stays where it is and keeps its body byte-for-byte;
//! only the text from the declaration start through the end of the name is
//! replaced, so that the definition now introduces the mangled name.

use crate::descriptor::FunctionDescriptor;
use crate::edit::TextEdit;
use crate::error::RewriteError;
use crate::symbols::SymbolTable;

/// Suffix appended to the original name. Not configurable.
pub const MANGLE_SUFFIX: &str = "__original__";

/// Name the original implementation is renamed to
pub fn mangled_name(name: &str) -> String {
    format!("{}{}", name, MANGLE_SUFFIX)
}

/// Plans renames against the symbols of one unit
pub struct IdentifierRenamer<'a> {
    symbols: &'a SymbolTable,
}

/// A planned rename: the new name and the edit that introduces it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub mangled_name: String,
    pub edit: TextEdit,
}

impl<'a> IdentifierRenamer<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        IdentifierRenamer { symbols }
    }

    /// Plan the `Replace` of `declaration_start..name_end`
    ///
    /// Fails with `NameCollision` if the mangled name is already taken in the
    /// unit, and with `UnresolvableSpan` if the name is not where the
    /// descriptor says it is.
    pub fn plan(&self, descriptor: &FunctionDescriptor, source: &str) -> Result<Rename, RewriteError> {
        descriptor.check_name_span(source)?;

        let mangled = mangled_name(descriptor.name());
        if self.symbols.contains(&mangled) {
            return Err(RewriteError::NameCollision {
                function: descriptor.name().to_string(),
                mangled,
            });
        }

        let text = format!("{} {}", descriptor.return_type(), mangled);
        Ok(Rename {
            edit: TextEdit::replace(descriptor.rename_span(), text),
            mangled_name: mangled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{MatchedFunction, Parameter};
    use crate::language::SourceSpan;

    fn descriptor(source: &str) -> FunctionDescriptor {
        FunctionDescriptor::try_from(MatchedFunction {
            name: "f".to_string(),
            return_type: "static int".to_string(),
            parameters: vec![Parameter::new("x", "int")],
            declaration_start: 0,
            name_end: 12,
            body: Some(SourceSpan::new(20, source.len())),
            line: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_mangled_name() {
        assert_eq!(mangled_name("fact"), "fact__original__");
    }

    #[test]
    fn test_plan_rename() {
        let source = "static int f(int x) { return x; }";
        let symbols = SymbolTable::scan(source);
        let rename = IdentifierRenamer::new(&symbols)
            .plan(&descriptor(source), source)
            .unwrap();

        assert_eq!(rename.mangled_name, "f__original__");
        assert_eq!(
            rename.edit,
            TextEdit::replace(SourceSpan::new(0, 12), "static int f__original__")
        );
    }

    #[test]
    fn test_collision_detected() {
        let source = "static int f(int x) { return x; }";
        let mut symbols = SymbolTable::scan(source);
        symbols.insert("f__original__");

        let err = IdentifierRenamer::new(&symbols)
            .plan(&descriptor(source), source)
            .unwrap_err();
        assert_eq!(
            err,
            RewriteError::NameCollision {
                function: "f".to_string(),
                mangled: "f__original__".to_string(),
            }
        );
    }
}
