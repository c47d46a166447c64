//! Per-function rewrite plans
//!
//! A plan is computed fresh from one descriptor and holds everything needed to
//! rewrite that function: the new texts and the three edits that place them.

use crate::descriptor::FunctionDescriptor;
use crate::edit::TextEdit;
use crate::error::RewriteError;
use crate::language::SourceSpan;
use crate::prototype::prototype_for;
use crate::rename::IdentifierRenamer;
use crate::symbols::SymbolTable;
use crate::wrapper::WrapperSynthesizer;

/// Separates the original definition from the appended wrapper
const WRAPPER_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewritePlan {
    pub function: String,
    pub line: u32,
    pub mangled_name: String,
    pub prototype_text: String,
    pub wrapper_text: String,
    /// `Replace` of declaration start..name end with the mangled declaration
    pub rename: TextEdit,
    /// `InsertAfter` the definition end: blank line plus wrapper
    pub wrapper_insertion: TextEdit,
    /// `InsertBefore` the declaration start: `prototype;` plus newline
    pub forward_declaration: TextEdit,
    /// Region of the original buffer this plan touches
    pub footprint: SourceSpan,
}

impl RewritePlan {
    /// The three edits, in application order: rename, wrapper, forward declaration
    pub fn edits(&self) -> [&TextEdit; 3] {
        [&self.rename, &self.wrapper_insertion, &self.forward_declaration]
    }
}

/// Computes plans for the functions of one unit
pub struct RewritePlanner<'a> {
    source: &'a str,
    renamer: IdentifierRenamer<'a>,
    synthesizer: &'a WrapperSynthesizer,
}

impl<'a> RewritePlanner<'a> {
    pub fn new(source: &'a str, symbols: &'a SymbolTable, synthesizer: &'a WrapperSynthesizer) -> Self {
        RewritePlanner {
            source,
            renamer: IdentifierRenamer::new(symbols),
            synthesizer,
        }
    }

    pub fn plan(&self, descriptor: &FunctionDescriptor) -> Result<RewritePlan, RewriteError> {
        descriptor.check_body_span(self.source)?;
        if let Some(parameter) = self.synthesizer.shadowed_parameter(descriptor.parameters()) {
            return Err(RewriteError::unsupported(
                descriptor.name(),
                format!(
                    "parameter `{}` would be shadowed inside the wrapper calling `{}`",
                    parameter.name,
                    self.synthesizer.adapter()
                ),
            ));
        }

        let prototype = prototype_for(descriptor, self.source)?;
        let rename = self.renamer.plan(descriptor, self.source)?;
        let wrapper = self
            .synthesizer
            .synthesize(&prototype, &rename.mangled_name, descriptor.parameters());

        let wrapper_insertion = TextEdit::insert_after(
            descriptor.definition_end(),
            format!("{}{}", WRAPPER_SEPARATOR, wrapper),
        );
        let forward_declaration =
            TextEdit::insert_before(descriptor.declaration_start(), format!("{};\n", prototype));

        Ok(RewritePlan {
            function: descriptor.name().to_string(),
            line: descriptor.line(),
            mangled_name: rename.mangled_name,
            prototype_text: prototype,
            wrapper_text: wrapper,
            rename: rename.edit,
            wrapper_insertion,
            forward_declaration,
            footprint: descriptor.footprint(),
        })
    }
}
