//! Structured view of one tagged function
//!
//! The front end produces a [`MatchedFunction`] for every tagged declaration it
//! finds. Conversion into a [`FunctionDescriptor`] validates the record; only
//! descriptors reach the planning stage.
//!
//! Global invariants enforced:
//! - A descriptor always has a body, and the body starts after the declaration
//! - `declaration_start <= name_end <= body.start`
//! - Parameter order is call-site order and is never changed

use crate::error::RewriteError;
use crate::language::SourceSpan;
use serde::{Deserialize, Serialize};

/// Specifiers under which a function-local `static` is ill-formed
const COMPILE_TIME_SPECIFIERS: &[&str] = &["constexpr", "consteval"];

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_text: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_text: impl Into<String>) -> Self {
        Parameter {
            name: name.into(),
            type_text: type_text.into(),
        }
    }
}

/// Raw front-end record for a tagged function, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedFunction {
    pub name: String,
    /// Everything between the declaration start and the name, trimmed
    pub return_type: String,
    pub parameters: Vec<Parameter>,
    /// Byte offset where the rewritable declaration begins (after attributes)
    pub declaration_start: usize,
    /// Byte offset one past the last byte of the function name
    pub name_end: usize,
    /// The `{ ... }` body, `None` for a declaration
    pub body: Option<SourceSpan>,
    /// 1-indexed line of the declaration, for diagnostics
    pub line: u32,
}

/// Validated, immutable description of one function definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    name: String,
    return_type: String,
    parameters: Vec<Parameter>,
    declaration_start: usize,
    name_end: usize,
    body: SourceSpan,
    line: u32,
}

impl TryFrom<MatchedFunction> for FunctionDescriptor {
    type Error = RewriteError;

    fn try_from(matched: MatchedFunction) -> Result<Self, Self::Error> {
        let name = matched.name;

        let Some(body) = matched.body else {
            return Err(RewriteError::MissingBody { function: name });
        };

        if !is_identifier(&name) {
            return Err(RewriteError::unsupported(
                &name,
                "only plain identifiers can be renamed",
            ));
        }

        if body.start <= matched.declaration_start {
            return Err(RewriteError::unresolvable(
                &name,
                format!(
                    "body starts at byte {} but the declaration starts at byte {}",
                    body.start, matched.declaration_start
                ),
            ));
        }
        if matched.name_end < matched.declaration_start || matched.name_end > body.start {
            return Err(RewriteError::unresolvable(
                &name,
                format!(
                    "name ends at byte {}, outside the declaration {}..{}",
                    matched.name_end, matched.declaration_start, body.start
                ),
            ));
        }
        if body.end <= body.start {
            return Err(RewriteError::unresolvable(&name, "body span is empty"));
        }

        if matched.return_type.trim().is_empty() {
            return Err(RewriteError::unsupported(&name, "no return type"));
        }
        if let Some(specifier) = specifier_tokens(&matched.return_type)
            .find(|token| COMPILE_TIME_SPECIFIERS.contains(token))
        {
            return Err(RewriteError::unsupported(
                &name,
                format!("a `{}` function cannot hold the static proxy", specifier),
            ));
        }

        for (index, parameter) in matched.parameters.iter().enumerate() {
            if !is_identifier(&parameter.name) {
                return Err(RewriteError::unsupported(
                    &name,
                    format!("parameter {} has no usable name", index + 1),
                ));
            }
        }

        Ok(FunctionDescriptor {
            name,
            return_type: matched.return_type.trim().to_string(),
            parameters: matched.parameters,
            declaration_start: matched.declaration_start,
            name_end: matched.name_end,
            body,
            line: matched.line,
        })
    }
}

impl FunctionDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn declaration_start(&self) -> usize {
        self.declaration_start
    }

    pub fn name_end(&self) -> usize {
        self.name_end
    }

    pub fn body(&self) -> SourceSpan {
        self.body
    }

    /// End of the whole definition (one past the closing brace)
    pub fn definition_end(&self) -> usize {
        self.body.end
    }

    /// Span replaced by the rename: declaration start through the end of the name
    pub fn rename_span(&self) -> SourceSpan {
        SourceSpan::new(self.declaration_start, self.name_end)
    }

    /// Span between the end of the name and the start of the body
    pub fn parameter_list_span(&self) -> SourceSpan {
        SourceSpan::new(self.name_end, self.body.start)
    }

    /// Region of the buffer the rewrite of this function touches
    pub fn footprint(&self) -> SourceSpan {
        SourceSpan::new(self.declaration_start, self.body.end)
    }

    /// Verify that the definition lies inside `source` and the body is a `{ ... }` block
    ///
    /// The wrapper is inserted at the body's end and the forward declaration at
    /// the declaration start, so both offsets must be valid positions in the
    /// buffer.
    pub fn check_body_span(&self, source: &str) -> Result<(), RewriteError> {
        let footprint = self.footprint();
        if footprint.slice(source).is_none() {
            return Err(RewriteError::unresolvable(
                &self.name,
                format!(
                    "definition {} is outside the {}-byte source or splits a character",
                    footprint,
                    source.len()
                ),
            ));
        }

        let body = self.body.slice(source).ok_or_else(|| {
            RewriteError::unresolvable(
                &self.name,
                format!("body {} splits a character", self.body),
            )
        })?;
        if !body.starts_with('{') || !body.ends_with('}') {
            return Err(RewriteError::unresolvable(
                &self.name,
                format!("body {} is not enclosed in braces", self.body),
            ));
        }

        Ok(())
    }

    /// Verify that the name really ends at `name_end` in `source`
    ///
    /// A mismatch means the token boundaries were displaced (for example by a
    /// macro) and the rename would clobber unrelated text.
    pub fn check_name_span(&self, source: &str) -> Result<(), RewriteError> {
        let start = self.name_end.checked_sub(self.name.len());
        let found = start
            .filter(|s| *s >= self.declaration_start)
            .and_then(|s| SourceSpan::new(s, self.name_end).slice(source));
        match found {
            Some(text) if text == self.name => Ok(()),
            Some(text) => Err(RewriteError::unresolvable(
                &self.name,
                format!("expected the name before byte {}, found `{}`", self.name_end, text),
            )),
            None => Err(RewriteError::unresolvable(
                &self.name,
                format!("name span ending at byte {} is outside the source", self.name_end),
            )),
        }
    }

    /// Verbatim parameter-list text, sliced from the original buffer
    ///
    /// Only whitespace directly in front of the body is trimmed; default
    /// arguments, attributes and comments are preserved byte-for-byte.
    pub fn parameter_list_text<'a>(&self, source: &'a str) -> Result<&'a str, RewriteError> {
        let span = self.parameter_list_span();
        let raw = span.slice(source).ok_or_else(|| {
            RewriteError::unresolvable(
                &self.name,
                format!(
                    "parameter list {}..{} is outside the source or splits a character",
                    span.start, span.end
                ),
            )
        })?;
        let text = raw.trim_end();

        if !text.trim_start().starts_with('(') {
            return Err(RewriteError::unresolvable(
                &self.name,
                "parameter list does not start with `(`",
            ));
        }
        if closing_paren(text).is_none() {
            return Err(RewriteError::unresolvable(
                &self.name,
                "parameter list has no matching `)`",
            ));
        }

        Ok(text)
    }
}

/// Byte offset of the `)` matching the first `(` in `text`
///
/// String and character literals and comments are skipped. A `'` directly
/// after an alphanumeric character is a digit separator, not a literal.
pub(crate) fn closing_paren(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'"' => i = skip_literal(bytes, i, b'"')?,
            b'\'' if i == 0 || !bytes[i - 1].is_ascii_alphanumeric() => {
                i = skip_literal(bytes, i, b'\'')?
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = bytes[i..]
                    .iter()
                    .position(|b| *b == b'\n')
                    .map_or(bytes.len(), |p| i + p);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let rest = &text[i + 2..];
                i = i + 2 + rest.find("*/")? + 1;
            }
            _ => {}
        }
        i += 1;
    }

    None
}

/// Index of the closing quote of the literal opened at `open`
fn skip_literal(bytes: &[u8], open: usize, quote: u8) -> Option<usize> {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i),
            b'\n' => return None,
            _ => i += 1,
        }
    }
    None
}

/// Identifier-shaped tokens of a declaration-specifier sequence
fn specifier_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c != '_' && !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
}

pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
