//! Position-tagged text edits and their application
//!
//! Global invariants enforced:
//! - Every offset refers to the original, unmodified buffer
//! - A batch is validated as a whole before anything is applied
//! - The result does not depend on the order edits are supplied in
//!
//! Edits are sorted by position and applied back-to-front, so applying one
//! edit never moves a position another pending edit refers to.

use crate::language::SourceSpan;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextEdit {
    /// Replace the bytes of `span` with `text`
    Replace { span: SourceSpan, text: String },
    /// Insert `text` at `offset`, in front of anything else inserted there
    InsertBefore { offset: usize, text: String },
    /// Insert `text` at `offset`, directly after the preceding source text
    InsertAfter { offset: usize, text: String },
}

impl TextEdit {
    pub fn replace(span: SourceSpan, text: impl Into<String>) -> Self {
        TextEdit::Replace {
            span,
            text: text.into(),
        }
    }

    pub fn insert_before(offset: usize, text: impl Into<String>) -> Self {
        TextEdit::InsertBefore {
            offset,
            text: text.into(),
        }
    }

    pub fn insert_after(offset: usize, text: impl Into<String>) -> Self {
        TextEdit::InsertAfter {
            offset,
            text: text.into(),
        }
    }

    /// Original-buffer range this edit consumes (empty for insertions)
    pub fn span(&self) -> SourceSpan {
        match self {
            TextEdit::Replace { span, .. } => *span,
            TextEdit::InsertBefore { offset, .. } | TextEdit::InsertAfter { offset, .. } => {
                SourceSpan::new(*offset, *offset)
            }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            TextEdit::Replace { text, .. }
            | TextEdit::InsertBefore { text, .. }
            | TextEdit::InsertAfter { text, .. } => text,
        }
    }

    /// Tie order for edits starting at the same offset
    fn rank(&self) -> u8 {
        match self {
            TextEdit::InsertAfter { .. } => 0,
            TextEdit::InsertBefore { .. } => 1,
            TextEdit::Replace { .. } => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit {span} is outside the {len}-byte source")]
    OutOfBounds { span: SourceSpan, len: usize },

    #[error("edit boundary at byte {offset} splits a UTF-8 character")]
    NotCharBoundary { offset: usize },

    #[error("edit {second} conflicts with edit {first}")]
    Conflict { first: SourceSpan, second: SourceSpan },
}

/// Indices of `edits` in application order (ascending position, stable ties)
fn sorted_order(edits: &[TextEdit]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..edits.len()).collect();
    order.sort_by_key(|&i| (edits[i].span().start, edits[i].rank(), i));
    order
}

/// Check a batch of edits against `source` without applying it
pub fn validate_edits(source: &str, edits: &[TextEdit]) -> Result<(), EditError> {
    for edit in edits {
        let span = edit.span();
        if span.start > span.end || span.end > source.len() {
            return Err(EditError::OutOfBounds {
                span,
                len: source.len(),
            });
        }
        for offset in [span.start, span.end] {
            if !source.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary { offset });
            }
        }
    }

    let mut last_replace: Option<SourceSpan> = None;
    for i in sorted_order(edits) {
        let span = edits[i].span();
        if let Some(previous) = last_replace {
            let conflicts = match &edits[i] {
                TextEdit::Replace { .. } => span.start < previous.end,
                _ => previous.strictly_contains_offset(span.start),
            };
            if conflicts {
                return Err(EditError::Conflict {
                    first: previous,
                    second: span,
                });
            }
        }
        if matches!(edits[i], TextEdit::Replace { .. }) {
            last_replace = Some(span);
        }
    }

    Ok(())
}

/// Apply a batch of edits to `source`, returning the patched text
pub fn apply_edits(source: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    validate_edits(source, edits)?;

    let growth: usize = edits.iter().map(|e| e.text().len()).sum();
    let mut patched = String::with_capacity(source.len() + growth);
    patched.push_str(source);

    for i in sorted_order(edits).into_iter().rev() {
        match &edits[i] {
            TextEdit::Replace { span, text } => patched.replace_range(span.start..span.end, text),
            TextEdit::InsertBefore { offset, text } | TextEdit::InsertAfter { offset, text } => {
                patched.insert_str(*offset, text)
            }
        }
    }

    Ok(patched)
}
