//! Per-function rewrite failures
//!
//! Every variant is scoped to one tagged function. A failure removes that
//! function's edits from the unit and nothing else.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error("`{function}` is tagged but has no body; only definitions can be memoized")]
    MissingBody { function: String },

    #[error("cannot resolve the source spans of `{function}`: {reason}")]
    UnresolvableSpan { function: String, reason: String },

    #[error("renaming `{function}` would produce `{mangled}`, which already names a symbol in this unit")]
    NameCollision { function: String, mangled: String },

    #[error("`{function}` is tagged more than once in this unit; overloads cannot share one mangled name")]
    OverloadedName { function: String },

    #[error("`{function}` overlaps the tagged function `{other}`")]
    OverlappingMatch { function: String, other: String },

    #[error("`{function}` has an unsupported signature: {reason}")]
    UnsupportedSignature { function: String, reason: String },
}

impl RewriteError {
    /// Name of the function the failure belongs to
    pub fn function(&self) -> &str {
        match self {
            RewriteError::MissingBody { function }
            | RewriteError::UnresolvableSpan { function, .. }
            | RewriteError::NameCollision { function, .. }
            | RewriteError::OverloadedName { function }
            | RewriteError::OverlappingMatch { function, .. }
            | RewriteError::UnsupportedSignature { function, .. } => function,
        }
    }

    /// Stable identifier used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            RewriteError::MissingBody { .. } => "missing_body",
            RewriteError::UnresolvableSpan { .. } => "unresolvable_span",
            RewriteError::NameCollision { .. } => "name_collision",
            RewriteError::OverloadedName { .. } => "overloaded_name",
            RewriteError::OverlappingMatch { .. } => "overlapping_match",
            RewriteError::UnsupportedSignature { .. } => "unsupported_signature",
        }
    }

    pub(crate) fn unresolvable(function: &str, reason: impl Into<String>) -> Self {
        RewriteError::UnresolvableSpan {
            function: function.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(function: &str, reason: impl Into<String>) -> Self {
        RewriteError::UnsupportedSignature {
            function: function.to_string(),
            reason: reason.into(),
        }
    }
}

/// A tagged function that will not be rewritten, with its location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionFailure {
    /// 1-indexed line of the function's declaration
    pub line: u32,
    pub error: RewriteError,
}

impl FunctionFailure {
    pub fn new(line: u32, error: RewriteError) -> Self {
        FunctionFailure { line, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_and_kind() {
        let err = RewriteError::NameCollision {
            function: "fib".to_string(),
            mangled: "fib__original__".to_string(),
        };
        assert_eq!(err.function(), "fib");
        assert_eq!(err.kind(), "name_collision");
        assert!(err.to_string().contains("fib__original__"));
    }

    #[test]
    fn test_constructors() {
        let err = RewriteError::unresolvable("f", "no opening parenthesis");
        assert_eq!(err.kind(), "unresolvable_span");
        assert_eq!(
            err.to_string(),
            "cannot resolve the source spans of `f`: no opening parenthesis"
        );

        let err = RewriteError::unsupported("S::f", "qualified name");
        assert_eq!(err.function(), "S::f");
        assert_eq!(err.kind(), "unsupported_signature");
    }
}
