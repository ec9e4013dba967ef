use thiserror::Error;

use crate::span::SourceRange;

/// Malformed-AST conditions: fatal for the file being lowered, while other
/// files continue. Recognized-but-unsupported constructs never reach here;
/// they lower to `Pass` instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LowerError {
    #[error("assignment target must be a name, attribute, subscript, or tuple of those")]
    InvalidAssignTarget { range: Option<SourceRange> },
    #[error("augmented assignment target must be a name, attribute, or subscript")]
    InvalidAugAssignTarget { range: Option<SourceRange> },
    #[error("for-loop target must be a name, attribute, subscript, or tuple of those")]
    InvalidLoopTarget { range: Option<SourceRange> },
}

impl LowerError {
    /// Position of the offending node, when the parser provided one.
    pub fn range(&self) -> Option<SourceRange> {
        match self {
            LowerError::InvalidAssignTarget { range }
            | LowerError::InvalidAugAssignTarget { range }
            | LowerError::InvalidLoopTarget { range } => *range,
        }
    }
}
