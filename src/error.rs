use thiserror::Error;

use crate::tree::TextRange;

/// Errors that abort the conversion of a file.
///
/// Comments that match no notation and nodes that no comment documents are not errors; those
/// nodes are simply left untouched.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The parser rejected the source text.
    #[error("failed to parse source at {range}: {message}")]
    Parse {
        /// The parser's description of the problem.
        message: String,

        /// Where in the source the parser gave up.
        range: TextRange,
    },

    /// A node or comment range reaches past the end of the document.
    #[error("range {range} lies outside the document (length {len})")]
    RangeOutOfBounds {
        /// The offending range.
        range: TextRange,

        /// The document length in bytes.
        len: usize,
    },

    /// A child node is not contained in its parent.
    #[error("node range {child} is not contained in its parent range {parent}")]
    RangeNotNested {
        /// The range of the child node.
        child: TextRange,

        /// The range of the parent node.
        parent: TextRange,
    },

    /// A range boundary splits a multi-byte character.
    #[error("range {range} does not fall on character boundaries")]
    NotCharBoundary {
        /// The offending range.
        range: TextRange,
    },

    /// Two edits partially overlap, so neither can be nested inside the other.
    #[error("edit at {range} partially overlaps the committed edit at {other}")]
    OverlappingEdit {
        /// The edit being committed.
        range: TextRange,

        /// The committed edit it collides with.
        other: TextRange,
    },
}

impl ConvertError {
    /// Whether the error comes from an inconsistent syntax tree rather than from the parser.
    pub fn is_structural(&self) -> bool {
        !matches!(self, ConvertError::Parse { .. })
    }
}
