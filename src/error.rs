use std::fmt::{self, Display};

use crate::model::Position;

/// Broad classification of a formatting failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A malformed token: bad keyword, escape, or number grammar, an
    /// unterminated string or block comment, a control character inside a
    /// string, or an unrecognized character.
    Lex,
    /// A token-level grammar violation: bracket or colon mismatch, a
    /// disallowed trailing comma or comment, or content after the root
    /// value.
    Structural,
    /// A position counter exceeded the supported document size.
    Overflow,
}

/// The error value returned by every fallible operation in this crate.
///
/// Carries the failure classification, a human-readable message, and the
/// zero-based position of the offending character or token when one is
/// known. The position is also baked into the message in the form
/// `"<description> at idx=<I>, row=<R>, col=<C>"`.
#[derive(Debug, Clone)]
pub struct FoldError {
    pub kind: ErrorKind,
    pub message: String,
    pub position: Option<Position>,
}

impl FoldError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, position: Option<Position>) -> Self {
        let message = message.into();
        let message = match position {
            Some(p) => format!("{} at {}", message, p),
            None => message,
        };
        Self { kind, message, position }
    }

    pub(crate) fn lex(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::Lex, message, Some(position))
    }

    pub(crate) fn structural(message: impl Into<String>, position: Option<Position>) -> Self {
        Self::new(ErrorKind::Structural, message, position)
    }

    pub(crate) fn overflow(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::Overflow, message, Some(position))
    }
}

impl Display for FoldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FoldError {}
