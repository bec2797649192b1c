//! Parser boundary.
//!
//! The concrete grammar of the extended-markdown dialect lives outside this
//! crate. The core consumes any parser behind [`DocumentParser`]; the
//! [`crate::markdown`] module provides a standard-markdown implementation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::DocumentRoot;

/// The only error kind raised by the core, carrying the parser's message.
///
/// Parsers must not fail on syntactically incomplete but lexically
/// well-formed input (a truncated prefix of a valid document); they return a
/// best-effort tree instead. Failure is reserved for input the parser cannot
/// recover from at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    /// One-line human-readable description from the parser.
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ParseError {}

/// A document parser supplied by the host.
pub trait DocumentParser: Send + Sync {
    /// Parses `text` into a document tree.
    ///
    /// `text` may be any truncated prefix of a well-formed document,
    /// including mid-token cuts; such input must produce a best-effort tree,
    /// never an error.
    fn parse(&self, text: &str) -> Result<DocumentRoot, ParseError>;
}
