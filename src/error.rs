// CLASSIFICATION: COMMUNITY
// Filename: error.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Error taxonomy for compiler sessions.
//!
//! The engine only ever reports a bare status code, so every engine failure
//! carries whatever diagnostic lines the instance emitted through its error
//! callback and nothing more.

use std::fmt;

use thiserror::Error;

use crate::engine::OutputType;

/// Errors raised by [`crate::Session`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("couldn't create new context: {0}")]
    EngineInit(String),
    #[error("attempted to close already deleted context")]
    AlreadyClosed,
    #[error("context is closed")]
    Closed,
    #[error("error {what}{}", Diagnostics(.diagnostics))]
    Compilation {
        what: String,
        diagnostics: Vec<String>,
    },
    #[error("error writing output file {path}{}", Diagnostics(.diagnostics))]
    Output {
        path: String,
        diagnostics: Vec<String>,
    },
    #[error("error relocating compiled code{}", Diagnostics(.0))]
    Relocation(Vec<String>),
    #[error("operation requires {expected} output, context is configured for {actual}")]
    OutputTypeMismatch {
        expected: OutputType,
        actual: OutputType,
    },
    #[error("in-memory output cannot be written to a file")]
    InMemoryOutput,
    #[error("output type already committed as {committed}; cannot switch to {requested}")]
    OutputTypeCommitted {
        committed: OutputType,
        requested: OutputType,
    },
    #[error("compiled code was already relocated")]
    AlreadyRelocated,
    #[error("compiled code has not been relocated")]
    NotRelocated,
    #[error("invalid argument: {0} contains an interior NUL byte")]
    InvalidArgument(&'static str),
}

impl SessionError {
    /// Diagnostic lines captured from the engine, if the error carries any.
    pub fn diagnostics(&self) -> &[String] {
        match self {
            SessionError::Compilation { diagnostics, .. }
            | SessionError::Output { diagnostics, .. }
            | SessionError::Relocation(diagnostics) => diagnostics,
            _ => &[],
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

struct Diagnostics<'a>(&'a [String]);

impl fmt::Display for Diagnostics<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        f.write_str(": ")?;
        f.write_str(&self.0.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compilation_error_lists_diagnostics() {
        let err = SessionError::Compilation {
            what: "compiling string".into(),
            diagnostics: vec![
                "<string>:1: error: declaration expected".into(),
                "<string>:2: warning: implicit declaration".into(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "error compiling string: <string>:1: error: declaration expected; \
             <string>:2: warning: implicit declaration"
        );
        assert_eq!(err.diagnostics().len(), 2);
    }

    #[test]
    fn bare_status_failure_has_no_suffix() {
        let err = SessionError::Compilation {
            what: "adding file to context".into(),
            diagnostics: Vec::new(),
        };
        assert_eq!(err.to_string(), "error adding file to context");
        assert!(SessionError::AlreadyClosed.diagnostics().is_empty());
    }
}
