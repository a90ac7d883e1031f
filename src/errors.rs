// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::{fmt, io, path::PathBuf};

#[derive(Debug)]
pub enum SeqPropError {
    Io(io::Error),
    Format(String),
    Json(serde_json::Error),
    // Bad directory or missing payload: raised where the value is set or needed.
    Validation(String),
    // Bookkeeping says the file should be there, but it is not.
    FileNotFound(PathBuf),
    DuplicateKey(String),
    UnknownResidue { residue: char, position: usize },
    // An external program could not be started or exited with a failure status.
    Tool(String),
    Connection(String),
}

// These allow conversion to SeqPropError, required for main() to return Result<()> and for '?'
// to work.

impl From<io::Error> for SeqPropError {
    fn from(e: io::Error) -> Self {
        SeqPropError::Io(e)
    }
}

impl From<String> for SeqPropError {
    fn from(s: String) -> Self {
        SeqPropError::Format(s)
    }
}

impl From<serde_json::Error> for SeqPropError {
    fn from(e: serde_json::Error) -> Self {
        SeqPropError::Json(e)
    }
}

impl From<regex::Error> for SeqPropError {
    fn from(e: regex::Error) -> Self {
        SeqPropError::Format(format!("bad pattern: {}", e))
    }
}

impl fmt::Display for SeqPropError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeqPropError::Io(e) => write!(f, "I/O error: {}", e),
            SeqPropError::Format(msg) => write!(f, "Format error: {}", msg),
            SeqPropError::Json(e) => write!(f, "JSON error: {}", e),
            SeqPropError::Validation(msg) => write!(f, "Validation error: {}", msg),
            SeqPropError::FileNotFound(path) => {
                write!(f, "{}: file does not exist", path.display())
            }
            SeqPropError::DuplicateKey(id) => write!(f, "id {} is already present in list", id),
            SeqPropError::UnknownResidue { residue, position } => {
                write!(f, "unknown amino acid '{}' at position {}", residue, position)
            }
            SeqPropError::Tool(msg) => write!(f, "Tool error: {}", msg),
            SeqPropError::Connection(msg) => write!(f, "Connection error: {}", msg),
        }
    }
}

impl std::error::Error for SeqPropError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SeqPropError::Io(e) => Some(e),
            SeqPropError::Json(e) => Some(e),
            _ => None,
        }
    }
}
