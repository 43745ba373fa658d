//! The outcome of validating one transaction.

use crate::error::{ErrorKind, ValidationError};
use std::fmt;
use voc_core::EntryId;

/// Why a transaction was rejected, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub error: ValidationError,
    /// The entry the failing check was about, when there is one.
    pub entry: Option<EntryId>,
}

impl Rejection {
    pub fn new(error: ValidationError, entry: Option<EntryId>) -> Self {
        Self { error, entry }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entry {
            Some(entry) => write!(f, "{} (entry {})", self.error, entry),
            None => write!(f, "{}", self.error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid { gas_used: u64, entries_visited: u64 },
    Invalid(Rejection),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid { .. })
    }

    /// Total gas charged, for valid transactions.
    pub fn gas_used(&self) -> Option<u64> {
        match self {
            Verdict::Valid { gas_used, .. } => Some(*gas_used),
            Verdict::Invalid(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Verdict::Valid { .. } => None,
            Verdict::Invalid(rejection) => Some(rejection),
        }
    }

    /// The error kind of a rejection.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.rejection().map(Rejection::kind)
    }

    /// The stable error code of a rejection.
    pub fn code(&self) -> Option<u16> {
        self.kind().map(ErrorKind::code)
    }

    pub fn message(&self) -> String {
        match self {
            Verdict::Valid { .. } => "valid".to_string(),
            Verdict::Invalid(rejection) => rejection.error.to_string(),
        }
    }

    /// The offending entry of a rejection.
    pub fn entry(&self) -> Option<EntryId> {
        self.rejection().and_then(|r| r.entry)
    }
}

impl From<Rejection> for Verdict {
    fn from(rejection: Rejection) -> Self {
        Verdict::Invalid(rejection)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Valid {
                gas_used,
                entries_visited,
            } => write!(f, "valid (gas used {gas_used}, {entries_visited} entries)"),
            Verdict::Invalid(rejection) => {
                write!(f, "invalid [{}] {}", rejection.kind().code(), rejection)
            }
        }
    }
}
