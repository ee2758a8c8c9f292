use std::fmt;

use watcher_core::MalformedRecordError;

/// Failure while fetching or normalizing a queue listing. The whole cycle
/// aborts on any of these; the caller must leave the snapshot untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    AuthExpired,
    Timeout,
    Network,
    Parse,
    MalformedRecord,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::AuthExpired => write!(f, "authentication expired"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Parse => write!(f, "unparseable listing"),
            FailureKind::MalformedRecord => write!(f, "malformed record"),
        }
    }
}

impl From<MalformedRecordError> for FetchError {
    fn from(err: MalformedRecordError) -> Self {
        FetchError::new(FailureKind::MalformedRecord, err.to_string())
    }
}
