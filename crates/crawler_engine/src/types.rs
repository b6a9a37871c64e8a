use std::fmt;

use thiserror::Error;

use crate::persist::PersistError;

pub type JobId = u64;

/// Body of a fetched page. Responses declaring a textual content type are
/// decoded; everything else is kept as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContent {
    Text(String),
    Bytes(Vec<u8>),
}

impl PageContent {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            PageContent::Text(text) => text.as_bytes(),
            PageContent::Bytes(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Connect,
    Disconnected,
    Timeout,
    Decode,
    Cancelled,
    InvalidUrl,
    Other,
}

impl FailureKind {
    /// Transient failures consume a retry attempt; anything else must
    /// propagate unchanged. Keep this set narrow: widening it hides
    /// genuine failures behind the retry loop.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            FailureKind::Connect
                | FailureKind::Disconnected
                | FailureKind::Timeout
                | FailureKind::Decode
                | FailureKind::Cancelled
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Connect => write!(f, "connection failed"),
            FailureKind::Disconnected => write!(f, "peer disconnected"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Decode => write!(f, "text decoding failed"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Other => write!(f, "request error"),
        }
    }
}

/// Failure of a whole crawl tick. The scheduler logs it and waits for the
/// next period; it never terminates the process.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("news listing unavailable: {0}")]
    Listing(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Per-tick report: how many resources this job persisted and every
/// (url, last error) pair accumulated so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    pub job_id: JobId,
    pub downloaded: u64,
    pub errors: Vec<(String, String)>,
}
