use std::fmt;

use crate::transport::TransportError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        let kind = match &err {
            TransportError::Timeout(_) => FailureKind::Timeout,
            TransportError::TooLarge { max_bytes, actual } => FailureKind::TooLarge {
                max_bytes: *max_bytes,
                actual: *actual,
            },
            _ => FailureKind::Network,
        };
        FetchError::new(kind, err.to_string())
    }
}

/// Why a fetch produced no HTML.
///
/// The first group are faults (the exchange itself failed); the rest are
/// rejections of a well-formed response, see [`FailureKind::is_rejection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Network,
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    MalformedStatusLine,
    HttpStatus(u16),
    UnsupportedContentType { content_type: Option<String> },
    RedirectLimitExceeded,
    MissingLocation,
}

impl FailureKind {
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            FailureKind::HttpStatus(_)
                | FailureKind::UnsupportedContentType { .. }
                | FailureKind::RedirectLimitExceeded
                | FailureKind::MissingLocation
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::MalformedStatusLine => write!(f, "malformed status line"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::UnsupportedContentType {
                content_type: Some(content_type),
            } => write!(f, "unsupported content type {content_type}"),
            FailureKind::UnsupportedContentType { content_type: None } => {
                write!(f, "missing content type")
            }
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::MissingLocation => write!(f, "redirect without location"),
        }
    }
}
