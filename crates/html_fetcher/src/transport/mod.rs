//! Transports turn a URL into a parsed [`HeaderMap`] for one GET exchange.
use std::fmt;
use std::io;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::{FetchSettings, HeaderMap};

mod http_client;
mod socket;

pub use http_client::ReqwestTransport;
pub use socket::SocketTransport;

/// One GET round trip. Implementations must not follow redirects themselves.
pub trait Transport: Send + Sync {
    fn fetch_url(&self, url: &Url) -> Result<HeaderMap, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn fetch_url(&self, url: &Url) -> Result<HeaderMap, TransportError> {
        (**self).fetch_url(url)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn fetch_url(&self, url: &Url) -> Result<HeaderMap, TransportError> {
        (**self).fetch_url(url)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("unsupported scheme {0:?}")]
    UnsupportedScheme(String),
    #[error("url has no host: {0}")]
    MissingHost(String),
    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("response too large (max {max_bytes}, actual {actual:?})")]
    TooLarge { max_bytes: u64, actual: Option<u64> },
    #[error("http client setup failed: {0}")]
    Client(String),
    #[error("request failed: {0}")]
    Request(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportKind {
    /// Hand-written HTTP/1.1 over a plain TCP socket; `http` only.
    Socket,
    /// `reqwest` blocking client with redirects disabled; handles `https`.
    #[default]
    Reqwest,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Socket => write!(f, "socket"),
            TransportKind::Reqwest => write!(f, "reqwest"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "socket" => Ok(TransportKind::Socket),
            "reqwest" => Ok(TransportKind::Reqwest),
            other => Err(format!(
                "unknown transport {other:?} (expected \"socket\" or \"reqwest\")"
            )),
        }
    }
}

pub fn build_transport(settings: &FetchSettings) -> Result<Box<dyn Transport>, TransportError> {
    Ok(match settings.transport {
        TransportKind::Socket => Box::new(SocketTransport::new(settings.clone())),
        TransportKind::Reqwest => Box::new(ReqwestTransport::new(settings.clone())?),
    })
}

/// Lossy UTF-8 decode, then split on `\n` / `\r\n` without a trailing empty line.
pub(crate) fn split_lines(body: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(body)
        .lines()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{split_lines, TransportKind};

    #[test]
    fn transport_kind_parses_names() {
        assert_eq!("socket".parse(), Ok(TransportKind::Socket));
        assert_eq!(" Reqwest".parse(), Ok(TransportKind::Reqwest));
        assert!("curl".parse::<TransportKind>().is_err());
        assert_eq!(TransportKind::Socket.to_string(), "socket");
    }

    #[test]
    fn split_lines_handles_crlf_and_trailing_newline() {
        assert_eq!(split_lines(b"a\r\nb\n\nc\n"), vec!["a", "b", "", "c"]);
        assert!(split_lines(b"").is_empty());
    }
}
