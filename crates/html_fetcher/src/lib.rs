//! HTML fetcher: follows HTTP/1.1 redirects up to a budget and returns HTML bodies.
mod classify;
mod fetcher;
mod headers;
mod transport;
mod types;

pub use classify::{classify, is_html, is_redirect, status_code, Classification};
pub use fetcher::{fetch_html, fetch_html_with, FetchSettings, FetchedHtml, HtmlFetcher};
pub use headers::{HeaderMap, CONTENT, CONTENT_TYPE, LOCATION, TEXT_HTML};
pub use transport::{
    build_transport, ReqwestTransport, SocketTransport, Transport, TransportError, TransportKind,
};
pub use types::{FailureKind, FetchError};
