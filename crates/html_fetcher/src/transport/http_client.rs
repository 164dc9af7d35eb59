use std::io::{self, Read};

use fetch_logging::fetch_debug;
use reqwest::blocking::Client;
use url::Url;

use super::{split_lines, Transport, TransportError};
use crate::{FetchSettings, HeaderMap};

/// `reqwest` backed transport. Redirects are surfaced to the caller, never followed.
///
/// The blocking client owns a private runtime, so this must not be built or
/// dropped from inside an async context.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    settings: FetchSettings,
}

impl ReqwestTransport {
    pub fn new(settings: FetchSettings) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| TransportError::Client(err.to_string()))?;
        Ok(Self { client, settings })
    }

    fn map_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            return TransportError::Timeout(self.settings.request_timeout);
        }
        TransportError::Request(err.to_string())
    }

    fn map_read_error(&self, err: io::Error) -> TransportError {
        if err.kind() == io::ErrorKind::TimedOut {
            return TransportError::Timeout(self.settings.request_timeout);
        }
        TransportError::Io(err)
    }
}

impl Transport for ReqwestTransport {
    fn fetch_url(&self, url: &Url) -> Result<HeaderMap, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|err| self.map_error(err))?;

        let status = response.status();
        let mut headers = HeaderMap::with_status_line(format!(
            "{:?} {} {}",
            response.version(),
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        ));
        for (name, value) in response.headers() {
            headers.insert(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }

        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(TransportError::TooLarge {
                    max_bytes,
                    actual: Some(content_len),
                });
            }
        }

        // Bodies without a declared length are only read up to one byte past the cap.
        let mut body = Vec::new();
        response
            .take(max_bytes.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|err| self.map_read_error(err))?;
        if body.len() as u64 > max_bytes {
            return Err(TransportError::TooLarge {
                max_bytes,
                actual: None,
            });
        }

        let content = split_lines(&body);
        fetch_debug!(
            "{url}: {:?} with {} body lines",
            headers.status_line().unwrap_or_default(),
            content.len()
        );
        headers.set_content(content);
        Ok(headers)
    }
}
