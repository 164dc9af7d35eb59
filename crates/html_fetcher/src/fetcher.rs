use std::time::Duration;

use fetch_logging::{fetch_debug, fetch_error, fetch_info, fetch_warn};
use url::Url;

use crate::classify::{classify, Classification};
use crate::headers::CONTENT;
use crate::transport::{build_transport, Transport, TransportError, TransportKind};
use crate::{FailureKind, FetchError};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
    pub user_agent: String,
    pub transport: TransportKind,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 5 * 1024 * 1024,
            user_agent: concat!("html_fetcher/", env!("CARGO_PKG_VERSION")).to_string(),
            transport: TransportKind::default(),
        }
    }
}

/// HTML body plus where it was finally found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedHtml {
    pub html: String,
    pub final_url: Url,
    pub redirects_followed: u32,
}

/// Stateless redirect-following fetcher over a [`Transport`].
///
/// Each call performs at most `max_redirects + 1` sequential round trips. A
/// redirect cycle is not detected as such; it simply runs out of budget.
pub struct HtmlFetcher<T = Box<dyn Transport>> {
    transport: T,
}

impl HtmlFetcher {
    pub fn from_settings(settings: &FetchSettings) -> Result<Self, TransportError> {
        Ok(Self::new(build_transport(settings)?))
    }
}

impl<T: Transport> HtmlFetcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Follows redirects while budget remains and returns the first HTML body.
    ///
    /// Relative `Location` values are resolved against the URL that produced
    /// them rather than rejected, so a server answering `Location: /next`
    /// is still followed. A target that cannot be resolved ends the chain
    /// with `InvalidUrl`. Every failure carries a [`FailureKind`] describing
    /// where the chain stopped.
    pub fn try_fetch(&self, url: &Url, max_redirects: u32) -> Result<FetchedHtml, FetchError> {
        let mut current = url.clone();
        let mut remaining = max_redirects;
        loop {
            fetch_debug!("requesting {current} ({remaining} redirects left)");
            let headers = self.transport.fetch_url(&current)?;

            match classify(&headers)? {
                Classification::Html => {
                    fetch_debug!(
                        "{current}: joining {} {CONTENT} lines",
                        headers.content().len()
                    );
                    return Ok(FetchedHtml {
                        html: headers.joined_content(),
                        final_url: current,
                        redirects_followed: max_redirects - remaining,
                    });
                }
                Classification::Redirect { location } if remaining > 0 => {
                    let next = current.join(&location).map_err(|err| {
                        FetchError::new(
                            FailureKind::InvalidUrl,
                            format!("redirect target {location:?} from {current}: {err}"),
                        )
                    })?;
                    fetch_info!("following redirect {current} -> {next}");
                    current = next;
                    remaining -= 1;
                }
                Classification::Redirect { location } => {
                    return Err(FetchError::new(
                        FailureKind::RedirectLimitExceeded,
                        format!("{current} redirects to {location} with no budget left"),
                    ));
                }
                Classification::Rejected(kind) => {
                    return Err(FetchError::new(kind, format!("rejected {current}")));
                }
            }
        }
    }

    /// String form of [`HtmlFetcher::try_fetch`]; an unparsable URL is `InvalidUrl`.
    pub fn try_fetch_str(&self, url: &str, max_redirects: u32) -> Result<FetchedHtml, FetchError> {
        let parsed = Url::parse(url).map_err(|err| {
            FetchError::new(FailureKind::InvalidUrl, format!("{url:?}: {err}"))
        })?;
        self.try_fetch(&parsed, max_redirects)
    }

    /// Returns the HTML, or `None` for any failure. The cause is only logged.
    pub fn fetch_url(&self, url: &Url, max_redirects: u32) -> Option<String> {
        collapse(url.as_str(), self.try_fetch(url, max_redirects))
    }

    pub fn fetch(&self, url: &str, max_redirects: u32) -> Option<String> {
        collapse(url, self.try_fetch_str(url, max_redirects))
    }

    /// [`HtmlFetcher::fetch`] without following any redirect.
    pub fn fetch_direct(&self, url: &str) -> Option<String> {
        self.fetch(url, 0)
    }

    pub fn fetch_url_direct(&self, url: &Url) -> Option<String> {
        self.fetch_url(url, 0)
    }
}

/// Fetches with default settings and the default transport.
pub fn fetch_html(url: &str, max_redirects: u32) -> Option<String> {
    fetch_html_with(&FetchSettings::default(), url, max_redirects)
}

pub fn fetch_html_with(settings: &FetchSettings, url: &str, max_redirects: u32) -> Option<String> {
    match HtmlFetcher::from_settings(settings) {
        Ok(fetcher) => fetcher.fetch(url, max_redirects),
        Err(err) => {
            fetch_error!("cannot build {} transport: {err}", settings.transport);
            None
        }
    }
}

fn collapse(url: &str, result: Result<FetchedHtml, FetchError>) -> Option<String> {
    match result {
        Ok(fetched) => Some(fetched.html),
        Err(err) if err.kind.is_rejection() => {
            fetch_info!("no html from {url}: {err}");
            None
        }
        Err(err) => {
            fetch_warn!("fetch of {url} failed: {err}");
            None
        }
    }
}
