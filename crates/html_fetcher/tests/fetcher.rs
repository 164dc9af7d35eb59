use std::collections::HashMap;
use std::io;
use std::sync::Mutex;

use html_fetcher::{FailureKind, HeaderMap, HtmlFetcher, Transport, TransportError};
use pretty_assertions::assert_eq;
use url::Url;

const A: &str = "http://a.test/start";
const B: &str = "http://b.test/doc";

enum Reply {
    Headers(HeaderMap),
    Refused,
}

#[derive(Default)]
struct ScriptedTransport {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn reply(mut self, url: &str, headers: HeaderMap) -> Self {
        self.replies.insert(url.to_string(), Reply::Headers(headers));
        self
    }

    fn refuse(mut self, url: &str) -> Self {
        self.replies.insert(url.to_string(), Reply::Refused);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn fetch_url(&self, url: &Url) -> Result<HeaderMap, TransportError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.replies.get(url.as_str()) {
            Some(Reply::Headers(headers)) => Ok(headers.clone()),
            Some(Reply::Refused) | None => Err(TransportError::Connect(io::Error::from(
                io::ErrorKind::ConnectionRefused,
            ))),
        }
    }
}

fn init_logging() {
    fetch_logging::initialize_for_tests();
}

fn html(lines: &[&str]) -> HeaderMap {
    HeaderMap::with_status_line("HTTP/1.1 200 OK")
        .header("Content-Type", "text/html")
        .content_lines(lines.iter().copied())
}

fn redirect(code: u16, location: &str) -> HeaderMap {
    HeaderMap::with_status_line(format!("HTTP/1.1 {code} Redirect")).header("Location", location)
}

#[test]
fn html_body_is_joined_with_newlines() {
    init_logging();
    let fetcher = HtmlFetcher::new(ScriptedTransport::default().reply(A, html(&["<html>", "<body>"])));
    assert_eq!(fetcher.fetch(A, 0), Some("<html>\n<body>".to_string()));
}

#[test]
fn redirect_is_followed_within_budget() {
    init_logging();
    let transport = ScriptedTransport::default()
        .reply(A, redirect(302, B))
        .reply(B, html(&["OK"]));
    let fetcher = HtmlFetcher::new(transport);

    assert_eq!(fetcher.fetch(A, 1), Some("OK".to_string()));

    let fetched = fetcher.try_fetch_str(A, 5).unwrap();
    assert_eq!(fetched.final_url.as_str(), B);
    assert_eq!(fetched.redirects_followed, 1);
}

#[test]
fn zero_budget_rejects_redirect_without_following() {
    init_logging();
    let transport = ScriptedTransport::default()
        .reply(A, redirect(302, B))
        .reply(B, html(&["OK"]));
    let fetcher = HtmlFetcher::new(transport);

    assert_eq!(fetcher.fetch(A, 0), None);
    assert_eq!(fetcher.fetch_direct(A), None);
    let err = fetcher.try_fetch_str(A, 0).unwrap_err();
    assert_eq!(err.kind, FailureKind::RedirectLimitExceeded);
    assert!(fetcher.transport().calls().iter().all(|url| url == A));
}

#[test]
fn redirect_cycle_exhausts_budget() {
    init_logging();
    let transport = ScriptedTransport::default()
        .reply(A, redirect(301, B))
        .reply(B, redirect(302, A));
    let fetcher = HtmlFetcher::new(transport);

    assert_eq!(fetcher.fetch(A, 3), None);
    assert_eq!(fetcher.transport().calls(), vec![A, B, A, B]);
}

#[test]
fn transport_failure_returns_none() {
    init_logging();
    let fetcher = HtmlFetcher::new(ScriptedTransport::default().refuse(A));
    assert_eq!(fetcher.fetch(A, 3), None);
    let err = fetcher.try_fetch_str(A, 3).unwrap_err();
    assert_eq!(err.kind, FailureKind::Network);
}

#[test]
fn failure_after_redirect_returns_none() {
    init_logging();
    let transport = ScriptedTransport::default()
        .reply(A, redirect(303, B))
        .refuse(B);
    let fetcher = HtmlFetcher::new(transport);
    assert_eq!(fetcher.fetch(A, 2), None);
    assert_eq!(fetcher.transport().calls(), vec![A, B]);
}

#[test]
fn malformed_status_line_returns_none() {
    init_logging();
    let broken = HeaderMap::with_status_line("garbage")
        .header("Content-Type", "text/html")
        .content_lines(["<html>"]);
    let fetcher = HtmlFetcher::new(ScriptedTransport::default().reply(A, broken));

    assert_eq!(fetcher.fetch(A, 1), None);
    let err = fetcher.try_fetch_str(A, 1).unwrap_err();
    assert_eq!(err.kind, FailureKind::MalformedStatusLine);
}

#[test]
fn non_html_and_error_statuses_are_rejected() {
    init_logging();
    let json = HeaderMap::with_status_line("HTTP/1.1 200 OK")
        .header("Content-Type", "application/json")
        .content_lines(["{}"]);
    let missing = HeaderMap::with_status_line("HTTP/1.1 404 Not Found")
        .header("Content-Type", "text/html")
        .content_lines(["<html>gone</html>"]);
    let fetcher = HtmlFetcher::new(ScriptedTransport::default().reply(A, json).reply(B, missing));

    let err = fetcher.try_fetch_str(A, 1).unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnsupportedContentType {
            content_type: Some("application/json".to_string())
        }
    );
    assert!(err.kind.is_rejection());

    assert_eq!(fetcher.fetch(B, 1), None);
    let err = fetcher.try_fetch_str(B, 1).unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[test]
fn redirect_without_location_is_rejected() {
    init_logging();
    let moved = HeaderMap::with_status_line("HTTP/1.1 301 Moved Permanently");
    let fetcher = HtmlFetcher::new(ScriptedTransport::default().reply(A, moved));

    let err = fetcher.try_fetch_str(A, 4).unwrap_err();
    assert_eq!(err.kind, FailureKind::MissingLocation);
    assert_eq!(fetcher.transport().calls().len(), 1);
}

#[test]
fn blank_location_is_rejected_without_another_request() {
    init_logging();
    let fetcher = HtmlFetcher::new(ScriptedTransport::default().reply(A, redirect(302, "")));

    assert_eq!(fetcher.fetch(A, 2), None);
    let err = fetcher.try_fetch_str(A, 2).unwrap_err();
    assert_eq!(err.kind, FailureKind::MissingLocation);
    assert!(fetcher.transport().calls().iter().all(|url| url == A));
}

#[test]
fn relative_location_resolves_against_current_url() {
    init_logging();
    let transport = ScriptedTransport::default()
        .reply(A, redirect(302, "/elsewhere?page=2"))
        .reply("http://a.test/elsewhere?page=2", html(&["moved"]));
    let fetcher = HtmlFetcher::new(transport);

    let fetched = fetcher.try_fetch_str(A, 1).unwrap();
    assert_eq!(fetched.html, "moved");
    assert_eq!(fetched.final_url.as_str(), "http://a.test/elsewhere?page=2");
}

#[test]
fn first_location_value_wins() {
    init_logging();
    let ambiguous = redirect(302, B).header("Location", "http://c.test/never");
    let transport = ScriptedTransport::default()
        .reply(A, ambiguous)
        .reply(B, html(&["first"]));
    let fetcher = HtmlFetcher::new(transport);

    assert_eq!(fetcher.fetch(A, 1), Some("first".to_string()));
    assert_eq!(fetcher.transport().calls(), vec![A, B]);
}

#[test]
fn unusable_location_is_invalid_url() {
    init_logging();
    let fetcher = HtmlFetcher::new(ScriptedTransport::default().reply(A, redirect(302, "http://[bad")));
    assert_eq!(fetcher.fetch(A, 1), None);
    let err = fetcher.try_fetch_str(A, 1).unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}

#[test]
fn unparsable_url_is_rejected_before_any_request() {
    init_logging();
    let fetcher = HtmlFetcher::new(ScriptedTransport::default());
    assert_eq!(fetcher.fetch("not a url", 2), None);
    assert_eq!(fetcher.fetch_direct(""), None);
    let err = fetcher.try_fetch_str("://missing-scheme", 0).unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
    assert!(fetcher.transport().calls().is_empty());
}

#[test]
fn url_entry_points_match_string_entry_points() {
    init_logging();
    let transport = ScriptedTransport::default()
        .reply(A, redirect(302, B))
        .reply(B, html(&["OK"]));
    let fetcher = HtmlFetcher::new(transport);
    let url = Url::parse(A).unwrap();

    assert_eq!(fetcher.fetch_url(&url, 1), Some("OK".to_string()));
    assert_eq!(fetcher.fetch_url_direct(&url), None);
}

#[test]
fn one_fetcher_serves_concurrent_callers() {
    init_logging();
    let transport = ScriptedTransport::default()
        .reply(A, redirect(302, B))
        .reply(B, html(&["shared"]));
    let fetcher = HtmlFetcher::new(transport);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| fetcher.fetch(A, 1))).collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some("shared".to_string()));
        }
    });
    assert_eq!(fetcher.transport().calls().len(), 8);
}
