use crate::headers::{HeaderMap, CONTENT_TYPE, LOCATION, TEXT_HTML};
use crate::{FailureKind, FetchError};

const STATUS_OK: u16 = 200;

/// What the fetch loop should do with a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Html,
    Redirect { location: String },
    Rejected(FailureKind),
}

/// True iff the first `Content-Type` value starts with `text/html`, ignoring case.
pub fn is_html(headers: &HeaderMap) -> bool {
    headers
        .first(CONTENT_TYPE)
        .and_then(|value| value.get(..TEXT_HTML.len()))
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(TEXT_HTML))
}

/// Parses the second whitespace-delimited token of the status line.
pub fn status_code(headers: &HeaderMap) -> Result<u16, FetchError> {
    let line = headers.status_line().ok_or_else(|| {
        FetchError::new(FailureKind::MalformedStatusLine, "missing status line")
    })?;
    let token = line.split_whitespace().nth(1).ok_or_else(|| {
        FetchError::new(
            FailureKind::MalformedStatusLine,
            format!("no status code in {line:?}"),
        )
    })?;
    token.parse::<u16>().map_err(|err| {
        FetchError::new(
            FailureKind::MalformedStatusLine,
            format!("status code {token:?} in {line:?}: {err}"),
        )
    })
}

/// True iff the status is 3xx and a `Location` header carries at least one value.
///
/// The value itself is not inspected; [`classify`] rejects a blank one.
pub fn is_redirect(headers: &HeaderMap) -> Result<bool, FetchError> {
    let code = status_code(headers)?;
    Ok(is_redirect_status(code)
        && headers
            .get(LOCATION)
            .is_some_and(|values| !values.is_empty()))
}

/// Decides between success, redirect and rejection for one response.
///
/// A 3xx status without a usable `Location` is rejected, as is any 200 whose
/// body is not HTML. Budget accounting is left to the caller.
pub fn classify(headers: &HeaderMap) -> Result<Classification, FetchError> {
    let code = status_code(headers)?;
    if code == STATUS_OK && is_html(headers) {
        return Ok(Classification::Html);
    }
    if is_redirect_status(code) {
        return Ok(match redirect_target(headers) {
            Some(location) => Classification::Redirect {
                location: location.to_string(),
            },
            None => Classification::Rejected(FailureKind::MissingLocation),
        });
    }
    if code == STATUS_OK {
        return Ok(Classification::Rejected(
            FailureKind::UnsupportedContentType {
                content_type: headers.first(CONTENT_TYPE).map(str::to_string),
            },
        ));
    }
    Ok(Classification::Rejected(FailureKind::HttpStatus(code)))
}

fn is_redirect_status(code: u16) -> bool {
    (300..=399).contains(&code)
}

// Only the first value counts; a blank one is as good as none.
fn redirect_target(headers: &HeaderMap) -> Option<&str> {
    headers
        .first(LOCATION)
        .map(str::trim)
        .filter(|location| !location.is_empty())
}
