/// Header carrying the media type of the body.
pub const CONTENT_TYPE: &str = "Content-Type";

/// Media type prefix that marks a body as HTML.
pub const TEXT_HTML: &str = "text/html";

/// Header carrying the redirect target.
pub const LOCATION: &str = "Location";

/// Reserved entry name for the body lines.
pub const CONTENT: &str = "Content";

/// Parsed HTTP/1.1 response: raw status line, header fields, and body lines.
///
/// Header names keep the case they were inserted with but are looked up
/// case-insensitively. Repeated headers accumulate values in arrival order.
/// The status line and the body are reserved entries rather than ordinary
/// fields, so a server sending a header literally named `Content` does not
/// clobber the body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    status_line: Option<String>,
    fields: Vec<(String, Vec<String>)>,
    content: Vec<String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status_line(line: impl Into<String>) -> Self {
        Self {
            status_line: Some(line.into()),
            ..Self::default()
        }
    }

    /// Builder form of [`HeaderMap::insert`].
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Builder form of [`HeaderMap::set_content`].
    pub fn content_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_content(lines.into_iter().map(Into::into).collect());
        self
    }

    /// Appends a value, creating the entry on first sight of the name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.fields[idx].1.push(value),
            None => self.fields.push((name, vec![value])),
        }
    }

    pub fn set_content(&mut self, lines: Vec<String>) {
        self.content = lines;
    }

    pub fn status_line(&self) -> Option<&str> {
        self.status_line.as_deref()
    }

    /// All values recorded for `name`, compared ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.position(name).map(|idx| self.fields[idx].1.as_slice())
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn content(&self) -> &[String] {
        &self.content
    }

    /// Body lines re-joined with `\n`, in original order.
    pub fn joined_content(&self) -> String {
        self.content.join("\n")
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}
