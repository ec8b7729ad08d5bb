//! Request configuration types.
//!
//! [`RequestConfig`] is a mutable value object: it is created by the
//! caller (directly or through the `get`/`post`/`fetch` convenience
//! paths), mutated freely, and handed to the executor. A config may be
//! reused across sequential executions; for concurrent reuse it must be
//! cloned first, since its header list is shared mutable state.

use bytes::Bytes;
use std::fmt;
use std::str::FromStr;

/// Default maximum number of redirects to follow.
pub const DEFAULT_MAX_REDIRECTS: u32 = 20;

/// Default HTTP protocol version.
pub const DEFAULT_PROTOCOL_VERSION: f32 = 1.0;

/// Canonical HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
    /// PATCH
    Patch,
    /// TRACE
    Trace,
    /// CONNECT
    Connect,
}

impl Method {
    /// Returns the canonical uppercase method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
            Self::Connect => "CONNECT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "PATCH" => Ok(Self::Patch),
            "TRACE" => Ok(Self::Trace),
            "CONNECT" => Ok(Self::Connect),
            _ => Err(()),
        }
    }
}

/// A single request header entry.
///
/// Entries are either named (`Name: value`) or bare positional values
/// passed through to the transport verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    /// Header name, if the entry has one.
    pub name: Option<String>,
    /// Header value, or the whole line for bare entries.
    pub value: String,
}

impl HeaderEntry {
    /// Creates a named header entry.
    pub fn named(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
        }
    }

    /// Creates a bare positional entry.
    pub fn bare(value: impl Into<String>) -> Self {
        Self {
            name: None,
            value: value.into(),
        }
    }

    /// Parses a header line. Lines with a colon become named entries
    /// with trimmed name and value; anything else is a bare entry.
    pub fn parse(line: &str) -> Self {
        match line.split_once(':') {
            Some((name, value)) => Self::named(name.trim(), value.trim()),
            None => Self::bare(line.trim()),
        }
    }

    /// Renders the entry as a transport header line.
    pub fn render(&self) -> String {
        match &self.name {
            Some(name) => format!("{}: {}", name, self.value),
            None => self.value.clone(),
        }
    }

    /// Compares the entry name against another, case-insensitively.
    pub fn name_matches(&self, other: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|n| n.eq_ignore_ascii_case(other))
    }
}

/// Request body payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Raw text, sent as-is.
    Text(String),
    /// Structured key/value data, form-url-encoded before sending.
    Form(Vec<(String, String)>),
    /// Raw bytes, sent as-is.
    Bytes(Bytes),
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_string())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

/// Fetch-style init options, recognized by [`RequestConfig::apply_fetch_init`].
///
/// Every field is optional; absent fields leave the config untouched.
#[derive(Debug, Clone, Default)]
pub struct FetchInit {
    /// Request method, stored raw and uppercased at execution time.
    pub method: Option<String>,
    /// Header lines, merged through [`RequestConfig::add_headers`].
    pub headers: Option<Vec<String>>,
    /// Request body.
    pub body: Option<Body>,
    /// Redirect mode: `"manual"` disables following, anything else enables it.
    pub redirect: Option<String>,
}

impl FetchInit {
    /// Creates an empty init.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Sets the header lines.
    pub fn headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = Some(headers.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the redirect mode.
    pub fn redirect(mut self, mode: impl Into<String>) -> Self {
        self.redirect = Some(mode.into());
        self
    }
}

/// Declarative request configuration.
///
/// `Clone` performs a deep copy of the header list and body, so a cloned
/// config is safe to hand to a second in-flight execution.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Raw request method. Uppercased, and defaulted to GET when empty,
    /// only at execution time.
    pub method: Option<String>,
    /// Ordered header entries.
    pub headers: Vec<HeaderEntry>,
    /// Request body.
    pub body: Option<Body>,
    /// Proxy URI.
    pub proxy: Option<String>,
    /// Whether the target URL is already a full request URI.
    pub full_uri: bool,
    /// Whether the transport should follow redirects.
    pub follow_redirects: bool,
    /// Maximum redirects to follow; values of 1 or less mean "do not follow".
    pub max_redirects: u32,
    /// HTTP protocol version.
    pub protocol_version: f32,
    /// Request timeout in seconds, enforced by the transport.
    pub timeout_seconds: Option<f64>,
    /// Whether error statuses should still yield a readable stream.
    pub ignore_error_status: bool,
    /// Target URL. Required and non-empty.
    pub url: String,
}

impl RequestConfig {
    /// Creates a config for the given URL with all defaults.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            method: None,
            headers: Vec::new(),
            body: None,
            proxy: None,
            full_uri: false,
            follow_redirects: true,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            timeout_seconds: None,
            ignore_error_status: false,
            url: url.into(),
        }
    }

    /// Creates a GET config for the given URL.
    pub fn get(url: impl Into<String>) -> Self {
        let mut config = Self::new(url);
        config.method = Some(Method::Get.as_str().to_string());
        config
    }

    /// Creates a POST config for the given URL.
    pub fn post(url: impl Into<String>) -> Self {
        let mut config = Self::new(url);
        config.method = Some(Method::Post.as_str().to_string());
        config
    }

    /// Returns the method to hand to the transport: uppercased, with
    /// GET standing in for an empty or absent method.
    pub fn effective_method(&self) -> String {
        match self.method.as_deref().map(str::trim) {
            None | Some("") => Method::Get.as_str().to_string(),
            Some(m) => m.to_ascii_uppercase(),
        }
    }

    /// Adds a single header line.
    ///
    /// A `Name: value` line overwrites any existing entry with the same
    /// case-insensitive name; a bare value appends positionally.
    pub fn add_header(&mut self, line: impl AsRef<str>) {
        let entry = HeaderEntry::parse(line.as_ref());
        match &entry.name {
            Some(name) => {
                if let Some(existing) = self.headers.iter_mut().find(|e| e.name_matches(name)) {
                    *existing = entry;
                } else {
                    self.headers.push(entry);
                }
            }
            None => self.headers.push(entry),
        }
    }

    /// Adds a batch of header lines, in order.
    pub fn add_headers<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.add_header(line);
        }
    }

    /// Removes a single header.
    ///
    /// A `Name: value` line removes by case-insensitive name; a bare
    /// value removes the first positional entry whose value matches
    /// exactly.
    pub fn remove_header(&mut self, line: impl AsRef<str>) {
        let entry = HeaderEntry::parse(line.as_ref());
        match &entry.name {
            Some(name) => self.headers.retain(|e| !e.name_matches(name)),
            None => {
                if let Some(pos) = self
                    .headers
                    .iter()
                    .position(|e| e.name.is_none() && e.value == entry.value)
                {
                    self.headers.remove(pos);
                }
            }
        }
    }

    /// Removes a batch of headers, in order.
    pub fn remove_headers<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.remove_header(line);
        }
    }

    /// Returns true if a named header is present, case-insensitively.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|e| e.name_matches(name))
    }

    /// Applies fetch-style init options.
    ///
    /// Recognized options: `method` (stored raw), `headers` (merged),
    /// `body` (set raw), `redirect` (`"manual"` disables following,
    /// any other value enables it). Absent options leave the config
    /// untouched.
    pub fn apply_fetch_init(&mut self, init: FetchInit) {
        if let Some(method) = init.method {
            self.method = Some(method);
        }
        if let Some(headers) = init.headers {
            self.add_headers(headers);
        }
        if let Some(body) = init.body {
            self.body = Some(body);
        }
        if let Some(redirect) = init.redirect {
            self.follow_redirects = redirect != "manual";
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_method_normalization() {
        let mut config = RequestConfig::new("https://example.com");
        assert_eq!(config.effective_method(), "GET");

        config.method = Some("post".to_string());
        assert_eq!(config.effective_method(), "POST");

        config.method = Some("  ".to_string());
        assert_eq!(config.effective_method(), "GET");
    }

    #[test]
    fn test_add_header_overwrites_by_name() {
        let mut config = RequestConfig::new("https://example.com");
        config.add_header("X-Token: one");
        config.add_header("x-token: two");

        assert_eq!(config.headers.len(), 1);
        assert_eq!(config.headers[0].value, "two");
        // The original casing of the replacement wins.
        assert_eq!(config.headers[0].name.as_deref(), Some("x-token"));
    }

    #[test]
    fn test_bare_headers_append_positionally() {
        let mut config = RequestConfig::new("https://example.com");
        config.add_header("keep-alive");
        config.add_header("keep-alive");

        assert_eq!(config.headers.len(), 2);
        assert!(config.headers.iter().all(|e| e.name.is_none()));
    }

    #[test]
    fn test_add_then_remove_by_name() {
        let mut config = RequestConfig::new("https://example.com");
        config.add_headers(["Accept: text/html", "X-A: 1"]);
        config.remove_header("Accept: anything");

        assert!(!config.has_header("Accept"));
        assert!(config.has_header("X-A"));
    }

    #[test]
    fn test_remove_bare_entry_by_exact_value() {
        let mut config = RequestConfig::new("https://example.com");
        config.add_header("first-bare");
        config.add_header("second-bare");
        config.remove_header("second-bare");

        assert_eq!(config.headers.len(), 1);
        assert_eq!(config.headers[0].value, "first-bare");
    }

    #[test]
    fn test_apply_fetch_init() {
        let mut config = RequestConfig::new("https://example.com");
        config.apply_fetch_init(
            FetchInit::new()
                .method("post")
                .headers(["X-A: 1"])
                .body("payload")
                .redirect("manual"),
        );

        assert_eq!(config.method.as_deref(), Some("post"));
        assert_eq!(config.effective_method(), "POST");
        assert!(config.has_header("X-A"));
        assert_eq!(config.body, Some(Body::Text("payload".to_string())));
        assert!(!config.follow_redirects);

        config.apply_fetch_init(FetchInit::new().redirect("follow"));
        assert!(config.follow_redirects);
    }

    #[test]
    fn test_apply_empty_init_is_a_no_op() {
        let mut config = RequestConfig::get("https://example.com");
        let before = config.clone();
        config.apply_fetch_init(FetchInit::new());

        assert_eq!(config.method, before.method);
        assert_eq!(config.headers, before.headers);
        assert_eq!(config.follow_redirects, before.follow_redirects);
    }

    #[test]
    fn test_clone_deep_copies_headers() {
        let mut config = RequestConfig::get("https://example.com");
        config.add_header("X-A: 1");

        let mut cloned = config.clone();
        cloned.add_header("X-A: 2");

        assert_eq!(config.headers[0].value, "1");
        assert_eq!(cloned.headers[0].value, "2");
    }

    #[test]
    fn test_method_round_trip() {
        for name in [
            "GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH", "TRACE", "CONNECT",
        ] {
            let method: Method = name.to_ascii_lowercase().parse().unwrap();
            assert_eq!(method.as_str(), name);
        }
        assert!("BREW".parse::<Method>().is_err());
    }
}
