//! Response type, body readers, and the chaining contract.
//!
//! A [`Response`] is constructed exactly once per execution and is
//! conceptually immutable afterwards, except for body-consumption
//! tracking. Its resolution state (resolved vs rejected) is decided at
//! construction from the response type and never re-evaluated; the
//! `then`/`catch`/`finally` methods dispatch on that fixed state, so no
//! handler can observe an unsettled outcome.

use crate::config::RequestConfig;
use crate::errors::{HttpError, HttpErrorKind, HttpResult};
use crate::headers::ParsedHeaders;
use crate::transport::BodyStream;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::io::Read;
use url::{Host, Url};

/// Response classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    /// The target was a local or same-origin resource.
    Basic,
    /// The target was a remote resource.
    Cors,
    /// No usable headers were obtained.
    Error,
}

impl ResponseType {
    /// Returns the lowercase classification name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Cors => "cors",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric layout descriptor for [`Response::array_buffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericLayout {
    /// Unsigned bytes.
    U8,
    /// Big-endian 16-bit unsigned integers.
    U16Be,
    /// Little-endian 16-bit unsigned integers.
    U16Le,
    /// Big-endian 32-bit unsigned integers.
    #[default]
    U32Be,
    /// Little-endian 32-bit unsigned integers.
    U32Le,
}

impl NumericLayout {
    /// Size of one unit in bytes.
    pub fn unit_size(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16Be | Self::U16Le => 2,
            Self::U32Be | Self::U32Le => 4,
        }
    }

    fn decode_unit(&self, chunk: &[u8]) -> u64 {
        match self {
            Self::U8 => chunk[0] as u64,
            Self::U16Be => u16::from_be_bytes([chunk[0], chunk[1]]) as u64,
            Self::U16Le => u16::from_le_bytes([chunk[0], chunk[1]]) as u64,
            Self::U32Be => u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as u64,
            Self::U32Le => u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as u64,
        }
    }
}

/// The settled state carried through a chain of handlers.
enum Settled {
    /// Fulfilled. `None` means "the response itself", before any `then`
    /// handler has replaced the value.
    Value(Option<Value>),
    /// Rejected, with the error payload as the reason.
    Reason(HttpError),
}

/// Fulfillment handler for bulk chaining.
pub type OnFulfilled = Box<dyn FnOnce(&mut Response) -> Option<Value>>;
/// Rejection handler for bulk chaining.
pub type OnRejected = Box<dyn FnOnce(HttpError) -> HttpError>;
/// Settlement handler for bulk chaining.
pub type OnSettled = Box<dyn FnOnce(&Response)>;

/// The externally visible result of one execution.
pub struct Response {
    headers: ParsedHeaders,
    status: u16,
    response_type: ResponseType,
    redirected: bool,
    url: String,
    body: Option<BodyStream>,
    body_used: bool,
    settled: Settled,
    config: RequestConfig,
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("type", &self.response_type)
            .field("redirected", &self.redirected)
            .field("url", &self.url)
            .field("body_used", &self.body_used)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

impl Response {
    /// Builds a response from a parsed header block and a live stream.
    pub(crate) fn from_parsed(
        headers: ParsedHeaders,
        resolved_url: String,
        stream: BodyStream,
        config: RequestConfig,
    ) -> Self {
        let status = headers.status();
        let redirected = headers.redirected();
        let response_type = classify_origin(&config.url);
        Self {
            headers,
            status,
            response_type,
            redirected,
            url: resolved_url,
            body: Some(stream),
            body_used: false,
            settled: Settled::Value(None),
            config,
        }
    }

    /// Builds an error-type response from an absorbed network failure.
    pub(crate) fn network_error(reason: HttpError, config: RequestConfig) -> Self {
        let url = config.url.clone();
        let reason = reason.with_url(url.clone()).with_config(config.clone());
        Self {
            headers: ParsedHeaders::empty(),
            status: 0,
            response_type: ResponseType::Error,
            redirected: false,
            url,
            body: None,
            body_used: false,
            settled: Settled::Reason(reason),
            config,
        }
    }

    // Accessors

    /// The final HTTP status code, 0 when none was observed.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// True if the status is in the 200-299 range.
    pub fn ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// True if the raw header block recorded more than one hop.
    pub fn redirected(&self) -> bool {
        self.redirected
    }

    /// `"OK"` for status 200, `"network error"` for error-type
    /// responses, empty otherwise. There is no generic reverse-mapping
    /// of codes to phrases.
    pub fn status_text(&self) -> &'static str {
        match self.response_type {
            ResponseType::Error => "network error",
            _ if self.status == 200 => "OK",
            _ => "",
        }
    }

    /// Response classification.
    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }

    /// The resolved URL, which may differ from the requested one after
    /// redirects.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The parsed header block.
    pub fn headers(&self) -> &ParsedHeaders {
        &self.headers
    }

    /// True once the body has been consumed or released.
    pub fn body_used(&self) -> bool {
        self.body_used
    }

    /// Snapshot of the originating request configuration.
    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    // Body readers

    /// Drains the body stream exactly once.
    ///
    /// Readers fail loudly on a consumed body rather than returning
    /// stale or empty data. An error-type response has no body to
    /// consume, so every reader call on one fails the same way and
    /// leaves the consumption flag untouched.
    fn take_body(&mut self) -> HttpResult<Vec<u8>> {
        if self.response_type == ResponseType::Error {
            return Err(HttpError::response_unusable(
                "body reader invoked on an error-type response",
            )
            .with_status(self.status)
            .with_url(self.url.clone())
            .with_config(self.config.clone()));
        }

        if self.body_used {
            return Err(HttpError::body_consumed().with_url(self.url.clone()));
        }
        self.body_used = true;

        let mut bytes = Vec::new();
        if let Some(mut stream) = self.body.take() {
            stream.read_to_end(&mut bytes)?;
        }
        Ok(bytes)
    }

    /// Reads the body as text.
    ///
    /// Binary content (an embedded NUL or non-printable bytes) is
    /// returned hex-encoded instead. This is a lossy-safe contract, not
    /// a lossless binary one; [`Response::blob`] performs the inverse.
    pub fn text(&mut self) -> HttpResult<String> {
        let bytes = self.take_body()?;
        if is_binary(&bytes) {
            return Ok(hex::encode(bytes));
        }
        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => Ok(hex::encode(e.into_bytes())),
        }
    }

    /// Parses the full body as JSON.
    ///
    /// Unlike [`Response::text`], malformed content is a hard error,
    /// with the decode error attached as the cause.
    pub fn json(&mut self) -> HttpResult<Value> {
        let bytes = self.take_body()?;
        serde_json::from_slice(&bytes).map_err(|e| HttpError::from(e).with_url(self.url.clone()))
    }

    /// Parses the full body as JSON into a structured record type.
    pub fn json_as<T: DeserializeOwned>(&mut self) -> HttpResult<T> {
        let bytes = self.take_body()?;
        serde_json::from_slice(&bytes).map_err(|e| HttpError::from(e).with_url(self.url.clone()))
    }

    /// Returns the raw body bytes.
    ///
    /// Text-like content is hex-decoded when possible, as the inverse of
    /// [`Response::text`]'s binary fallback; text that is not valid hex
    /// comes back as its raw bytes. A legacy compatibility method, not a
    /// general binary-safe primitive.
    pub fn blob(&mut self) -> HttpResult<Vec<u8>> {
        let bytes = self.take_body()?;
        if !bytes.is_empty() && !is_binary(&bytes) {
            let text = String::from_utf8_lossy(&bytes);
            if let Ok(decoded) = hex::decode(text.trim()) {
                return Ok(decoded);
            }
        }
        Ok(bytes)
    }

    /// Unpacks the body as a sequence of numbers per the given layout.
    ///
    /// Trailing bytes that do not fill a whole unit are an error.
    pub fn array_buffer(&mut self, layout: NumericLayout) -> HttpResult<Vec<u64>> {
        let bytes = self.take_body()?;
        let unit = layout.unit_size();
        if bytes.len() % unit != 0 {
            return Err(HttpError::new(
                HttpErrorKind::TruncatedBody,
                format!(
                    "body length {} is not a multiple of the {}-byte unit",
                    bytes.len(),
                    unit
                ),
            )
            .with_url(self.url.clone()));
        }
        Ok(bytes
            .chunks_exact(unit)
            .map(|chunk| layout.decode_unit(chunk))
            .collect())
    }

    /// Reads the body as form data.
    ///
    /// JSON content is flattened into a single-level mapping with
    /// dotted-path keys (array items get a `[]` suffix on the parent
    /// key); anything else falls back to URL-encoded form decoding.
    /// First occurrence wins on key collision.
    pub fn form_data(&mut self) -> HttpResult<Vec<(String, String)>> {
        let bytes = self.take_body()?;

        if let Ok(json) = serde_json::from_slice::<Value>(&bytes) {
            return Ok(flatten_value(&json));
        }

        let mut pairs: Vec<(String, String)> = Vec::new();
        for (key, value) in url::form_urlencoded::parse(&bytes) {
            if !pairs.iter().any(|(k, _)| *k == key) {
                pairs.push((key.into_owned(), value.into_owned()));
            }
        }
        if pairs.is_empty() && !bytes.is_empty() {
            return Err(HttpError::new(
                HttpErrorKind::InvalidFormBody,
                "body is neither JSON nor URL-encoded form data",
            )
            .with_url(self.url.clone()));
        }
        Ok(pairs)
    }

    // Chaining contract

    /// True if the response resolved (its type is not `error`).
    pub fn is_resolved(&self) -> bool {
        matches!(self.settled, Settled::Value(_))
    }

    /// True if the response rejected (its type is `error`).
    pub fn is_rejected(&self) -> bool {
        matches!(self.settled, Settled::Reason(_))
    }

    /// The current settled value, if resolved and a handler has
    /// produced one.
    pub fn settled_value(&self) -> Option<&Value> {
        match &self.settled {
            Settled::Value(value) => value.as_ref(),
            Settled::Reason(_) => None,
        }
    }

    /// The current settled reason, if rejected.
    pub fn settled_reason(&self) -> Option<&HttpError> {
        match &self.settled {
            Settled::Value(_) => None,
            Settled::Reason(reason) => Some(reason),
        }
    }

    /// Runs the handler if the response resolved, replacing the settled
    /// value with its return value. Returns the response for chaining.
    ///
    /// Exactly one branch ever runs per call: a rejected response skips
    /// the handler untouched.
    pub fn then<F>(mut self, on_fulfilled: F) -> Self
    where
        F: FnOnce(&mut Response) -> Option<Value>,
    {
        if self.is_resolved() {
            let value = on_fulfilled(&mut self);
            self.settled = Settled::Value(value);
        }
        self
    }

    /// Runs the handler if the response rejected, replacing the settled
    /// reason with its return value. Returns the response for chaining.
    pub fn catch<F>(mut self, on_rejected: F) -> Self
    where
        F: FnOnce(HttpError) -> HttpError,
    {
        if self.is_rejected() {
            let settled = std::mem::replace(&mut self.settled, Settled::Value(None));
            if let Settled::Reason(reason) = settled {
                self.settled = Settled::Reason(on_rejected(reason));
            }
        }
        self
    }

    /// Runs the handler regardless of state, then closes and releases
    /// the body stream. A true terminal call: the response is consumed
    /// and `body_used` is final.
    pub fn finally<F>(mut self, on_settled: F)
    where
        F: FnOnce(&Response),
    {
        on_settled(&self);
        self.release_body();
    }

    /// Applies `then` to each handler in order. Bulk alias.
    pub fn done<I>(self, handlers: I) -> Self
    where
        I: IntoIterator<Item = OnFulfilled>,
    {
        handlers.into_iter().fold(self, |resp, h| resp.then(h))
    }

    /// Applies `catch` to each handler in order. Bulk alias.
    pub fn fail<I>(self, handlers: I) -> Self
    where
        I: IntoIterator<Item = OnRejected>,
    {
        handlers.into_iter().fold(self, |resp, h| resp.catch(h))
    }

    /// Runs every handler in order regardless of state, then performs
    /// the terminal body teardown once. Bulk alias of `finally`.
    pub fn always<I>(mut self, handlers: I)
    where
        I: IntoIterator<Item = OnSettled>,
    {
        for handler in handlers {
            handler(&self);
        }
        self.release_body();
    }

    /// Closes the body stream. Releasing twice is a no-op.
    fn release_body(&mut self) {
        self.body = None;
        self.body_used = true;
    }
}

/// Classifies the target URL as local/same-origin (`basic`) or remote
/// (`cors`). Targets without a host, `file:` URLs, and loopback hosts
/// count as local.
fn classify_origin(target: &str) -> ResponseType {
    match Url::parse(target) {
        Ok(url) => {
            if url.scheme() == "file" {
                return ResponseType::Basic;
            }
            match url.host() {
                None => ResponseType::Basic,
                Some(Host::Domain(domain)) => {
                    if domain.eq_ignore_ascii_case("localhost") {
                        ResponseType::Basic
                    } else {
                        ResponseType::Cors
                    }
                }
                Some(Host::Ipv4(ip)) => {
                    if ip.is_loopback() {
                        ResponseType::Basic
                    } else {
                        ResponseType::Cors
                    }
                }
                Some(Host::Ipv6(ip)) => {
                    if ip.is_loopback() {
                        ResponseType::Basic
                    } else {
                        ResponseType::Cors
                    }
                }
            }
        }
        // Relative and bare path targets are local resources.
        Err(_) => ResponseType::Basic,
    }
}

/// A byte sequence is binary if it contains an embedded NUL or a byte
/// that is neither printable ASCII nor ordinary whitespace.
fn is_binary(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .any(|&b| b == 0 || (!(0x20..=0x7e).contains(&b) && !matches!(b, b'\t' | b'\n' | b'\r')))
}

/// Flattens a nested JSON value into a single-level mapping.
///
/// Objects compose dotted paths, arrays append `[]` to the parent key.
/// A colliding scalar key is dropped (first occurrence wins); repeated
/// `[]` entries are kept unless the exact pair already exists.
fn flatten_value(json: &Value) -> Vec<(String, String)> {
    let mut out = Vec::new();
    flatten_into("", json, &mut out);
    out
}

fn flatten_into(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(&path, child, out);
            }
        }
        Value::Array(items) => {
            let path = format!("{}[]", prefix);
            for item in items {
                flatten_into(&path, item, out);
            }
        }
        scalar => {
            let rendered = scalar_to_string(scalar);
            let duplicate = if prefix.ends_with("[]") {
                out.iter().any(|(k, v)| k == prefix && *v == rendered)
            } else {
                out.iter().any(|(k, _)| k == prefix)
            };
            if !duplicate {
                out.push((prefix.to_string(), rendered));
            }
        }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        // Containers never reach here.
        other => other.to_string(),
    }
}
