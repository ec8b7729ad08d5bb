//! Error types for the syncfetch client.
//!
//! Errors come in two tiers. Network-tier failures (connection refused,
//! timeout, headers never sent) are absorbed into an error-type
//! [`Response`](crate::response::Response) and never returned as `Err`
//! from the executor. Content-tier failures (decoding a body, reading a
//! body that is unusable or already consumed) are returned as `Err` from
//! the body readers. [`HttpError::is_network`] and
//! [`HttpError::is_content`] keep the distinction queryable.

use crate::config::RequestConfig;
use std::fmt;
use thiserror::Error;

/// Result type alias for syncfetch operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Error kinds for categorizing client errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    // Network errors (absorbed into the Response)
    /// Connection could not be established.
    ConnectionFailed,
    /// The request timed out.
    Timeout,
    /// A stream opened but the remote never sent response headers.
    HeadersNotSent,

    // Response errors (raised by body readers)
    /// A body reader was invoked on an error-type response.
    ResponseUnusable,
    /// The body stream was already consumed.
    BodyConsumed,
    /// The body was not valid JSON.
    InvalidJson,
    /// The body was not valid URL-encoded form data.
    InvalidFormBody,
    /// The body ended mid-unit for the requested numeric layout.
    TruncatedBody,
    /// Reading the body stream failed.
    Io,

    // Request plumbing
    /// The target URL could not be parsed.
    InvalidUrl,
    /// Client construction or configuration failed.
    Configuration,

    /// Unknown error.
    Unknown,
}

impl fmt::Display for HttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::HeadersNotSent => write!(f, "headers_not_sent"),
            Self::ResponseUnusable => write!(f, "response_unusable"),
            Self::BodyConsumed => write!(f, "body_consumed"),
            Self::InvalidJson => write!(f, "invalid_json"),
            Self::InvalidFormBody => write!(f, "invalid_form_body"),
            Self::TruncatedBody => write!(f, "truncated_body"),
            Self::Io => write!(f, "io"),
            Self::InvalidUrl => write!(f, "invalid_url"),
            Self::Configuration => write!(f, "configuration"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Client error with diagnostic context.
#[derive(Error, Debug)]
pub struct HttpError {
    /// Error kind.
    kind: HttpErrorKind,
    /// Error message.
    message: String,
    /// HTTP status code of the offending response, if one was observed.
    status_code: Option<u16>,
    /// URL of the offending response.
    url: Option<String>,
    /// Snapshot of the originating request configuration.
    config: Option<RequestConfig>,
    /// Underlying cause.
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(code) = self.status_code {
            write!(f, " (HTTP {})", code)?;
        }
        if let Some(ref url) = self.url {
            write!(f, " [url: {}]", url)?;
        }
        Ok(())
    }
}

impl HttpError {
    /// Creates a new error.
    pub fn new(kind: HttpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            url: None,
            config: None,
            cause: None,
        }
    }

    /// Sets the HTTP status code.
    pub fn with_status(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Sets the URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Attaches a snapshot of the originating request configuration.
    pub fn with_config(mut self, config: RequestConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the underlying cause, forming a chain of previous errors.
    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Gets the error kind.
    pub fn kind(&self) -> HttpErrorKind {
        self.kind
    }

    /// Gets the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Gets the HTTP status code.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Gets the URL.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Gets the originating request configuration snapshot.
    pub fn config(&self) -> Option<&RequestConfig> {
        self.config.as_ref()
    }

    /// Returns true for network-tier failures, which are absorbed into
    /// the response state rather than raised.
    pub fn is_network(&self) -> bool {
        matches!(
            self.kind,
            HttpErrorKind::ConnectionFailed | HttpErrorKind::Timeout | HttpErrorKind::HeadersNotSent
        )
    }

    /// Returns true for content-tier failures, which body readers raise
    /// immediately.
    pub fn is_content(&self) -> bool {
        matches!(
            self.kind,
            HttpErrorKind::ResponseUnusable
                | HttpErrorKind::BodyConsumed
                | HttpErrorKind::InvalidJson
                | HttpErrorKind::InvalidFormBody
                | HttpErrorKind::TruncatedBody
                | HttpErrorKind::Io
        )
    }

    // Convenience constructors

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Timeout, message)
    }

    /// Creates a connection failure error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::ConnectionFailed, message)
    }

    /// Creates a headers-not-sent error.
    pub fn headers_not_sent(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::HeadersNotSent, message)
    }

    /// Creates an unusable-response error.
    pub fn response_unusable(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::ResponseUnusable, message)
    }

    /// Creates a body-consumed error.
    pub fn body_consumed() -> Self {
        Self::new(
            HttpErrorKind::BodyConsumed,
            "body stream was already consumed",
        )
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Configuration, message)
    }

    /// Creates an invalid-URL error.
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::InvalidUrl, message)
    }
}

impl From<std::io::Error> for HttpError {
    fn from(err: std::io::Error) -> Self {
        HttpError::new(HttpErrorKind::Io, "failed to read body stream").with_cause(err)
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        HttpError::new(HttpErrorKind::InvalidJson, "body is not valid JSON").with_cause(err)
    }
}
