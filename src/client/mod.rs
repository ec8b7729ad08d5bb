//! Request executor and entry points.
//!
//! [`HttpClient`] owns a [`Transport`] and drives the pipeline: it
//! translates a [`RequestConfig`] into transport parameters, invokes
//! the transport, interprets the raw header block, and wraps the
//! outcome in a [`Response`]. Network failures are absorbed into
//! error-type responses; [`HttpClient::execute`] never returns `Err`
//! and never panics.

use crate::config::{Body, FetchInit, RequestConfig};
use crate::errors::HttpError;
use crate::headers::parse_header_lines;
use crate::response::{OnFulfilled, Response};
use crate::transport::{ReqwestTransport, Transport, TransportOutcome, TransportRequest};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, warn};

/// Synchronous HTTP client over an abstract transport.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client over the default blocking transport.
    pub fn new() -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new()))
    }

    /// Creates a client over the given transport.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Executes one blocking request and returns its response.
    ///
    /// The call blocks until the transport returns. The config is
    /// snapshotted into the response for diagnostics; the caller keeps
    /// ownership and may mutate and reuse it for the next execution.
    pub fn execute(&self, config: &RequestConfig) -> Response {
        let snapshot = config.clone();
        let request = build_transport_request(config);
        debug!(method = %request.method, url = %request.url, "executing request");

        match self.transport.open(request) {
            TransportOutcome::Failed(failure) => {
                warn!(url = %config.url, timed_out = failure.timed_out, "transport failure");
                let reason = if failure.timed_out {
                    match failure.reason {
                        Some(text) => HttpError::timeout(format!("request timed out: {}", text)),
                        None => HttpError::timeout("request timed out"),
                    }
                } else {
                    match failure.reason {
                        Some(text) => HttpError::connection(text),
                        None => HttpError::connection("unknown network error"),
                    }
                };
                Response::network_error(reason, snapshot)
            }
            TransportOutcome::Opened(opened) => {
                if opened.raw_header_lines.is_empty() {
                    // A stream opened but the remote never sent readable
                    // headers; the timeout flag is the only discriminator.
                    warn!(url = %config.url, timed_out = opened.timed_out, "no headers received");
                    let reason = if opened.timed_out {
                        HttpError::timeout("connection timed out before headers arrived")
                    } else {
                        HttpError::headers_not_sent("remote sent no response headers")
                    };
                    return Response::network_error(reason, snapshot);
                }

                let headers = parse_header_lines(&opened.raw_header_lines);
                Response::from_parsed(headers, opened.resolved_url, opened.stream, snapshot)
            }
        }
    }

    /// Fetch-style entry point.
    pub fn fetch(&self, url: impl Into<String>, init: Option<FetchInit>) -> Response {
        let mut config = RequestConfig::new(url);
        if let Some(init) = init {
            config.apply_fetch_init(init);
        }
        self.execute(&config)
    }

    /// GET entry point. `data` is appended to the URL as a query
    /// string, `accept` sets the `Accept` header, and `on_success` is
    /// applied through `then`.
    pub fn get(
        &self,
        url: impl Into<String>,
        data: Option<&[(&str, &str)]>,
        on_success: Option<OnFulfilled>,
        accept: Option<&str>,
    ) -> Response {
        let mut target = url.into();
        if let Some(pairs) = data.filter(|pairs| !pairs.is_empty()) {
            let query = serde_urlencoded::to_string(pairs).unwrap_or_default();
            if !query.is_empty() {
                target.push(if target.contains('?') { '&' } else { '?' });
                target.push_str(&query);
            }
        }

        let mut config = RequestConfig::get(target);
        if let Some(accept) = accept {
            config.add_header(format!("Accept: {}", accept));
        }

        let response = self.execute(&config);
        match on_success {
            Some(handler) => response.then(handler),
            None => response,
        }
    }

    /// POST entry point. `data` becomes the form body;
    /// `Content-Type: application/x-www-form-urlencoded` is added
    /// unless a Content-Type header is already present.
    pub fn post(
        &self,
        url: impl Into<String>,
        data: Option<&[(&str, &str)]>,
        on_success: Option<OnFulfilled>,
        accept: Option<&str>,
    ) -> Response {
        let mut config = RequestConfig::post(url);
        if let Some(pairs) = data {
            config.body = Some(Body::Form(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ));
        }
        if !config.has_header("Content-Type") {
            config.add_header("Content-Type: application/x-www-form-urlencoded");
        }
        if let Some(accept) = accept {
            config.add_header(format!("Accept: {}", accept));
        }

        let response = self.execute(&config);
        match on_success {
            Some(handler) => response.then(handler),
            None => response,
        }
    }
}

/// Translates a config into transport parameters. Only non-empty
/// options are carried so omitted ones cannot override transport
/// defaults.
fn build_transport_request(config: &RequestConfig) -> TransportRequest {
    let body = config.body.as_ref().map(|body| match body {
        Body::Text(text) => Bytes::from(text.clone()),
        Body::Form(pairs) => Bytes::from(serde_urlencoded::to_string(pairs).unwrap_or_default()),
        Body::Bytes(bytes) => bytes.clone(),
    });

    TransportRequest {
        url: config.url.clone(),
        method: config.effective_method(),
        header_lines: config.headers.iter().map(|entry| entry.render()).collect(),
        body,
        proxy: config.proxy.clone(),
        full_uri: config.full_uri,
        timeout_seconds: config.timeout_seconds,
        follow_redirects: config.follow_redirects,
        max_redirects: config.max_redirects,
        protocol_version: config.protocol_version,
        ignore_error_status: config.ignore_error_status,
    }
}

/// Fetch-style entry point over a default transport.
pub fn fetch(url: impl Into<String>, init: Option<FetchInit>) -> Response {
    HttpClient::new().fetch(url, init)
}

/// GET entry point over a default transport.
pub fn get(
    url: impl Into<String>,
    data: Option<&[(&str, &str)]>,
    on_success: Option<OnFulfilled>,
    accept: Option<&str>,
) -> Response {
    HttpClient::new().get(url, data, on_success, accept)
}

/// POST entry point over a default transport.
pub fn post(
    url: impl Into<String>,
    data: Option<&[(&str, &str)]>,
    on_success: Option<OnFulfilled>,
    accept: Option<&str>,
) -> Response {
    HttpClient::new().post(url, data, on_success, accept)
}
