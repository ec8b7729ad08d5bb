//! Transport boundary.
//!
//! The [`Transport`] trait is the seam between the request pipeline and
//! the network. A transport opens a connection, sends the request, and
//! hands back either a live body stream plus the raw header block, or a
//! failure outcome. Failures never cross the boundary as panics or
//! `Err` values; they are ordinary [`TransportOutcome::Failed`] values
//! the executor absorbs into an error-type response.
//!
//! [`ReqwestTransport`] is the production implementation, built on
//! `reqwest::blocking`. Tests substitute
//! [`MockTransport`](crate::mocks::MockTransport) at the same seam.

use bytes::Bytes;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// A live response body stream, owned exclusively by its response.
pub type BodyStream = Box<dyn Read + Send>;

/// Transport-level request parameters, fully resolved by the executor.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Target URL.
    pub url: String,
    /// Uppercased request method.
    pub method: String,
    /// Rendered header lines: `Name: value` per named entry, bare
    /// entries verbatim.
    pub header_lines: Vec<String>,
    /// Serialized request body.
    pub body: Option<Bytes>,
    /// Proxy URI.
    pub proxy: Option<String>,
    /// Whether the target URL should be sent as a full request URI.
    pub full_uri: bool,
    /// Request timeout in seconds. Absent means the transport default.
    pub timeout_seconds: Option<f64>,
    /// Whether to follow redirects.
    pub follow_redirects: bool,
    /// Maximum redirects to follow; 1 or less means "do not follow".
    pub max_redirects: u32,
    /// Requested HTTP protocol version.
    pub protocol_version: f32,
    /// Whether error statuses should still yield a readable stream.
    pub ignore_error_status: bool,
}

/// A successfully opened stream and its raw header block.
pub struct OpenedStream {
    /// The live body stream.
    pub stream: BodyStream,
    /// Raw ordered header-or-status lines, one status line per hop.
    pub raw_header_lines: Vec<String>,
    /// The stream's resolved URL, which may differ from the requested
    /// URL after redirects.
    pub resolved_url: String,
    /// True if the transport hit its deadline while the stream was open.
    pub timed_out: bool,
}

/// A transport-level failure: no stream could be obtained.
#[derive(Debug, Clone, Default)]
pub struct TransportFailure {
    /// True if the failure was a timeout.
    pub timed_out: bool,
    /// Last error text reported by the transport, if any.
    pub reason: Option<String>,
}

/// Outcome of a transport invocation.
pub enum TransportOutcome {
    /// A stream was opened.
    Opened(OpenedStream),
    /// No stream could be obtained.
    Failed(TransportFailure),
}

impl TransportOutcome {
    /// Shorthand for a failure outcome.
    pub fn failed(timed_out: bool, reason: impl Into<String>) -> Self {
        Self::Failed(TransportFailure {
            timed_out,
            reason: Some(reason.into()),
        })
    }
}

/// Abstract transport capability.
pub trait Transport: Send + Sync {
    /// Opens a connection for the given request.
    fn open(&self, request: TransportRequest) -> TransportOutcome;
}

/// Blocking reqwest-based transport.
///
/// Redirect policy, proxy, and timeout are per-request concerns here,
/// so a client is built per call rather than pooled. Each redirect hop
/// records its status line so the raw header block carries the full
/// hop sequence the parser expects. The full-URI, protocol-version,
/// and error-status options are advisory here: reqwest speaks
/// HTTP/1.1 and never fails a request on an error status.
#[derive(Debug, Default, Clone)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    /// Creates a new transport.
    pub fn new() -> Self {
        Self
    }

    fn build_client(
        &self,
        request: &TransportRequest,
        hops: Arc<Mutex<Vec<String>>>,
    ) -> Result<reqwest::blocking::Client, reqwest::Error> {
        let policy = if request.follow_redirects && request.max_redirects > 1 {
            let limit = request.max_redirects as usize;
            reqwest::redirect::Policy::custom(move |attempt| {
                let status = attempt.status();
                // Recover from poisoning; hop lines are append-only.
                let mut hops = hops.lock().unwrap_or_else(|e| e.into_inner());
                hops.push(format!(
                    "HTTP/1.1 {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                ));
                if attempt.previous().len() > limit {
                    attempt.stop()
                } else {
                    attempt.follow()
                }
            })
        } else {
            reqwest::redirect::Policy::none()
        };

        let mut builder = reqwest::blocking::Client::builder().redirect(policy);

        // Omitted options must not override transport defaults.
        if let Some(seconds) = request.timeout_seconds {
            builder = builder.timeout(Duration::from_secs_f64(seconds));
        }
        if let Some(ref proxy) = request.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        builder.build()
    }
}

impl Transport for ReqwestTransport {
    fn open(&self, request: TransportRequest) -> TransportOutcome {
        let method = match reqwest::Method::from_bytes(request.method.as_bytes()) {
            Ok(method) => method,
            Err(e) => {
                return TransportOutcome::failed(false, format!("invalid method: {}", e));
            }
        };

        let hops: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let client = match self.build_client(&request, hops.clone()) {
            Ok(client) => client,
            Err(e) => {
                return TransportOutcome::failed(false, format!("client setup failed: {}", e));
            }
        };

        let mut builder = client.request(method, &request.url);
        for line in &request.header_lines {
            match line.split_once(':') {
                Some((name, value)) => {
                    builder = builder.header(name.trim(), value.trim());
                }
                None => {
                    // A bare positional line has no HTTP rendering here.
                    warn!(line = %line, "dropping bare header line unsupported by this transport");
                }
            }
        }
        if let Some(body) = request.body {
            builder = builder.body(body.to_vec());
        }

        debug!(method = %request.method, url = %request.url, "opening transport");

        let response = match builder.send() {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %request.url, error = %e, "transport open failed");
                return TransportOutcome::Failed(TransportFailure {
                    timed_out: e.is_timeout(),
                    reason: Some(e.to_string()),
                });
            }
        };

        let mut raw_header_lines = hops.lock().unwrap_or_else(|e| e.into_inner()).clone();
        let status = response.status();
        raw_header_lines.push(format!(
            "HTTP/1.1 {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        ));
        for (name, value) in response.headers() {
            raw_header_lines.push(format!(
                "{}: {}",
                name,
                String::from_utf8_lossy(value.as_bytes())
            ));
        }
        let resolved_url = response.url().to_string();

        TransportOutcome::Opened(OpenedStream {
            stream: Box::new(response),
            raw_header_lines,
            resolved_url,
            timed_out: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_shorthand() {
        let outcome = TransportOutcome::failed(true, "deadline exceeded");
        match outcome {
            TransportOutcome::Failed(failure) => {
                assert!(failure.timed_out);
                assert_eq!(failure.reason.as_deref(), Some("deadline exceeded"));
            }
            TransportOutcome::Opened(_) => panic!("expected a failure outcome"),
        }
    }

    #[test]
    fn test_invalid_method_is_a_failure_outcome() {
        let transport = ReqwestTransport::new();
        let outcome = transport.open(TransportRequest {
            url: "http://localhost/".to_string(),
            method: "BAD METHOD".to_string(),
            header_lines: Vec::new(),
            body: None,
            proxy: None,
            full_uri: false,
            timeout_seconds: None,
            follow_redirects: true,
            max_redirects: 20,
            protocol_version: 1.0,
            ignore_error_status: false,
        });

        match outcome {
            TransportOutcome::Failed(failure) => {
                assert!(!failure.timed_out);
                assert!(failure.reason.unwrap().contains("invalid method"));
            }
            TransportOutcome::Opened(_) => panic!("expected a failure outcome"),
        }
    }
}
