//! Mock transport for testing the request pipeline.
//!
//! [`MockTransport`] implements the [`Transport`] seam with scripted
//! outcomes and records every request it receives, so tests can assert
//! on both the response surface and the transport parameters the
//! executor built.

use crate::transport::{
    OpenedStream, Transport, TransportFailure, TransportOutcome, TransportRequest,
};
use serde::Serialize;
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;

/// A scripted successful reply.
#[derive(Debug, Clone)]
pub struct MockReply {
    status: u16,
    prior_hops: Vec<u16>,
    header_lines: Vec<String>,
    body: Vec<u8>,
    resolved_url: Option<String>,
    timed_out: bool,
    no_headers: bool,
}

impl MockReply {
    /// A reply with the given final status.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            prior_hops: Vec::new(),
            header_lines: Vec::new(),
            body: Vec::new(),
            resolved_url: None,
            timed_out: false,
            no_headers: false,
        }
    }

    /// A 200 OK reply.
    pub fn ok() -> Self {
        Self::status(200)
    }

    /// A reply whose stream opened but carried no header lines at all.
    pub fn no_headers(timed_out: bool) -> Self {
        let mut reply = Self::status(0);
        reply.no_headers = true;
        reply.timed_out = timed_out;
        reply
    }

    /// Adds a named header line.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.header_lines.push(format!("{}: {}", name, value));
        self
    }

    /// Prepends a redirect hop with the given status.
    pub fn redirected_from(mut self, status: u16) -> Self {
        self.prior_hops.push(status);
        self
    }

    /// Sets the body bytes.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the body to serialized JSON.
    pub fn json<T: Serialize>(self, value: &T) -> Self {
        self.body(serde_json::to_vec(value).unwrap_or_default())
    }

    /// Sets the resolved URL the stream reports.
    pub fn resolved_url(mut self, url: impl Into<String>) -> Self {
        self.resolved_url = Some(url.into());
        self
    }

    fn into_outcome(self, requested_url: &str) -> TransportOutcome {
        let mut raw_header_lines = Vec::new();
        if !self.no_headers {
            for hop in &self.prior_hops {
                raw_header_lines.push(format!("HTTP/1.1 {} Redirect", hop));
            }
            raw_header_lines.push(format!("HTTP/1.1 {} Reply", self.status));
            raw_header_lines.extend(self.header_lines);
        }

        TransportOutcome::Opened(OpenedStream {
            stream: Box::new(Cursor::new(self.body)),
            raw_header_lines,
            resolved_url: self
                .resolved_url
                .unwrap_or_else(|| requested_url.to_string()),
            timed_out: self.timed_out,
        })
    }
}

enum Scripted {
    Reply(MockReply),
    Failure(TransportFailure),
}

/// Scripted transport that records its requests.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    /// Creates an empty mock. With no script, every open yields an
    /// empty 200 OK reply.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply.
    pub fn push_reply(&self, reply: MockReply) {
        self.script.lock().unwrap().push_back(Scripted::Reply(reply));
    }

    /// Queues a transport failure.
    pub fn push_failure(&self, timed_out: bool, reason: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Failure(TransportFailure {
                timed_out,
                reason: Some(reason.to_string()),
            }));
    }

    /// The requests observed so far, in order.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn open(&self, request: TransportRequest) -> TransportOutcome {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Reply(reply)) => reply.into_outcome(&url),
            Some(Scripted::Failure(failure)) => TransportOutcome::Failed(failure),
            None => MockReply::ok().into_outcome(&url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> TransportRequest {
        TransportRequest {
            url: url.to_string(),
            method: "GET".to_string(),
            header_lines: Vec::new(),
            body: None,
            proxy: None,
            full_uri: false,
            timeout_seconds: None,
            follow_redirects: true,
            max_redirects: 20,
            protocol_version: 1.0,
            ignore_error_status: false,
        }
    }

    #[test]
    fn test_script_order_and_recording() {
        let mock = MockTransport::new();
        mock.push_reply(MockReply::status(201).header("X-A", "1"));
        mock.push_failure(true, "deadline exceeded");

        match mock.open(request("http://a/")) {
            TransportOutcome::Opened(opened) => {
                assert_eq!(
                    opened.raw_header_lines,
                    vec!["HTTP/1.1 201 Reply".to_string(), "X-A: 1".to_string()]
                );
                assert_eq!(opened.resolved_url, "http://a/");
            }
            TransportOutcome::Failed(_) => panic!("expected the scripted reply"),
        }

        match mock.open(request("http://b/")) {
            TransportOutcome::Failed(failure) => assert!(failure.timed_out),
            TransportOutcome::Opened(_) => panic!("expected the scripted failure"),
        }

        let urls: Vec<_> = mock.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["http://a/".to_string(), "http://b/".to_string()]);
    }

    #[test]
    fn test_no_headers_reply_is_empty() {
        let mock = MockTransport::new();
        mock.push_reply(MockReply::no_headers(false));

        match mock.open(request("http://a/")) {
            TransportOutcome::Opened(opened) => {
                assert!(opened.raw_header_lines.is_empty());
                assert!(!opened.timed_out);
            }
            TransportOutcome::Failed(_) => panic!("expected an opened stream"),
        }
    }
}
