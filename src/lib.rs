//! # syncfetch
//!
//! A synchronous, fetch-style HTTP client with promise-like response
//! chaining:
//! - Declarative [`RequestConfig`] translated into transport parameters
//! - Raw status/header line interpretation with redirect detection
//! - A partially-immutable [`Response`] with single-consumption body
//!   readers (`text`, `json`, `blob`, `array_buffer`, `form_data`)
//! - Deterministic `then`/`catch`/`finally` chaining over the single,
//!   already-settled outcome
//! - Network failures absorbed into error-type responses, never thrown
//! - A [`Transport`] seam with a blocking reqwest implementation and a
//!   scripted mock for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use syncfetch::{fetch, FetchInit, HttpError};
//!
//! fn main() -> Result<(), HttpError> {
//!     let mut response = fetch(
//!         "https://example.com/api/items",
//!         Some(FetchInit::new().method("POST").body("payload")),
//!     );
//!
//!     if response.ok() {
//!         let items = response.json()?;
//!         println!("{}", items);
//!     } else {
//!         println!("{} {}", response.status(), response.status_text());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - `config` - Request configuration and fetch-style init options
//! - `headers` - Raw header block parsing
//! - `transport` - Transport seam and the blocking reqwest implementation
//! - `client` - Executor and `fetch`/`get`/`post` entry points
//! - `response` - Response surface, body readers, chaining contract
//! - `errors` - Error taxonomy
//! - `mocks` - Scripted transport for testing

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod headers;

// Transport boundary
pub mod transport;

// Executor and entry points
pub mod client;

// Response surface
pub mod response;

// Mocks for testing
pub mod mocks;

// Re-exports for convenience
pub use client::{fetch, get, post, HttpClient};
pub use config::{
    Body, FetchInit, HeaderEntry, Method, RequestConfig, DEFAULT_MAX_REDIRECTS,
    DEFAULT_PROTOCOL_VERSION,
};
pub use errors::{HttpError, HttpErrorKind, HttpResult};
pub use headers::{parse_header_lines, ParsedHeaders};
pub use response::{NumericLayout, OnFulfilled, OnRejected, OnSettled, Response, ResponseType};
pub use transport::{
    BodyStream, OpenedStream, ReqwestTransport, Transport, TransportFailure, TransportOutcome,
    TransportRequest,
};
