//! End-to-end pipeline tests against the scripted mock transport.

use serde_json::json;
use std::sync::Arc;
use syncfetch::mocks::{MockReply, MockTransport};
use syncfetch::{
    FetchInit, HttpClient, HttpErrorKind, RequestConfig, Response, ResponseType,
};

fn client_with(mock: &Arc<MockTransport>) -> HttpClient {
    HttpClient::with_transport(mock.clone())
}

#[test]
fn success_statuses_resolve() {
    let mock = Arc::new(MockTransport::new());
    for status in [200u16, 201, 204, 299] {
        mock.push_reply(MockReply::status(status));
    }
    let client = client_with(&mock);

    for _ in 0..4 {
        let response = client.execute(&RequestConfig::get("https://remote.example/x"));
        assert!(response.ok());
        assert_ne!(response.response_type(), ResponseType::Error);
        assert!(response.is_resolved());
    }
}

#[test]
fn fetch_post_scenario() {
    let mock = Arc::new(MockTransport::new());
    mock.push_reply(MockReply::status(201).header("X-A", "1"));
    let client = client_with(&mock);

    let response = client.fetch(
        "https://x/ok",
        Some(
            FetchInit::new()
                .method("POST")
                .headers(["X-A: 1"])
                .body("payload"),
        ),
    );

    assert_eq!(response.status(), 201);
    assert!(response.ok());
    assert!(!response.redirected());
    assert_eq!(response.response_type(), ResponseType::Cors);
    assert_eq!(response.headers().get("X-A"), Some("1"));

    let sent = mock.requests().remove(0);
    assert_eq!(sent.method, "POST");
    assert_eq!(sent.header_lines, vec!["X-A: 1".to_string()]);
    assert_eq!(sent.body.unwrap().as_ref(), b"payload");
}

#[test]
fn redirect_hops_set_the_flag() {
    let mock = Arc::new(MockTransport::new());
    mock.push_reply(
        MockReply::ok()
            .redirected_from(301)
            .resolved_url("https://remote.example/new"),
    );
    mock.push_reply(MockReply::ok());
    let client = client_with(&mock);

    let redirected = client.execute(&RequestConfig::get("https://remote.example/old"));
    assert!(redirected.redirected());
    assert_eq!(redirected.url(), "https://remote.example/new");

    let direct = client.execute(&RequestConfig::get("https://remote.example/old"));
    assert!(!direct.redirected());
}

#[test]
fn localhost_targets_classify_as_basic() {
    let mock = Arc::new(MockTransport::new());
    let client = client_with(&mock);

    let response = client.execute(&RequestConfig::get("http://localhost:9000/health"));
    assert_eq!(response.response_type(), ResponseType::Basic);
}

#[test]
fn empty_header_block_is_an_error_response() {
    let mock = Arc::new(MockTransport::new());
    mock.push_reply(MockReply::no_headers(false));
    mock.push_reply(MockReply::no_headers(true));
    let client = client_with(&mock);

    let response = client.execute(&RequestConfig::get("https://remote.example/x"));
    assert_eq!(response.response_type(), ResponseType::Error);
    assert_eq!(response.status(), 0);
    assert!(!response.ok());
    assert_eq!(response.status_text(), "network error");
    let reason = response.settled_reason().unwrap();
    assert_eq!(reason.kind(), HttpErrorKind::HeadersNotSent);

    let timed_out = client.execute(&RequestConfig::get("https://remote.example/x"));
    let reason = timed_out.settled_reason().unwrap();
    assert_eq!(reason.kind(), HttpErrorKind::Timeout);
    assert!(reason.message().to_lowercase().contains("timed out"));
}

#[test]
fn transport_timeout_reason_mentions_timed_out() {
    let mock = Arc::new(MockTransport::new());
    mock.push_failure(true, "deadline exceeded");
    let client = client_with(&mock);

    let response = client.execute(&RequestConfig::get("https://remote.example/slow"));
    assert_eq!(response.response_type(), ResponseType::Error);
    assert!(response.is_rejected());
    let reason = response.settled_reason().unwrap();
    assert!(reason.message().to_lowercase().contains("timed out"));
}

#[test]
fn connection_failure_is_absorbed_not_thrown() {
    let mock = Arc::new(MockTransport::new());
    mock.push_failure(false, "connection refused");
    let client = client_with(&mock);

    let mut response = client.execute(&RequestConfig::get("https://remote.example/down"));
    assert_eq!(response.response_type(), ResponseType::Error);

    // Body readers on the errored response raise, carrying diagnostics.
    let err = response.text().unwrap_err();
    assert_eq!(err.kind(), HttpErrorKind::ResponseUnusable);
    let config = err.config().unwrap();
    assert_eq!(config.url, "https://remote.example/down");
}

#[test]
fn get_appends_query_and_accept() {
    let mock = Arc::new(MockTransport::new());
    let client = client_with(&mock);

    client.get(
        "https://remote.example/search?page=1",
        Some(&[("q", "two words")]),
        None,
        Some("application/json"),
    );

    let sent = mock.requests().remove(0);
    assert_eq!(sent.method, "GET");
    assert_eq!(sent.url, "https://remote.example/search?page=1&q=two+words");
    assert_eq!(
        sent.header_lines,
        vec!["Accept: application/json".to_string()]
    );
}

#[test]
fn post_defaults_content_type_without_overriding() {
    let mock = Arc::new(MockTransport::new());
    let client = client_with(&mock);

    client.post(
        "https://remote.example/items",
        Some(&[("name", "widget")]),
        None,
        None,
    );
    let sent = mock.requests().remove(0);
    assert_eq!(sent.method, "POST");
    assert!(sent
        .header_lines
        .contains(&"Content-Type: application/x-www-form-urlencoded".to_string()));
    assert_eq!(sent.body.unwrap().as_ref(), b"name=widget");
}

#[test]
fn post_on_success_handler_runs_via_then() {
    let mock = Arc::new(MockTransport::new());
    mock.push_reply(MockReply::ok().json(&json!({"id": 9})));
    let client = client_with(&mock);

    let response = client.post(
        "https://remote.example/items",
        None,
        Some(Box::new(|r: &mut Response| r.json().ok())),
        None,
    );

    assert_eq!(response.settled_value(), Some(&json!({"id": 9})));
}

#[test]
fn chaining_selects_exactly_one_branch() {
    let mock = Arc::new(MockTransport::new());
    mock.push_reply(MockReply::ok().body("hello"));
    mock.push_failure(false, "refused");
    let client = client_with(&mock);

    let resolved = client
        .execute(&RequestConfig::get("https://remote.example/ok"))
        .then(|r| r.text().ok().map(serde_json::Value::String))
        .catch(|_| panic!("catch must not run on a resolved response"));
    assert_eq!(resolved.settled_value(), Some(&json!("hello")));

    let rejected = client
        .execute(&RequestConfig::get("https://remote.example/down"))
        .then(|_| panic!("then must not run on a rejected response"))
        .catch(|reason| reason);
    assert!(rejected.is_rejected());
}

#[test]
fn body_is_consumed_exactly_once_across_the_chain() {
    let mock = Arc::new(MockTransport::new());
    mock.push_reply(MockReply::ok().body("only once"));
    let client = client_with(&mock);

    let response = client
        .execute(&RequestConfig::get("https://remote.example/x"))
        .then(|r| {
            assert_eq!(r.text().unwrap(), "only once");
            None
        })
        .then(|r| {
            assert_eq!(r.text().unwrap_err().kind(), HttpErrorKind::BodyConsumed);
            None
        });

    assert!(response.body_used());
    response.finally(|r| assert!(r.body_used()));
}

#[test]
fn advisory_options_cross_the_transport_boundary() {
    let mock = Arc::new(MockTransport::new());
    let client = client_with(&mock);

    let mut config = RequestConfig::get("https://remote.example/opts");
    config.full_uri = true;
    config.protocol_version = 1.1;
    config.ignore_error_status = true;
    config.proxy = Some("http://proxy.internal:3128".to_string());
    config.timeout_seconds = Some(2.5);
    client.execute(&config);

    let sent = mock.requests().remove(0);
    assert!(sent.full_uri);
    assert_eq!(sent.protocol_version, 1.1);
    assert!(sent.ignore_error_status);
    assert_eq!(sent.proxy.as_deref(), Some("http://proxy.internal:3128"));
    assert_eq!(sent.timeout_seconds, Some(2.5));
}

#[test]
fn config_reuse_across_sequential_executions() {
    let mock = Arc::new(MockTransport::new());
    mock.push_reply(MockReply::status(200));
    mock.push_reply(MockReply::status(404));
    let client = client_with(&mock);

    let mut config = RequestConfig::get("https://remote.example/x");
    config.add_header("X-Attempt: 1");
    let first = client.execute(&config);
    assert!(first.ok());

    config.add_header("X-Attempt: 2");
    let second = client.execute(&config);
    assert!(!second.ok());
    assert!(second.is_resolved(), "an HTTP error is still a resolved response");

    let sent = mock.requests();
    assert_eq!(sent[0].header_lines, vec!["X-Attempt: 1".to_string()]);
    assert_eq!(sent[1].header_lines, vec!["X-Attempt: 2".to_string()]);
}
