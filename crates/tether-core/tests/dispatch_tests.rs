//! Tests for routing completed requests to handlers.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tether_core::option::{with_host, with_port, with_response_handler};
use tether_core::{
    Classification, FailureKind, HttpMethod, RequestBody, Response, Session, TransportError,
    TransportFailure, UsageError,
};

use common::ScriptedTransport;

fn session(transport: &Arc<ScriptedTransport>) -> Session {
    Session::new(
        transport.clone(),
        [with_host("api.example.com"), with_port("443")],
    )
    .expect("Failed to create session")
}

#[test]
fn test_post_json_created() {
    let transport = ScriptedTransport::new();
    let session = session(&transport);
    let received = Arc::new(Mutex::new(Vec::new()));

    let sink = received.clone();
    session
        .request("/users")
        .with_json_body(&serde_json::json!({"name": "a"}))
        .unwrap()
        .on_json_response(move |created| {
            sink.lock().push((created.status(), created.json().clone()));
            created.respond().unwrap();
        })
        .unwrap()
        .post()
        .unwrap();

    let (request, completion) = transport.next();
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url, "https://api.example.com/users");
    assert_eq!(
        request.body,
        RequestBody::Json(serde_json::json!({"name": "a"}))
    );
    completion.succeed(tether_core::RawResponse::new(201, "Created", r#"{"id":1}"#));

    assert_eq!(
        *received.lock(),
        vec![(201, serde_json::json!({"id": 1}))]
    );
    assert!(session.is_settled());
}

#[test]
fn test_empty_response_fires_empty_handler_only() {
    let transport = ScriptedTransport::new();
    let session = session(&transport);
    let empty = Arc::new(AtomicUsize::new(0));
    let json = Arc::new(AtomicUsize::new(0));

    let (e, j) = (empty.clone(), json.clone());
    session
        .request("/users/1")
        .on_empty_response(move |r| {
            assert_eq!(r.status(), 204);
            assert!(r.is_empty());
            e.fetch_add(1, Ordering::SeqCst);
            r.respond().unwrap();
        })
        .unwrap()
        .on_json_response(move |r| {
            j.fetch_add(1, Ordering::SeqCst);
            r.respond().unwrap();
        })
        .unwrap()
        .get()
        .unwrap();

    transport.respond(204, "No Content", "");
    assert_eq!(empty.load(Ordering::SeqCst), 1);
    assert_eq!(json.load(Ordering::SeqCst), 0);
}

#[test]
fn test_generic_handler_runs_before_json_handler() {
    let transport = ScriptedTransport::new();
    let session = session(&transport);
    let order = Arc::new(Mutex::new(Vec::new()));

    let (generic, json) = (order.clone(), order.clone());
    session
        .request("/items")
        .on_json_response(move |r| {
            json.lock().push("json");
            r.respond().unwrap();
        })
        .unwrap()
        .on_response(move |r| {
            generic.lock().push("generic");
            r.respond().unwrap();
        })
        .unwrap()
        .get()
        .unwrap();

    transport.respond(200, "OK", r#"[1, 2, 3]"#);
    assert_eq!(*order.lock(), vec!["generic", "json"]);
}

#[test]
fn test_json_handler_does_not_fire_for_text() {
    let transport = ScriptedTransport::new();
    let session = session(&transport);
    let generic = Arc::new(Mutex::new(None));
    let json = Arc::new(AtomicUsize::new(0));

    let (g, j) = (generic.clone(), json.clone());
    session
        .request("/page")
        .on_response(move |r| {
            *g.lock() = Some((r.classification().clone(), r.body().to_string()));
            r.respond().unwrap();
        })
        .unwrap()
        .on_json_response(move |r| {
            j.fetch_add(1, Ordering::SeqCst);
            r.respond().unwrap();
        })
        .unwrap()
        .get()
        .unwrap();

    transport.respond(200, "OK", "<html></html>");
    assert_eq!(
        generic.lock().take(),
        Some((Classification::Unclassified, "<html></html>".to_string()))
    );
    assert_eq!(json.load(Ordering::SeqCst), 0);
}

#[test]
fn test_error_status_is_a_response() {
    let transport = ScriptedTransport::new();
    let session = session(&transport);
    let errors = Arc::new(AtomicUsize::new(0));
    let status = Arc::new(Mutex::new(None));

    let (e, s) = (errors.clone(), status.clone());
    session
        .request("/missing")
        .on_error(move |_| {
            e.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap()
        .on_json_response(move |r| {
            *s.lock() = Some((r.status(), r.status_text().to_string(), r.is_client_error()));
            r.respond().unwrap();
        })
        .unwrap()
        .get()
        .unwrap();

    transport.respond(404, "Not Found", r#"{"error":"missing"}"#);
    assert_eq!(errors.load(Ordering::SeqCst), 0);
    assert_eq!(
        status.lock().take(),
        Some((404, "Not Found".to_string(), true))
    );
}

#[test]
fn test_default_handler_runs_exactly_once() {
    let transport = ScriptedTransport::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let session = Session::new(
        transport.clone(),
        [
            with_host("api.example.com"),
            with_response_handler(move |r: Response| {
                c.fetch_add(1, Ordering::SeqCst);
                r.respond().unwrap();
            }),
        ],
    )
    .unwrap();

    session.request("/ping").get().unwrap();
    transport.respond(200, "OK", r#"{"pong":true}"#);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_default_handler_skipped_when_request_has_one() {
    let transport = ScriptedTransport::new();
    let fallback = Arc::new(AtomicUsize::new(0));
    let own = Arc::new(AtomicUsize::new(0));
    let f = fallback.clone();
    let session = Session::new(
        transport.clone(),
        [
            with_host("api.example.com"),
            with_response_handler(move |r: Response| {
                f.fetch_add(1, Ordering::SeqCst);
                r.respond().unwrap();
            }),
        ],
    )
    .unwrap();

    let o = own.clone();
    session
        .request("/ping")
        .on_empty_response(move |r| {
            o.fetch_add(1, Ordering::SeqCst);
            r.respond().unwrap();
        })
        .unwrap()
        .get()
        .unwrap();
    transport.respond(200, "OK", "");

    assert_eq!(own.load(Ordering::SeqCst), 1);
    assert_eq!(fallback.load(Ordering::SeqCst), 0);
}

#[test]
fn test_error_handler_does_not_suppress_default() {
    let transport = ScriptedTransport::new();
    let fallback = Arc::new(AtomicUsize::new(0));
    let f = fallback.clone();
    let session = Session::new(
        transport.clone(),
        [
            with_host("api.example.com"),
            with_response_handler(move |r: Response| {
                f.fetch_add(1, Ordering::SeqCst);
                r.respond().unwrap();
            }),
        ],
    )
    .unwrap();

    session
        .request("/ping")
        .on_error(|_| {})
        .unwrap()
        .get()
        .unwrap();
    transport.respond(200, "OK", "pong");
    assert_eq!(fallback.load(Ordering::SeqCst), 1);
}

#[test]
fn test_transport_failure_reaches_on_error() {
    let transport = ScriptedTransport::new();
    let session = session(&transport);
    let failure = Arc::new(Mutex::new(None));

    let sink = failure.clone();
    session
        .request("/users")
        .on_error(move |err: TransportError| {
            *sink.lock() = Some((err.kind(), err.verbose().to_string(), err.request().url.clone()));
        })
        .unwrap()
        .get()
        .unwrap();

    transport.fail(TransportFailure::new(
        FailureKind::Connect,
        "connection refused",
    ));

    let (kind, verbose, url) = failure.lock().take().expect("on_error did not run");
    assert_eq!(kind, FailureKind::Connect);
    assert!(!verbose.is_empty());
    assert_eq!(url, "https://api.example.com/users");
    assert!(session.is_settled());
}

#[test]
fn test_transport_failure_without_on_error_is_dropped() {
    let transport = ScriptedTransport::new();
    let session = session(&transport);
    let responses = Arc::new(AtomicUsize::new(0));

    let r = responses.clone();
    session
        .request("/users")
        .on_response(move |resp| {
            r.fetch_add(1, Ordering::SeqCst);
            resp.respond().unwrap();
        })
        .unwrap()
        .get()
        .unwrap();

    transport.fail(TransportFailure::new(FailureKind::Timeout, "timed out"));
    assert_eq!(responses.load(Ordering::SeqCst), 0);
    assert_eq!(transport.pending(), 0);
    assert!(session.is_settled());
}

#[test]
fn test_dropped_completion_is_abandoned() {
    let transport = ScriptedTransport::new();
    let session = session(&transport);
    let kind = Arc::new(Mutex::new(None));

    let k = kind.clone();
    session
        .request("/users")
        .on_error(move |err| {
            *k.lock() = Some(err.kind());
        })
        .unwrap()
        .get()
        .unwrap();

    let (_request, completion) = transport.next();
    drop(completion);
    assert_eq!(kind.lock().take(), Some(FailureKind::Abandoned));
    assert!(session.is_settled());
}

#[test]
fn test_second_respond_is_rejected() {
    let transport = ScriptedTransport::new();
    let session = session(&transport);
    let second = Arc::new(Mutex::new(None));

    let s = second.clone();
    session
        .request("/users")
        .on_response(move |r| {
            r.respond().unwrap();
            *s.lock() = Some(r.respond());
        })
        .unwrap()
        .get()
        .unwrap();

    transport.respond(200, "OK", "");
    assert!(matches!(
        second.lock().take(),
        Some(Err(UsageError::AlreadyResponded { .. }))
    ));
}

#[test]
fn test_response_headers_are_unsupported() {
    let transport = ScriptedTransport::new();
    let session = session(&transport);
    let feature = Arc::new(Mutex::new(None));

    let f = feature.clone();
    session
        .request("/users")
        .on_response(move |r| {
            *f.lock() = r.headers().err().map(|e| e.feature());
            r.respond().unwrap();
        })
        .unwrap()
        .get()
        .unwrap();

    transport.respond(200, "OK", "");
    assert_eq!(feature.lock().take(), Some("response headers"));
}

#[test]
fn test_handlers_can_dispatch_follow_up_requests() {
    let transport = ScriptedTransport::new();
    let session = session(&transport);
    let done = Arc::new(AtomicUsize::new(0));

    let follow_up = session.clone();
    let d = done.clone();
    session
        .request("/login")
        .on_json_response(move |r| {
            let token = r.json()["token"].as_str().unwrap_or_default().to_string();
            r.respond().unwrap();
            follow_up
                .request("/me")
                .with_header("Authorization", format!("Bearer {token}"))
                .unwrap()
                .on_empty_response(move |me| {
                    d.fetch_add(1, Ordering::SeqCst);
                    me.respond().unwrap();
                })
                .unwrap()
                .get()
                .unwrap();
        })
        .unwrap()
        .post()
        .unwrap();

    transport.respond(200, "OK", r#"{"token":"abc"}"#);
    assert_eq!(session.outstanding(), 1);

    let request = transport.respond(200, "OK", "");
    assert_eq!(request.header("authorization"), Some("Bearer abc"));
    assert_eq!(done.load(Ordering::SeqCst), 1);
    assert!(session.is_settled());
}
