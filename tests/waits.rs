//! Blocking waits against scripted remote behavior.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::json;

use conduit_driver::protocol::names;
use conduit_driver::{Client, Error, MemoryPeer, MemoryTransport, ObjectId, Page, UrlMatcher};

// ============================================================================
// Fixture
// ============================================================================

fn page() -> (Client, Page, MemoryPeer) {
    let (transport, peer) = MemoryTransport::pair();
    peer.respond_ok();
    let client = Client::builder()
        .transport(transport)
        .timeout(Duration::from_secs(5))
        .build()
        .expect("client");
    let page = client.attach_page(ObjectId::new("page@1"), None);
    (client, page, peer)
}

fn request_event(peer: &MemoryPeer, url: &str) {
    peer.push_event(
        "page@1",
        names::REQUEST,
        json!({ "request": { "url": url, "method": "GET", "resourceType": "fetch" } }),
    );
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_wait_for_request_skips_unmatched() {
    let (_client, page, peer) = page();
    let matcher = UrlMatcher::glob("**/api/*").expect("glob");

    let request = page
        .wait_for_request(&matcher, None, || {
            request_event(&peer, "https://example.com/style.css");
            request_event(&peer, "https://example.com/api/items");
            Ok(())
        })
        .expect("request");

    assert_eq!(request.url, "https://example.com/api/items");
    assert_eq!(request.resource_type, "fetch");
}

#[test]
fn test_wait_rejected_by_close() {
    let (_client, page, peer) = page();

    let err = page
        .wait_for_event(names::REQUEST, None, None, || {
            peer.push_event("page@1", names::CLOSE, json!({}));
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(err, Error::TargetClosed { .. }));
    assert!(page.is_closed());
}

#[test]
fn test_wait_rejected_by_crash() {
    let (_client, page, peer) = page();

    let err = page
        .wait_for_event(names::REQUEST, None, None, || {
            peer.push_event("page@1", names::CRASH, json!({}));
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(err, Error::Crashed { .. }));
    assert!(page.is_crashed());
}

#[test]
fn test_wait_for_close_is_not_rejected_by_close() {
    let (_client, page, peer) = page();

    page.wait_for_close(None, || {
        peer.push_event("page@1", names::CLOSE, json!({}));
        Ok(())
    })
    .expect("close");

    // Already closed: returns right away.
    page.wait_for_close(None, || Ok(())).expect("closed");
}

#[test]
fn test_wait_on_closed_page_fails_fast() {
    let (_client, page, peer) = page();
    peer.push_event("page@1", names::CLOSE, json!({}));
    page.wait_for_timeout(Duration::from_millis(10)).expect("dispatch");

    let started = Instant::now();
    let err = page
        .wait_for_event(names::REQUEST, None, None, || Ok(()))
        .unwrap_err();
    assert!(matches!(err, Error::TargetClosed { .. }));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_wait_rejected_by_connection_close() {
    let (client, page, peer) = page();

    let err = page
        .wait_for_event(names::REQUEST, None, None, || {
            peer.close();
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(err, Error::ConnectionClosed));
    assert!(client.connection().is_closed());
}

#[test]
fn test_wait_times_out() {
    let (_client, page, _peer) = page();

    let started = Instant::now();
    let err = page
        .wait_for_event(names::REQUEST, None, Some(Duration::from_millis(40)), || Ok(()))
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(started.elapsed() >= Duration::from_millis(40));
}

#[test]
fn test_action_error_skips_wait() {
    let (_client, page, _peer) = page();

    let err = page
        .wait_for_event(names::REQUEST, None, None, || {
            Err(Error::invalid_argument("bad selector"))
        })
        .unwrap_err();

    assert!(matches!(err, Error::InvalidArgument { .. }));
}

#[test]
fn test_wait_for_condition_set_by_listener() {
    let (_client, page, peer) = page();
    let seen = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&seen);
    page.on("console", move |_params| {
        flag.store(true, Ordering::SeqCst);
        Ok(())
    });

    peer.push_event("page@1", "console", json!({ "text": "ready" }));
    let flag = Arc::clone(&seen);
    page.wait_for_condition(move || flag.load(Ordering::SeqCst), None)
        .expect("condition");
}

#[test]
fn test_wait_for_condition_from_other_thread() {
    let (_client, page, _peer) = page();
    let ready = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&ready);
    let setter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        flag.store(true, Ordering::SeqCst);
    });

    let flag = Arc::clone(&ready);
    page.wait_for_condition(move || flag.load(Ordering::SeqCst), None)
        .expect("condition");
    setter.join().expect("setter");
}

#[test]
fn test_wait_for_timeout_dispatches_events() {
    let (_client, page, peer) = page();
    let seen = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&seen);
    page.on("console", move |_params| {
        flag.store(true, Ordering::SeqCst);
        Ok(())
    });
    peer.push_event("page@1", "console", json!({}));

    let started = Instant::now();
    page.wait_for_timeout(Duration::from_millis(30)).expect("timeout");
    assert!(started.elapsed() >= Duration::from_millis(30));
    assert!(seen.load(Ordering::SeqCst));
}
