//! Integration Tests for the Proxy
//!
//! Runs a real dispatcher against an in-process origin and checks full
//! request/response cycles.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use caching_proxy::cache::CacheStore;
use caching_proxy::http::{build_request_header, read_request};
use caching_proxy::{Dispatcher, ProxyState};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

// == Helper Functions ==

/// In-process origin returning a fixed response per path.
struct Origin {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

async fn spawn_origin(route: fn(&str) -> Vec<u8>) -> Origin {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));

    let (count, seen) = (connections.clone(), requests.clone());
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            count.fetch_add(1, Ordering::SeqCst);
            let seen = seen.clone();
            tokio::spawn(async move {
                let mut stream = BufReader::new(stream);
                let mut head = String::new();
                loop {
                    let mut line = String::new();
                    let n = stream.read_line(&mut line).await.unwrap();
                    head.push_str(&line);
                    if n == 0 || line == "\r\n" {
                        break;
                    }
                }
                let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                seen.lock().await.push(head);
                stream.get_mut().write_all(&route(&path)).await.unwrap();
            });
        }
    });

    Origin {
        addr,
        connections,
        requests,
    }
}

async fn spawn_proxy(slots: usize, limit: usize) -> (SocketAddr, ProxyState) {
    let state = ProxyState::new(CacheStore::new(slots, limit));
    let dispatcher = Dispatcher::bind("127.0.0.1:0".parse().unwrap(), state.clone())
        .await
        .unwrap();
    let addr = dispatcher.local_addr().unwrap();
    tokio::spawn(dispatcher.run());
    (addr, state)
}

async fn fetch(proxy: SocketAddr, request: &str) -> Vec<u8> {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("proxy should finish the response")
        .unwrap();
    response
}

fn get(origin: SocketAddr, path: &str) -> String {
    format!("GET http://127.0.0.1:{}{} HTTP/1.0\r\n\r\n", origin.port(), path)
}

fn html_page(path: &str) -> Vec<u8> {
    let body = format!("<html>{path}</html>");
    format!(
        "HTTP/1.0 200 OK\r\nContent-type: text/html\r\nContent-length: {}\r\n\r\n{}",
        body.len(),
        body
    )
    .into_bytes()
}

fn sized_page(_path: &str) -> Vec<u8> {
    let mut response = b"HTTP/1.0 200 OK\r\n\r\n".to_vec();
    response.resize(500, b'z');
    response
}

fn binary_page(_path: &str) -> Vec<u8> {
    let mut response = b"HTTP/1.0 200 OK\r\nContent-type: application/octet-stream\r\n\r\n".to_vec();
    // Long runs without newlines and arbitrary bytes
    response.extend((0..40_000u32).map(|i| (i % 251) as u8));
    response
}

// == Relay ==

#[tokio::test]
async fn test_response_relayed_byte_for_byte() {
    let origin = spawn_origin(binary_page).await;
    let (proxy, _) = spawn_proxy(10, 102_400).await;

    let through_proxy = fetch(proxy, &get(origin.addr, "/blob")).await;

    let mut direct = TcpStream::connect(origin.addr).await.unwrap();
    direct
        .write_all(b"GET /blob HTTP/1.0\r\n\r\n")
        .await
        .unwrap();
    let mut direct_bytes = Vec::new();
    direct.read_to_end(&mut direct_bytes).await.unwrap();

    assert_eq!(through_proxy, direct_bytes);
}

#[tokio::test]
async fn test_outbound_request_headers() {
    let origin = spawn_origin(html_page).await;
    let (proxy, _) = spawn_proxy(10, 102_400).await;

    let request = format!(
        "GET http://127.0.0.1:{}/a.html HTTP/1.1\r\n\
         User-Agent: curl/8.0\r\n\
         Accept: text/html\r\n\
         Connection: keep-alive\r\n\
         \r\n",
        origin.addr.port()
    );
    fetch(proxy, &request).await;

    let seen = origin.requests.lock().await;
    let lines: Vec<&str> = seen[0].split("\r\n").collect();
    assert_eq!(lines[0], "GET /a.html HTTP/1.0");
    assert_eq!(lines[1], "Host: 127.0.0.1");
    assert_eq!(lines[2], "Connection: close");
    assert_eq!(lines[3], "Proxy-Connection: close");
    assert!(lines[4].starts_with("User-Agent: Mozilla/5.0"));
    assert_eq!(lines[5], "Accept: text/html");
    assert_eq!(lines[6], "");
}

#[tokio::test]
async fn test_synthesized_host_for_absolute_target() {
    let raw = b"GET http://example.test:8080/a.html HTTP/1.0\r\n\r\n";
    let mut reader = &raw[..];

    let request = read_request(&mut reader).await.unwrap();

    assert_eq!(request.host, "example.test");
    assert_eq!(request.port, 8080);
    assert_eq!(request.path, "/a.html");
    let outbound = build_request_header(&request);
    assert!(outbound.starts_with("GET /a.html HTTP/1.0\r\nHost: example.test\r\n"));
}

// == Caching ==

#[tokio::test]
async fn test_repeat_request_served_from_cache() {
    let origin = spawn_origin(sized_page).await;
    let (proxy, state) = spawn_proxy(10, 102_400).await;

    let first = fetch(proxy, &get(origin.addr, "/page.html")).await;
    let second = fetch(proxy, &get(origin.addr, "/page.html")).await;

    assert_eq!(first.len(), 500);
    assert_eq!(first, second);
    assert_eq!(origin.connections.load(Ordering::SeqCst), 1);

    let stats = state.cache.stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.admissions, 1);
}

#[tokio::test]
async fn test_oversize_response_not_cached() {
    let origin = spawn_origin(binary_page).await;
    let (proxy, state) = spawn_proxy(10, 1024).await;

    fetch(proxy, &get(origin.addr, "/blob")).await;
    fetch(proxy, &get(origin.addr, "/blob")).await;

    assert_eq!(origin.connections.load(Ordering::SeqCst), 2);
    assert!(state.cache.is_empty().await);
}

#[tokio::test]
async fn test_lru_entry_refetched_after_eviction() {
    let origin = spawn_origin(html_page).await;
    let (proxy, _) = spawn_proxy(2, 102_400).await;

    fetch(proxy, &get(origin.addr, "/one")).await;
    fetch(proxy, &get(origin.addr, "/two")).await;
    fetch(proxy, &get(origin.addr, "/one")).await; // hit, /two is now oldest
    fetch(proxy, &get(origin.addr, "/three")).await; // evicts /two
    assert_eq!(origin.connections.load(Ordering::SeqCst), 3);

    fetch(proxy, &get(origin.addr, "/one")).await; // still cached
    assert_eq!(origin.connections.load(Ordering::SeqCst), 3);

    let refetched = fetch(proxy, &get(origin.addr, "/two")).await;
    assert_eq!(refetched, html_page("/two"));
    assert_eq!(origin.connections.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_cache_key_ignores_host() {
    // Known limitation: keys are path-only, so origins sharing a path collide
    let first_origin = spawn_origin(html_page).await;
    let second_origin = spawn_origin(sized_page).await;
    let (proxy, _) = spawn_proxy(10, 102_400).await;

    let from_first = fetch(proxy, &get(first_origin.addr, "/shared")).await;
    let from_second = fetch(proxy, &get(second_origin.addr, "/shared")).await;

    assert_eq!(from_first, from_second);
    assert_eq!(second_origin.connections.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_concurrent_clients() {
    let origin = spawn_origin(html_page).await;
    let (proxy, _) = spawn_proxy(10, 102_400).await;

    let clients: Vec<_> = (0..20)
        .map(|i| {
            let request = get(origin.addr, &format!("/page{}", i % 5));
            tokio::spawn(async move { (i, fetch(proxy, &request).await) })
        })
        .collect();

    for client in clients {
        let (i, response) = client.await.unwrap();
        assert_eq!(response, html_page(&format!("/page{}", i % 5)));
    }
}

// == Errors ==

#[tokio::test]
async fn test_post_gets_501() {
    let (proxy, _) = spawn_proxy(10, 102_400).await;

    let request = "POST / HTTP/1.0\r\nContent-length: 0\r\n\r\n";
    let response = String::from_utf8(fetch(proxy, request).await).unwrap();

    assert!(response.starts_with("HTTP/1.0 501 Not Implemented\r\n"));
    assert!(response.contains("Content-type: text/html\r\n"));
    assert!(response.contains("<p>Proxy does not implement this method: POST"));
}

#[tokio::test]
async fn test_unreachable_origin_then_recovery() {
    let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_port = closed.local_addr().unwrap().port();
    drop(closed);

    let origin = spawn_origin(html_page).await;
    let (proxy, _) = spawn_proxy(10, 102_400).await;

    let failed = String::from_utf8(
        fetch(proxy, &format!("GET http://127.0.0.1:{dead_port}/x HTTP/1.0\r\n\r\n")).await,
    )
    .unwrap();
    assert!(failed.starts_with("HTTP/1.0 404 Not Found\r\n"));

    // The dispatcher keeps serving other clients
    let ok = fetch(proxy, &get(origin.addr, "/x")).await;
    assert_eq!(ok, html_page("/x"));
}
