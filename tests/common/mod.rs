//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use capture_proxy::config::ProxyConfig;
use capture_proxy::Listener;

/// Requests received by a mock origin, one entry per connection.
pub type Received = Arc<Mutex<Vec<Vec<u8>>>>;

/// Format the fixed response a mock origin sends.
pub fn origin_response(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

/// Start a mock origin that reads one request head per connection, records
/// it, answers with `origin_response(body)` and closes.
pub async fn start_mock_origin(addr: SocketAddr, body: &'static str) -> Received {
    let listener = TcpListener::bind(addr).await.unwrap();
    let received: Received = Arc::default();
    let log = Arc::clone(&received);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let log = Arc::clone(&log);
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut chunk = [0u8; 512];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&chunk[..n]),
                    }
                }
                log.lock().unwrap().push(request);

                let _ = socket.write_all(origin_response(body).as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    received
}

/// Start the proxy on `addr`, capturing into `capture_dir`.
pub async fn start_proxy(addr: SocketAddr, capture_dir: &Path) {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = addr.to_string();
    config.capture.directory = capture_dir.to_path_buf();

    let listener = Listener::bind(&config.listener).await.unwrap();
    tokio::spawn(listener.run(Arc::new(config)));
}

/// Send `request`, half-close, and collect whatever comes back.
pub async fn exchange(proxy: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(request).await.unwrap();

    // an aborted session may reset the connection; that still counts as closed
    let _ = stream.shutdown().await;
    let mut response = Vec::new();
    let _ = stream.read_to_end(&mut response).await;
    response
}

/// Send `request` and read until the proxy closes, keeping our side open the
/// way ordinary HTTP clients do. Gives up after `limit`.
pub async fn exchange_keep_open(
    proxy: SocketAddr,
    request: &[u8],
    limit: Duration,
) -> Result<Vec<u8>, tokio::time::error::Elapsed> {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(limit, stream.read_to_end(&mut response))
        .await?
        .unwrap();
    Ok(response)
}

/// A `<id>_req` / `<id>_res` pair found on disk.
#[derive(Debug)]
pub struct CapturedPair {
    pub id: u64,
    pub request: Vec<u8>,
    pub response: Vec<u8>,
}

/// All capture pairs in `dir`, ordered by id.
pub fn captured_pairs(dir: &Path) -> Vec<CapturedPair> {
    let mut ids: Vec<u64> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| {
            let name = entry.unwrap().file_name().into_string().unwrap();
            name.strip_suffix("_req").and_then(|id| id.parse().ok())
        })
        .collect();
    ids.sort_unstable();

    ids.into_iter()
        .map(|id| CapturedPair {
            id,
            request: std::fs::read(dir.join(format!("{id}_req"))).unwrap(),
            response: std::fs::read(dir.join(format!("{id}_res"))).unwrap(),
        })
        .collect()
}

pub fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
