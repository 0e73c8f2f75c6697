//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use podsync_gateway::lifecycle::Shutdown;
use podsync_gateway::store::SqliteSyncStore;
use podsync_gateway::{GatewayConfig, HttpServer};

/// Start the gateway on an ephemeral port. The returned `Shutdown` must be
/// kept alive for the duration of the test.
pub async fn spawn_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let store = SqliteSyncStore::open(&config.store).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config, store).unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Gateway config with the store parked in a temp directory.
pub fn test_config(store_dir: &std::path::Path) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.store.path = store_dir.join("sync.db");
    config
}

/// Start a mock upstream answering every request with 200, the given extra
/// header lines and body bytes. Returns its address and a channel yielding
/// the raw request head per connection.
#[allow(dead_code)]
pub async fn start_upstream(
    headers: Vec<(&'static str, &'static str)>,
    body: Vec<u8>,
) -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (head_tx, head_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let headers = headers.clone();
                    let body = body.clone();
                    let head_tx = head_tx.clone();
                    tokio::spawn(async move {
                        let head = read_request_head(&mut socket).await;
                        let _ = head_tx.send(head);

                        let mut response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n",
                            body.len()
                        );
                        for (name, value) in &headers {
                            response.push_str(&format!("{name}: {value}\r\n"));
                        }
                        response.push_str("Connection: close\r\n\r\n");
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.write_all(&body).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, head_rx)
}

/// Start an upstream that accepts connections but never answers.
#[allow(dead_code)]
pub async fn start_hanging_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        drop(socket);
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request_head(socket: &mut TcpStream) -> String {
    let mut collected = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        match socket.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                collected.extend_from_slice(&buf[..n]);
                if collected.windows(4).any(|window| window == b"\r\n\r\n") {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    String::from_utf8_lossy(&collected).to_string()
}
