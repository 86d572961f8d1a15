// Server loop module
// Accepts connections until shutdown, then drains active connections

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Main accept loop
///
/// Must run inside a `LocalSet`: connections are spawned with
/// `spawn_local`. Returns once shutdown has been triggered and active
/// connections have finished or the grace period has elapsed.
pub async fn run(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let mut stop = shutdown.clone();

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &shutdown);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = stop.wait_for(|stop| *stop) => break,
        }
    }

    // Stop accepting before waiting on the connections already in flight
    drop(listener);

    let grace = Duration::from_secs(state.config.performance.shutdown_grace_period);
    drain_connections(&state, grace).await;
    Ok(())
}

/// Wait for the active connection count to reach zero, bounded by `grace`
async fn drain_connections(state: &AppState, grace: Duration) {
    logger::log_shutdown_started(state.connection_count());

    let deadline = tokio::time::Instant::now() + grace;
    while state.connection_count() > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }

    logger::log_shutdown_complete(state.connection_count());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, FileRoute};
    use crate::server::{create_reusable_listener, Shutdown};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn raw_request(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8_lossy(&response).into_owned()
    }

    fn range_request(path: &str, range: &str) -> String {
        format!("GET {path} HTTP/1.1\r\nHost: test\r\nRange: {range}\r\nConnection: close\r\n\r\n")
    }

    #[tokio::test]
    async fn test_serves_ranges_over_tcp_and_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("greeting.txt");
        std::fs::write(&file, b"hello range world").unwrap();

        let mut config = Config::load_from_toml("").unwrap();
        config.logging.access_log = false;
        config.performance.shutdown_grace_period = 1;
        config.routes.files.push(FileRoute {
            path: "/greeting".to_string(),
            file: file.display().to_string(),
        });

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap(), 16).unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(AppState::new(&config));
        let shutdown = Shutdown::new();

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let server = tokio::task::spawn_local(run(
                    listener,
                    Arc::clone(&state),
                    shutdown.subscribe(),
                ));

                let partial = raw_request(addr, &range_request("/greeting", "bytes=6-10")).await;
                assert!(partial.starts_with("HTTP/1.1 206 Partial Content"), "{partial}");
                assert!(partial.contains("content-range: bytes 6-10/17"), "{partial}");
                assert!(partial.ends_with("range"), "{partial}");

                let rejected = raw_request(addr, &range_request("/greeting", "bytes=17-20")).await;
                assert!(rejected.starts_with("HTTP/1.1 416"), "{rejected}");
                assert!(rejected.contains("content-range: bytes 17\r\n"), "{rejected}");

                shutdown.trigger();
                server.await.unwrap().unwrap();
            })
            .await;

        assert_eq!(state.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_slow_reader_gets_whole_body_past_header_timeout() {
        const SIZE: usize = 16 * 1024 * 1024;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("large.bin");
        std::fs::write(&file, vec![7u8; SIZE]).unwrap();

        let mut config = Config::load_from_toml("").unwrap();
        config.logging.access_log = false;
        config.performance.connection_timeout = 1;
        config.performance.shutdown_grace_period = 1;
        config.routes.files.push(FileRoute {
            path: "/large".to_string(),
            file: file.display().to_string(),
        });

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap(), 16).unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(AppState::new(&config));
        let shutdown = Shutdown::new();

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let server = tokio::task::spawn_local(run(
                    listener,
                    Arc::clone(&state),
                    shutdown.subscribe(),
                ));

                let mut stream = TcpStream::connect(addr).await.unwrap();
                let request = b"GET /large HTTP/1.1\r\nHost: test\r\n\
                    Range: bytes=0-\r\nConnection: close\r\n\r\n";
                stream.write_all(request).await.unwrap();

                // Read well past the 1 second header timeout
                let mut received = Vec::with_capacity(SIZE + 1024);
                let mut buf = vec![0u8; 64 * 1024];
                loop {
                    let n = stream.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    received.extend_from_slice(&buf[..n]);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }

                let head_end = received
                    .windows(4)
                    .position(|w| w == b"\r\n\r\n")
                    .unwrap()
                    + 4;
                let head = String::from_utf8_lossy(&received[..head_end]);
                assert!(head.starts_with("HTTP/1.1 206"), "{head}");
                assert!(head.contains(&format!("content-length: {SIZE}")), "{head}");
                assert_eq!(received.len() - head_end, SIZE);

                shutdown.trigger();
                server.await.unwrap().unwrap();
            })
            .await;
    }
}
