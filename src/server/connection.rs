// Connection handling module
// Accepts a single TCP connection and serves it on the local task set

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept and process a connection, checking limits and logging.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state, owns the active connection counter
/// * `shutdown` - Shutdown flag, switches the connection to graceful close
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    shutdown: &watch::Receiver<bool>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = state.active_connections.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            state.active_connections.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. \
                 Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);

    handle_connection(stream, peer_addr, Arc::clone(state), shutdown.clone());
}

/// Serve one connection in a spawned local task.
///
/// `performance.connection_timeout` bounds the wait for each request head
/// (0 disables it). A response that is already streaming is never cut off.
/// Once shutdown has been triggered the in-flight response completes and the
/// connection closes.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);
        let timeout_secs = state.config.performance.connection_timeout;

        let mut builder = http1::Builder::new();
        builder
            .keep_alive(state.config.performance.keep_alive)
            .timer(TokioTimer::new())
            .header_read_timeout(header_read_timeout(timeout_secs));

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handler::handle_request(req, peer_addr, Arc::clone(&service_state))
            }),
        );
        let mut conn = std::pin::pin!(conn);

        let mut draining = false;
        let result = loop {
            tokio::select! {
                res = conn.as_mut() => break res,
                _ = shutdown.wait_for(|stop| *stop), if !draining => {
                    // Finish the in-flight response, then close
                    draining = true;
                    conn.as_mut().graceful_shutdown();
                }
            }
        };

        match result {
            Ok(()) => {}
            Err(err) if err.is_timeout() => {
                logger::log_debug(&format!(
                    "[Connection] {peer_addr} sent no request within {timeout_secs} seconds"
                ));
            }
            Err(err) => logger::log_connection_error(&err),
        }

        state.active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Header read limit for `connection_timeout` seconds, `None` when 0
fn header_read_timeout(timeout_secs: u64) -> Option<Duration> {
    (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs))
}
