// Connection handling module
// Accepts a single TCP connection, enforces the connection cap and serves it
// with hyper's HTTP/1 implementation on its own task

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::api;
use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Which service a listener exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    /// The static file handler
    Files,
    /// The counters endpoint
    Stats,
}

/// Accept a connection, checking the `max_connections` cap for file listeners.
///
/// Rejected connections are closed immediately without a response.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
    kind: ListenerKind,
) {
    // Increment first, then check, so concurrent accepts cannot both slip under the cap
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if kind == ListenerKind::Files {
        if let Some(max_conn) = state.config.performance.max_connections {
            if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
                conn_counter.fetch_sub(1, Ordering::SeqCst);
                logger::log_warning(&format!(
                    "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
                ));
                drop(stream);
                return;
            }
        }
    }

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
        kind,
    );
}

/// Serve one connection on a spawned task, decrementing the counter when done
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
    kind: ListenerKind,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let timeout_secs = state.config.performance.connection_timeout;

        let mut builder = http1::Builder::new();
        builder.keep_alive(state.config.performance.keep_alive);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&service_state);
                async move {
                    match kind {
                        ListenerKind::Files => handler::handle_request(req, state, peer_addr).await,
                        ListenerKind::Stats => api::handle_stats_request(req, state).await,
                    }
                }
            }),
        );

        // Covers body streaming too; zero leaves the connection unbounded
        let result = if timeout_secs == 0 {
            Ok(conn.await)
        } else {
            tokio::time::timeout(Duration::from_secs(timeout_secs), conn).await
        };

        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                if kind == ListenerKind::Stats {
                    logger::log_api_error(&format!("Failed to serve connection: {err}"));
                } else {
                    logger::log_connection_error(&err);
                }
            }
            Err(_) => logger::log_warning(&format!(
                "Connection from {peer_addr} closed after {timeout_secs}s timeout"
            )),
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
