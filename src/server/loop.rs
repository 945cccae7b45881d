// Server loop module
// Accepts connections until shutdown is signalled, then waits for in-flight
// connections to drain

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::Instant;

use super::connection::{accept_connection, ListenerKind};
use super::signal::SignalHandler;
use crate::config::AppState;
use crate::logger;

/// How often the drain phase re-checks the active connection count
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Configuration for server loop behavior
pub struct ServerLoopConfig {
    pub kind: ListenerKind,
    pub signals: Arc<SignalHandler>,
    /// Upper bound on waiting for open connections after shutdown
    pub drain_timeout: Duration,
}

/// Accept loop shared by the file and stats listeners.
///
/// Returns once shutdown has been requested and either every connection
/// accepted by this loop has finished or `drain_timeout` has elapsed.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    config: ServerLoopConfig,
) {
    // Register interest before checking the flag so a signal arriving in between is not lost
    let shutdown = config.signals.shutdown.notified();
    tokio::pin!(shutdown);
    shutdown.as_mut().enable();

    if !config.signals.is_shutdown_requested() {
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accept_result = listener.accept() => match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections, config.kind);
                    }
                    Err(e) => {
                        let message = format!("Failed to accept connection: {e}");
                        match config.kind {
                            ListenerKind::Files => logger::log_error(&message),
                            ListenerKind::Stats => logger::log_api_error(&message),
                        }
                    }
                },
            }
        }
    }

    // Stop accepting before draining
    drop(listener);
    drain(&active_connections, config.drain_timeout).await;
}

/// Wait until no connections remain open or the deadline passes
async fn drain(active_connections: &AtomicUsize, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = active_connections.load(Ordering::SeqCst);
        if remaining == 0 {
            return;
        }
        if Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Shutdown with {remaining} connection(s) still open"
            ));
            return;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_returns_when_idle() {
        let active = AtomicUsize::new(0);
        let started = Instant::now();
        drain(&active, Duration::from_secs(5)).await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_drain_gives_up_at_deadline() {
        let active = AtomicUsize::new(2);
        let started = Instant::now();
        drain(&active, Duration::from_millis(120)).await;
        assert!(started.elapsed() >= Duration::from_millis(120));
        assert_eq!(active.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_drain_waits_for_connections() {
        let active = Arc::new(AtomicUsize::new(1));
        let closer = Arc::clone(&active);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            closer.store(0, Ordering::SeqCst);
        });
        drain(&active, Duration::from_secs(5)).await;
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    async fn roundtrip(addr: std::net::SocketAddr, request: &str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_serves_files_and_stats_until_shutdown() {
        use crate::config::{Config, Overrides};
        use crate::server::create_reusable_listener;
        use crate::stats::FsCounters;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "hello").unwrap();
        let overrides = Overrides {
            dir: Some(dir.path().to_path_buf()),
            ..Overrides::default()
        };
        let config = Config::load_from("does-not-exist/fsd", &overrides).unwrap();
        let state = Arc::new(AppState::new(config, Arc::new(FsCounters::new())).unwrap());
        let signals = Arc::new(SignalHandler::new());

        let mut tasks = Vec::new();
        let mut addrs = Vec::new();
        for kind in [ListenerKind::Files, ListenerKind::Stats] {
            let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
            addrs.push(listener.local_addr().unwrap());
            tasks.push(tokio::spawn(start_server_loop(
                listener,
                Arc::clone(&state),
                Arc::new(AtomicUsize::new(0)),
                ServerLoopConfig {
                    kind,
                    signals: Arc::clone(&signals),
                    drain_timeout: Duration::from_secs(2),
                },
            )));
        }

        let response = roundtrip(
            addrs[0],
            "GET /hello.txt HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("\r\n\r\nhello"));

        let response = roundtrip(
            addrs[1],
            "GET /debug/vars HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("\"fsCalls\": 1"));
        assert!(response.contains("\"fsResponseBodyBytes\": 5"));

        signals.request_shutdown();
        for task in tasks {
            tokio::time::timeout(Duration::from_secs(5), task)
                .await
                .unwrap()
                .unwrap();
        }
    }
}
