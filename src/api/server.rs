//! API server lifecycle: bind, spawn the axum server, shut down on signal.
//!
//! bind → spawn background task → return handle with shutdown channel.

use std::net::SocketAddr;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::api_router_with_context;
use crate::api::types::ApiContext;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Handle to a running API server.
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), std::io::Error>>,
}

impl ApiServer {
    /// Signal graceful shutdown. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Wait for the server task to finish.
    pub async fn wait(self) -> Result<(), ServerError> {
        self.task.await??;
        Ok(())
    }
}

/// Bind `addr` (port 0 picks an ephemeral port) and serve the API in a
/// background task. Each request carries its peer address as
/// `ConnectInfo<SocketAddr>`.
pub async fn start_server(ctx: ApiContext, addr: SocketAddr) -> Result<ApiServer, ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let addr = listener.local_addr()?;

    let app = api_router_with_context(ctx).into_make_service_with_connect_info::<SocketAddr>();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await;
        if let Err(e) = &result {
            tracing::error!("API server error: {e}");
        }
        tracing::info!("API server stopped");
        result
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use crate::api::types::RateLimiter;
    use crate::core_state::CoreState;

    fn test_context() -> ApiContext {
        ApiContext::new(Arc::new(CoreState::in_memory().unwrap()))
    }

    async fn raw_sign_in(addr: SocketAddr, forwarded: &str) -> String {
        let body = r#"{"email":"x@example.com","password":"whatever1"}"#;
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "POST /api/auth/signin HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\
             Content-Type: application/json\r\nX-Forwarded-For: {forwarded}\r\n\
             Content-Length: {}\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    async fn raw_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    fn localhost() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[tokio::test]
    async fn start_serve_and_stop() {
        let mut server = start_server(test_context(), localhost()).await.expect("server should start");
        assert!(server.addr.port() > 0);

        let response = raw_get(server.addr, "/api/health").await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");

        let response = raw_get(server.addr, "/nonexistent").await;
        assert!(response.starts_with("HTTP/1.1 404"), "{response}");

        server.shutdown();
        server.wait().await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let mut server = start_server(test_context(), localhost()).await.expect("server should start");
        server.shutdown();
        server.shutdown();
        server.wait().await.unwrap();
    }

    #[tokio::test]
    async fn credential_limit_keys_on_peer_address() {
        let mut ctx = test_context();
        ctx.rate_limiter = Arc::new(Mutex::new(RateLimiter::with_limits(1, 100)));
        let mut server = start_server(ctx, localhost()).await.unwrap();

        let first = raw_sign_in(server.addr, "198.51.100.1").await;
        assert!(first.starts_with("HTTP/1.1 401"), "{first}");
        let second = raw_sign_in(server.addr, "198.51.100.2").await;
        assert!(second.starts_with("HTTP/1.1 429"), "{second}");

        server.shutdown();
        server.wait().await.unwrap();
    }

    #[tokio::test]
    async fn binding_a_taken_port_fails() {
        let first = start_server(test_context(), localhost()).await.unwrap();
        let err = start_server(test_context(), first.addr).await.err().unwrap();
        assert!(matches!(err, ServerError::Bind { .. }));
    }
}
