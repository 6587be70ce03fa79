//! Server configuration limits and timeouts.
//!
//! Defaults are intentionally conservative: a slow or hostile client can
//! hold a connection only until its read deadline fires, and an oversized
//! request head is cut off long before it exhausts memory.
//!
//! # Examples
//!
//! ```no_run
//! use trellis_web::{limits::{ConnLimits, ServerLimits}, Router, Server};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut router = Router::new();
//!     router.get("/", |ctx| { ctx.response.body("hi"); }).unwrap();
//!
//!     Server::builder()
//!         .listener(Server::bind("127.0.0.1:8080".parse().unwrap()).unwrap())
//!         .router(router)
//!         .server_limits(ServerLimits {
//!             workers: 16,
//!             ..ServerLimits::default()
//!         })
//!         .connection_limits(ConnLimits {
//!             socket_read_timeout: Duration::from_secs(2),
//!             ..ConnLimits::default()
//!         })
//!         .build()
//!         .launch()
//!         .await;
//! }
//! ```

use std::time::Duration;

/// How a connection worker waits when the pending-connection queue is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Yield back to the runtime between polls. Lowest latency, busier.
    Yield,
    /// Sleep a fixed interval between polls. Calmer, adds up to that
    /// interval of accept latency.
    Sleep(Duration),
}

/// Server-level concurrency and queueing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerLimits {
    /// Number of connection workers spawned at startup. Each worker owns
    /// one parser/request/response set and serves one connection at a time.
    pub workers: usize,

    /// Upper bound on accepted-but-unserved connections. Beyond it, new
    /// connections receive `503 Service Unavailable` and are closed.
    pub max_pending_connections: usize,

    /// Worker behavior on an empty queue.
    pub wait_strategy: WaitStrategy,
}

impl Default for ServerLimits {
    fn default() -> Self {
        ServerLimits {
            workers: 8,
            max_pending_connections: 1024,
            wait_strategy: WaitStrategy::Yield,
        }
    }
}

/// Per-connection I/O limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnLimits {
    /// Deadline for each socket read while the request head is incomplete.
    /// On expiry the driver answers `408 Request Timeout` without invoking
    /// the router.
    pub socket_read_timeout: Duration,

    /// Deadline for writing the response.
    pub socket_write_timeout: Duration,

    /// Upper bound on the request head (request line plus headers). Beyond
    /// it the driver answers `431`.
    pub max_head_bytes: usize,
}

impl Default for ConnLimits {
    fn default() -> Self {
        ConnLimits {
            socket_read_timeout: Duration::from_secs(10),
            socket_write_timeout: Duration::from_secs(10),
            max_head_bytes: 16 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let server = ServerLimits::default();
        assert!(server.workers > 0);
        assert!(server.max_pending_connections >= server.workers);
        assert_eq!(server.wait_strategy, WaitStrategy::Yield);

        let conn = ConnLimits::default();
        assert!(conn.socket_read_timeout > Duration::ZERO);
        assert!(conn.socket_write_timeout > Duration::ZERO);
        assert!(conn.max_head_bytes >= 1024);
    }
}
