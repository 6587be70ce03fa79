use crate::{
    errors::ErrorKind,
    http::types::Version,
    limits::{ConnLimits, ServerLimits, WaitStrategy},
    router::router_impl::Router,
    server::connection::HttpConnection,
};
use crossbeam::queue::SegQueue;
use std::{io, net::SocketAddr, sync::Arc};
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
    task::yield_now,
    time::sleep as tokio_sleep,
};
use tracing::{debug, info, warn};

const LISTEN_BACKLOG: i32 = 1024;

type TcpQueue = Arc<SegQueue<(TcpStream, SocketAddr)>>;

/// An HTTP server: an accept loop feeding a pool of connection workers.
///
/// Routes are registered on a [`Router`] up front; once
/// [`launch`](Server::launch) runs, the router is shared read-only across
/// every worker.
///
/// # Examples
///
/// ```no_run
/// use trellis_web::{Router, Server, StatusCode};
///
/// #[tokio::main]
/// async fn main() {
///     let mut router = Router::new();
///     router
///         .get("/hi", |ctx| {
///             ctx.response.status(StatusCode::Ok).body("Hello world!");
///         })
///         .unwrap();
///
///     Server::builder()
///         .listener(Server::bind("127.0.0.1:8080".parse().unwrap()).unwrap())
///         .router(router)
///         .build()
///         .launch()
///         .await;
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    stream_queue: TcpQueue,
    error_queue: TcpQueue,
    server_limits: ServerLimits,
}

impl Server {
    /// Creates a new builder for configuring the server instance.
    #[inline]
    pub fn builder() -> ServerBuilder {
        ServerBuilder {
            listener: None,
            router: None,
            server_limits: None,
            connection_limits: None,
        }
    }

    /// Builds a listener with `SO_REUSEADDR` and a deep backlog.
    ///
    /// Must be called from within a tokio runtime. Restart-friendly: a
    /// server can rebind its port while old connections linger in
    /// `TIME_WAIT`.
    pub fn bind(addr: SocketAddr) -> io::Result<TcpListener> {
        use socket2::{Domain, Protocol, Socket, Type};

        let domain = match addr {
            SocketAddr::V4(_) => Domain::IPV4,
            SocketAddr::V6(_) => Domain::IPV6,
        };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.listen(LISTEN_BACKLOG)?;
        socket.set_nonblocking(true)?;

        TcpListener::from_std(socket.into())
    }

    /// Starts accepting connections. Runs forever.
    pub async fn launch(self) {
        match self.listener.local_addr() {
            Ok(addr) => info!(%addr, "server launched"),
            Err(_) => info!("server launched"),
        }

        loop {
            let Ok(value) = self.listener.accept().await else {
                continue;
            };

            if self.stream_queue.len() < self.server_limits.max_pending_connections {
                self.stream_queue.push(value);
            } else {
                warn!(peer = %value.1, "pending-connection queue full");
                self.error_queue.push(value);
            }
        }
    }

    #[inline]
    async fn get_stream(queue: &TcpQueue, wait: &WaitStrategy) -> (TcpStream, SocketAddr) {
        loop {
            if let Some(value) = queue.pop() {
                return value;
            }

            match wait {
                WaitStrategy::Yield => yield_now().await,
                WaitStrategy::Sleep(time) => tokio_sleep(*time).await,
            }
        }
    }
}

/// Builder for configuring and creating [`Server`] instances.
pub struct ServerBuilder {
    listener: Option<TcpListener>,
    router: Option<Router>,
    server_limits: Option<ServerLimits>,
    connection_limits: Option<ConnLimits>,
}

impl ServerBuilder {
    /// Sets the TCP listener the server accepts on.
    ///
    /// **This is a required component.** See [`Server::bind`] for a
    /// reuse-address listener, or pass any `tokio::net::TcpListener`.
    #[inline(always)]
    pub fn listener(mut self, listener: TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Sets the router with every route already registered.
    ///
    /// **This is a required component.** The router becomes immutable once
    /// the server is built.
    #[inline(always)]
    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Overrides the server-level limits.
    #[inline(always)]
    pub fn server_limits(mut self, limits: ServerLimits) -> Self {
        self.server_limits = Some(limits);
        self
    }

    /// Overrides the per-connection limits.
    #[inline(always)]
    pub fn connection_limits(mut self, limits: ConnLimits) -> Self {
        self.connection_limits = Some(limits);
        self
    }

    /// Finalizes the builder, spawns the connection workers and constructs
    /// a [`Server`].
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when the `listener` or `router` method was not called.
    #[inline]
    #[track_caller]
    pub fn build(self) -> Server {
        let listener = self
            .listener
            .expect("The `listener` method must be called to create");
        let router = Arc::new(
            self.router
                .expect("The `router` method must be called to create"),
        );
        let server_limits = self.server_limits.unwrap_or_default();
        let conn_limits = self.connection_limits.unwrap_or_default();

        let stream_queue: TcpQueue = Arc::new(SegQueue::new());
        let error_queue: TcpQueue = Arc::new(SegQueue::new());

        for worker_id in 0..server_limits.workers.max(1) {
            Self::spawn_worker(
                worker_id,
                &stream_queue,
                &router,
                server_limits.wait_strategy,
                conn_limits,
            );
        }
        Self::spawn_alarmist(&error_queue, server_limits.wait_strategy, conn_limits);

        Server {
            listener,
            stream_queue,
            error_queue,
            server_limits,
        }
    }

    #[inline]
    fn spawn_worker(
        worker_id: usize,
        queue: &TcpQueue,
        router: &Arc<Router>,
        wait: WaitStrategy,
        conn_limits: ConnLimits,
    ) {
        let queue = Arc::clone(queue);
        let mut connection = HttpConnection::new(Arc::clone(router), conn_limits);

        tokio::spawn(async move {
            loop {
                let (mut stream, peer) = Server::get_stream(&queue, &wait).await;
                debug!(%peer, worker_id, "connection accepted");

                if let Err(error) = connection.run(&mut stream).await {
                    debug!(%peer, %error, "connection error");
                }
                let _ = stream.shutdown().await;
            }
        });
    }

    // Drains the overflow queue with canned 503 replies so clients fail
    // fast instead of hanging until their own timeout.
    #[inline]
    fn spawn_alarmist(queue: &TcpQueue, wait: WaitStrategy, conn_limits: ConnLimits) {
        let queue = Arc::clone(queue);

        tokio::spawn(async move {
            loop {
                let (mut stream, _) = Server::get_stream(&queue, &wait).await;

                let canned = ErrorKind::Overloaded.as_http(Version::Http11);
                let write = async {
                    let _ = stream.write_all(canned).await;
                    let _ = stream.shutdown().await;
                };
                tokio::select! {
                    biased;

                    _ = write => {}
                    _ = tokio_sleep(conn_limits.socket_write_timeout) => {},
                }
            }
        });
    }
}
