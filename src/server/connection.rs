use crate::{
    errors::ErrorKind,
    http::{
        request::{ParseOutcome, Request, RequestParser},
        response::Response,
    },
    limits::ConnLimits,
    router::router_impl::Router,
};
use std::{io, sync::Arc};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::sleep,
};
use tracing::debug;

const READ_CHUNK: usize = 4 * 1024;

/// One worker's connection state: parser, request and response are
/// allocated once and reset between connections.
///
/// The driver owns every suspension point; the parser and the router are
/// synchronous and deterministic. Each connection serves exactly one
/// request: read until the parser accepts or rejects, resolve, run the
/// chain, write, close.
pub(crate) struct HttpConnection {
    router: Arc<Router>,
    parser: RequestParser,
    request: Request,
    response: Response,
    conn_limits: ConnLimits,
    read_buf: Vec<u8>,
}

impl HttpConnection {
    pub(crate) fn new(router: Arc<Router>, conn_limits: ConnLimits) -> Self {
        Self {
            router,
            parser: RequestParser::new(),
            request: Request::new(),
            response: Response::new(),
            conn_limits,
            read_buf: vec![0; READ_CHUNK],
        }
    }

    /// Serves one connection. Core failures become their canned HTTP
    /// replies; only transport errors propagate.
    pub(crate) async fn run(&mut self, stream: &mut TcpStream) -> Result<(), io::Error> {
        match self.impl_run(stream).await {
            Ok(()) => Ok(()),
            Err(ErrorKind::Io(e)) => Err(e.0),
            Err(error) => {
                debug!(%error, "request failed");
                self.write_bytes(stream, error.as_http(self.request.version()))
                    .await
            }
        }
    }

    async fn impl_run(&mut self, stream: &mut TcpStream) -> Result<(), ErrorKind> {
        self.parser.reset();
        self.request.reset();
        self.response.reset();

        let mut head_bytes = 0;
        loop {
            let n = self.fill_buffer(stream).await?;
            if n == 0 {
                // Peer closed before completing a request head.
                return Ok(());
            }

            let (consumed, outcome) = {
                let chunk = &self.read_buf[..n];
                self.parser.feed(&mut self.request, chunk)
            };
            head_bytes += consumed;

            match outcome {
                ParseOutcome::Accept => break,
                ParseOutcome::Reject => {
                    return Err(if self.parser.malformed_escape() {
                        ErrorKind::MalformedEscape
                    } else {
                        ErrorKind::ParseReject(self.parser.reject_cause())
                    });
                }
                ParseOutcome::InProgress => {
                    if head_bytes > self.conn_limits.max_head_bytes {
                        return Err(ErrorKind::HeadTooLarge);
                    }
                }
            }
        }

        self.response.set_version(self.request.version());

        let route = self.router.resolve_request(&mut self.request);
        if route.is_empty() {
            return Err(ErrorKind::Unmatched);
        }
        route.run(&mut self.request, &mut self.response);

        let bytes = self.response.to_bytes();
        self.write_bytes(stream, &bytes).await?;
        Ok(())
    }

    async fn fill_buffer(&mut self, stream: &mut TcpStream) -> Result<usize, ErrorKind> {
        tokio::select! {
            biased;

            read_result = stream.read(&mut self.read_buf) => {
                read_result.map_err(ErrorKind::from)
            }
            _ = sleep(self.conn_limits.socket_read_timeout) => {
                Err(ErrorKind::DeadlineExpired)
            },
        }
    }

    async fn write_bytes(
        &self,
        stream: &mut TcpStream,
        response: &[u8],
    ) -> Result<(), io::Error> {
        tokio::select! {
            biased;

            result = stream.write_all(response) => result,
            _ = sleep(self.conn_limits.socket_write_timeout) => {
                Err(io::Error::new(io::ErrorKind::TimedOut, "write timeout"))
            },
        }
    }
}
