//! trellis_web - Radix-trie routed HTTP/1.x server framework
//!
//! An embryonic HTTP/1.x framework built around two tightly coupled cores:
//!
//! - **A byte-driven request parser**: a character-level state machine that
//!   turns an arbitrary byte stream into a structured [`Request`] (method,
//!   URI, version, headers), reporting [`ParseOutcome::InProgress`],
//!   [`ParseOutcome::Accept`] or [`ParseOutcome::Reject`] after every byte.
//! - **A radix-trie route dispatcher**: registered path patterns with
//!   inline `<name>` placeholders are indexed in a compressed trie per
//!   method; resolving a request yields the ordered chain of every handler
//!   registered on the root-to-match path, plus the extracted placeholder
//!   bindings. Registering at `/` therefore attaches middleware to every
//!   request, at `/api` to every `/api/...` request, and so on.
//!
//! Around the core sits a small tokio driver: an accept loop, a worker
//! pool, per-connection read/write deadlines, and canned `400`/`404`/`408`
//! replies for the failure paths.
//!
//! # Quick Start
//!
//! ```no_run
//! use trellis_web::{query_parser, Router, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut router = Router::new();
//!     router.use_handler("/", query_parser()).unwrap();
//!     router
//!         .get("/user/<id>", |ctx| {
//!             let id = ctx.param("id").unwrap_or("?").to_string();
//!             ctx.response
//!                 .status(StatusCode::Ok)
//!                 .header("content-type", "text/plain")
//!                 .body(format!("hello, {id}"));
//!         })
//!         .unwrap();
//!
//!     Server::builder()
//!         .listener(Server::bind("127.0.0.1:8080".parse().unwrap()).unwrap())
//!         .router(router)
//!         .build()
//!         .launch()
//!         .await;
//! }
//! ```
//!
//! # Scope
//!
//! HTTP/1.x request heads only: no HTTP/2 framing, no chunked
//! transfer-encoding reassembly, no body consumption, no keep-alive
//! policy (one request per connection), no TLS. Routes are registered
//! before launch; the router is read-only while serving.
pub(crate) mod http {
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod types;
    pub mod uri;
}
pub(crate) mod router {
    pub(crate) mod middleware;
    pub mod pattern;
    pub(crate) mod router_impl;
    pub mod trie;
}
pub(crate) mod server {
    pub(crate) mod connection;
    pub(crate) mod server_impl;
}
pub(crate) mod errors;
pub mod limits;

pub use crate::{
    http::{
        request::{ParseOutcome, ParserState, RejectCause, Request, RequestParser},
        response::Response,
        types::{Header, Headers, Method, StatusCode, Version},
        uri,
        uri::{make_query, urldecode, urlencode, DecodeError, Uri},
    },
    router::{
        middleware::query_parser,
        pattern,
        router_impl::{handler_fn, Context, Handler, HandlerFn, RegisterError, Route, Router},
        trie,
        trie::{NodeId, RadixTrie},
    },
    server::server_impl::{Server, ServerBuilder},
};

#[doc(hidden)]
#[cfg(test)]
pub(crate) mod tools {
    use std::str::from_utf8;

    #[inline]
    pub(crate) fn text(value: &[u8]) -> &str {
        from_utf8(value).unwrap()
    }

    #[inline]
    pub(crate) fn kvs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
