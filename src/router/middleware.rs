//! Built-in middleware handlers.

use crate::{
    http::uri::make_query,
    router::router_impl::{handler_fn, HandlerFn},
};

/// Query-parser middleware: converts the request's raw query string into
/// the `uri_query` map read through
/// [`Request::query`](crate::Request::query).
///
/// Register it near the root so every request below gets the parsed map:
///
/// ```
/// use trellis_web::{query_parser, Router};
///
/// let mut router = Router::new();
/// router.use_handler("/", query_parser()).unwrap();
/// ```
pub fn query_parser() -> HandlerFn {
    handler_fn(|ctx| {
        ctx.request.uri_query = make_query(&ctx.request.uri.query);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        http::{
            request::{ParseOutcome, Request, RequestParser},
            response::Response,
        },
        router::router_impl::Context,
    };

    #[test]
    fn populates_uri_query() {
        let mut parser = RequestParser::new();
        let mut request = Request::new();
        let (_, outcome) = parser.feed(
            &mut request,
            b"GET /find?user=qwe&id=223&debug HTTP/1.1\r\n\r\n",
        );
        assert_eq!(outcome, ParseOutcome::Accept);

        let mut response = Response::new();
        let mut ctx = Context {
            request: &mut request,
            response: &mut response,
        };
        query_parser()(&mut ctx);

        assert_eq!(request.query("user"), Some("qwe"));
        assert_eq!(request.query("id"), Some("223"));
        assert_eq!(request.query("debug"), Some(""));
        assert_eq!(request.query("missing"), None);
    }

    #[test]
    fn empty_query_yields_empty_map() {
        let mut parser = RequestParser::new();
        let mut request = Request::new();
        parser.feed(&mut request, b"GET /plain HTTP/1.1\r\n\r\n");

        let mut response = Response::new();
        let mut ctx = Context {
            request: &mut request,
            response: &mut response,
        };
        query_parser()(&mut ctx);

        assert!(request.queries().is_empty());
    }
}
