//! Route registration and resolution.
//!
//! The router keeps one radix trie per method. A registration wraps its
//! handler list into a single composite [`Handler`] carrying a monotonically
//! assigned id, and stores it under `(method, pattern)`. Resolution
//! pattern-matches the request path through the trie, then walks from the
//! matched node back to the root so every registered ancestor participates
//! in the chain — this is how middleware attaches: a handler at `/` runs for
//! every request, a handler at `/api` for every `/api/...` request.
//!
//! Registration happens during startup only; a launched server shares the
//! router behind `Arc` and never mutates it.

use crate::{
    http::{request::Request, response::Response, types::Method},
    router::{
        pattern::balanced_brackets,
        trie::RadixTrie,
    },
};
use std::{error, fmt, sync::Arc};

// HANDLER

/// Signature of a route handler callable.
pub type HandlerFn = Arc<dyn Fn(&mut Context<'_>) + Send + Sync + 'static>;

/// Wraps a closure into a [`HandlerFn`].
#[inline]
pub fn handler_fn<F>(f: F) -> HandlerFn
where
    F: Fn(&mut Context<'_>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Everything a handler may touch while serving one request.
pub struct Context<'a> {
    pub request: &'a mut Request,
    pub response: &'a mut Response,
}

impl Context<'_> {
    /// Placeholder binding extracted by the router.
    #[inline]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.request.param(name)
    }

    /// Query-string value (requires the query-parser middleware).
    #[inline]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.request.query(name)
    }
}

/// The composite handler stored at one trie node.
///
/// Carries every callable of one registration under a single stable id.
/// Ids are assigned monotonically per router, so chains resolve in
/// deterministic registration order.
#[derive(Clone)]
pub struct Handler {
    id: u64,
    calls: Vec<HandlerFn>,
}

impl Handler {
    #[inline(always)]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Runs every callable of this registration in order.
    pub fn invoke(&self, ctx: &mut Context<'_>) {
        for call in &self.calls {
            call(ctx);
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({})", self.id)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Handler {}

// ROUTE

/// Result of resolving a request path: the root-to-leaf handler chain and
/// the placeholder bindings collected along the descent.
#[derive(Debug, Default)]
pub struct Route {
    chain: Vec<Handler>,
    params: Vec<(String, String)>,
}

impl Route {
    #[inline]
    fn empty() -> Self {
        Route::default()
    }

    /// Handlers in root-to-leaf order.
    #[inline]
    pub fn handlers(&self) -> &[Handler] {
        &self.chain
    }

    /// `(name, value)` bindings in descent order.
    #[inline]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// True when the path matched no registered pattern.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Invokes the whole chain against one request/response pair.
    pub fn run(&self, request: &mut Request, response: &mut Response) {
        let mut ctx = Context { request, response };
        for handler in &self.chain {
            handler.invoke(&mut ctx);
        }
    }
}

// ERRORS

/// Registration failures: programming errors reported at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    /// Pattern brackets (`<>`, `{}`, `[]`) do not balance.
    UnbalancedPattern(String),
    /// Pattern does not begin with `/`.
    UnrootedPattern(String),
    /// The exact pattern is already registered for this method.
    DuplicatePattern(String),
    /// `Method::Undetermined` cannot carry routes.
    UnroutableMethod,
}

impl error::Error for RegisterError {}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterError::UnbalancedPattern(p) => {
                write!(f, "route pattern has unbalanced brackets: {p:?}")
            }
            RegisterError::UnrootedPattern(p) => {
                write!(f, "route pattern must begin with '/': {p:?}")
            }
            RegisterError::DuplicatePattern(p) => {
                write!(f, "route pattern already registered: {p:?}")
            }
            RegisterError::UnroutableMethod => {
                write!(f, "routes cannot be registered for an undetermined method")
            }
        }
    }
}

// ROUTER

/// Per-method radix tries plus the router-scoped handler-id counter.
#[derive(Debug, Default)]
pub struct Router {
    tables: [RadixTrie<Handler>; Method::COUNT],
    next_id: u64,
}

impl Router {
    pub fn new() -> Self {
        Router {
            tables: std::array::from_fn(|_| RadixTrie::new()),
            next_id: 0,
        }
    }

    /// Registers a handler chain for `(method, pattern)`.
    ///
    /// The pattern must begin with `/` and have balanced brackets; the
    /// handler list becomes one composite handler with a fresh id.
    pub fn handle(
        &mut self,
        method: Method,
        pattern: &str,
        handlers: Vec<HandlerFn>,
    ) -> Result<(), RegisterError> {
        let handler = self.make_handler(handlers);
        self.register(method, pattern, handler)
    }

    /// Registers the same composite handler under each listed method.
    pub fn handle_all(
        &mut self,
        methods: &[Method],
        pattern: &str,
        handlers: Vec<HandlerFn>,
    ) -> Result<(), RegisterError> {
        let handler = self.make_handler(handlers);
        for &method in methods {
            self.register(method, pattern, handler.clone())?;
        }
        Ok(())
    }

    /// Registers a single GET handler.
    pub fn get<F>(&mut self, pattern: &str, f: F) -> Result<(), RegisterError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.handle(Method::Get, pattern, vec![handler_fn(f)])
    }

    /// Registers a single POST handler.
    pub fn post<F>(&mut self, pattern: &str, f: F) -> Result<(), RegisterError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.handle(Method::Post, pattern, vec![handler_fn(f)])
    }

    /// Registers a single PUT handler.
    pub fn put<F>(&mut self, pattern: &str, f: F) -> Result<(), RegisterError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.handle(Method::Put, pattern, vec![handler_fn(f)])
    }

    /// Registers a handler under every concrete method. This is the usual
    /// way to attach middleware such as the query parser.
    pub fn use_handler(&mut self, pattern: &str, handler: HandlerFn) -> Result<(), RegisterError> {
        self.handle_all(&Method::ALL, pattern, vec![handler])
    }

    /// Resolves a `(method, path)` pair into its handler chain.
    ///
    /// An unmatched path yields an empty route; the caller typically
    /// answers `404`.
    pub fn resolve(&self, method: Method, path: &str) -> Route {
        let Some(table_idx) = method.index() else {
            return Route::empty();
        };
        let table = &self.tables[table_idx];

        let mut params = Vec::new();
        let Some(found) = table.find_route(path, &mut params) else {
            return Route::empty();
        };

        let mut chain: Vec<Handler> = table
            .ancestors(found)
            .filter_map(|node| table.value(node).cloned())
            .collect();
        chain.reverse();

        Route { chain, params }
    }

    /// Resolves a parsed request and populates its `uri_param` map from the
    /// placeholder bindings.
    pub fn resolve_request(&self, request: &mut Request) -> Route {
        let route = self.resolve(request.method, &request.uri.abs_path);
        for (name, value) in route.params() {
            request
                .uri_param
                .insert(name.clone(), value.clone());
        }
        route
    }

    /// Routing table of one method, for introspection.
    pub fn table(&self, method: Method) -> Option<&RadixTrie<Handler>> {
        method.index().map(|i| &self.tables[i])
    }

    fn make_handler(&mut self, calls: Vec<HandlerFn>) -> Handler {
        self.next_id += 1;
        Handler {
            id: self.next_id,
            calls,
        }
    }

    fn register(
        &mut self,
        method: Method,
        pattern: &str,
        handler: Handler,
    ) -> Result<(), RegisterError> {
        if !pattern.starts_with('/') {
            return Err(RegisterError::UnrootedPattern(pattern.to_string()));
        }
        if !balanced_brackets(pattern) {
            return Err(RegisterError::UnbalancedPattern(pattern.to_string()));
        }
        let Some(table_idx) = method.index() else {
            return Err(RegisterError::UnroutableMethod);
        };

        match self.tables[table_idx].insert(pattern, handler) {
            Some(_) => Ok(()),
            None => Err(RegisterError::DuplicatePattern(pattern.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> HandlerFn {
        handler_fn(|_| {})
    }

    fn chain_ids(route: &Route) -> Vec<u64> {
        route.handlers().iter().map(Handler::id).collect()
    }

    fn params(route: &Route) -> Vec<(&str, &str)> {
        route
            .params()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    #[test]
    fn initialization() {
        let router = Router::new();
        for method in Method::ALL {
            assert!(router.table(method).unwrap().is_empty());
        }
        assert!(router.table(Method::Undetermined).is_none());
    }

    #[test]
    fn resolves_nested_literal_routes() {
        let mut router = Router::new();
        router
            .handle(Method::Get, "/home", vec![noop(), noop()])
            .unwrap();
        router.get("/home/index.html", |_| {}).unwrap();
        router.get("/hello", |_| {}).unwrap();

        assert_eq!(router.table(Method::Get).unwrap().len(), 3);

        #[rustfmt::skip]
        let cases: [(&str, &[u64]); 7] = [
            ("/home",            &[1]),
            ("/home/index.html", &[1, 2]),
            ("/hello",           &[3]),

            ("",                 &[]),
            ("/",                &[]),
            ("/h",               &[]),
            ("/home/",           &[]),
        ];

        for (path, expected) in cases {
            let route = router.resolve(Method::Get, path);
            assert_eq!(chain_ids(&route), expected, "path={path:?}");
        }
    }

    #[test]
    fn resolves_placeholder_routes_with_bindings() {
        let mut router = Router::new();
        router.get("/", |_| {}).unwrap();
        router.get("/textbook/<author>", |_| {}).unwrap();
        router.get("/textbook/publish_date/<date>", |_| {}).unwrap();
        router.get("/user/<id>", |_| {}).unwrap();
        router.get("/user/<id>/books/<book_id>", |_| {}).unwrap();

        #[rustfmt::skip]
        let cases: [(&str, &[u64], &[(&str, &str)]); 5] = [
            ("/",                           &[1],       &[]),
            ("/textbook/Shakespear",        &[1, 2],    &[("author", "Shakespear")]),
            ("/textbook/publish_date/2004", &[1, 3],    &[("date", "2004")]),
            ("/user/foo",                   &[1, 4],    &[("id", "foo")]),
            ("/user/foo/books/bar",         &[1, 4, 5], &[("id", "foo"), ("book_id", "bar")]),
        ];

        for (path, expected_ids, expected_params) in cases {
            let route = router.resolve(Method::Get, path);
            assert_eq!(chain_ids(&route), expected_ids, "path={path:?}");
            assert_eq!(params(&route), expected_params, "path={path:?}");
        }
    }

    #[test]
    fn handler_ids_increase_with_registration_order() {
        let mut router = Router::new();
        router.get("/a", |_| {}).unwrap();
        router.post("/a", |_| {}).unwrap();
        router.put("/a", |_| {}).unwrap();
        router.get("/b", |_| {}).unwrap();

        let ids = [
            chain_ids(&router.resolve(Method::Get, "/a"))[0],
            chain_ids(&router.resolve(Method::Post, "/a"))[0],
            chain_ids(&router.resolve(Method::Put, "/a"))[0],
            chain_ids(&router.resolve(Method::Get, "/b"))[0],
        ];
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids={ids:?}");
    }

    #[test]
    fn rejects_bad_patterns() {
        let mut router = Router::new();

        assert_eq!(
            router.get("textbook", |_| {}),
            Err(RegisterError::UnrootedPattern("textbook".to_string()))
        );
        assert_eq!(
            router.get("/user/<id", |_| {}),
            Err(RegisterError::UnbalancedPattern("/user/<id".to_string()))
        );
        assert_eq!(
            router.handle(Method::Undetermined, "/x", vec![noop()]),
            Err(RegisterError::UnroutableMethod)
        );
    }

    #[test]
    fn rejects_duplicate_patterns() {
        let mut router = Router::new();
        router.get("/home", |_| {}).unwrap();

        assert_eq!(
            router.get("/home", |_| {}),
            Err(RegisterError::DuplicatePattern("/home".to_string()))
        );
        // The original registration keeps working.
        assert_eq!(chain_ids(&router.resolve(Method::Get, "/home")), [1]);
    }

    #[test]
    fn handle_all_registers_one_id_across_methods() {
        let mut router = Router::new();
        router
            .handle_all(&[Method::Get, Method::Post], "/shared", vec![noop()])
            .unwrap();

        let get_ids = chain_ids(&router.resolve(Method::Get, "/shared"));
        let post_ids = chain_ids(&router.resolve(Method::Post, "/shared"));
        assert_eq!(get_ids, post_ids);
        assert_eq!(router.resolve(Method::Delete, "/shared").handlers().len(), 0);
    }

    #[test]
    fn use_handler_attaches_middleware_to_every_method() {
        let mut router = Router::new();
        router.use_handler("/", noop()).unwrap();
        router.get("/api", |_| {}).unwrap();

        for method in Method::ALL {
            assert_eq!(chain_ids(&router.resolve(method, "/")), [1], "{method:?}");
        }
        assert_eq!(chain_ids(&router.resolve(Method::Get, "/api")), [1, 2]);
    }

    #[test]
    fn resolve_request_populates_params() {
        use crate::http::request::{ParseOutcome, Request, RequestParser};

        let mut router = Router::new();
        router.get("/user/<id>/books/<book_id>", |_| {}).unwrap();

        let mut parser = RequestParser::new();
        let mut request = Request::new();
        let (_, outcome) = parser.feed(
            &mut request,
            b"GET /user/foo/books/bar HTTP/1.1\r\n\r\n",
        );
        assert_eq!(outcome, ParseOutcome::Accept);

        let route = router.resolve_request(&mut request);
        assert_eq!(route.handlers().len(), 1);
        assert_eq!(request.param("id"), Some("foo"));
        assert_eq!(request.param("book_id"), Some("bar"));
    }

    #[test]
    fn handlers_run_in_root_to_leaf_order() {
        use crate::http::{request::Request, response::Response};
        use std::sync::Mutex;

        let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        let mut router = Router::new();
        let trace = Arc::clone(&log);
        router
            .use_handler(
                "/",
                handler_fn(move |_| trace.lock().unwrap().push("root")),
            )
            .unwrap();
        let trace = Arc::clone(&log);
        router
            .get("/api", move |_| trace.lock().unwrap().push("api"))
            .unwrap();
        let trace = Arc::clone(&log);
        router
            .get("/api/users", move |_| trace.lock().unwrap().push("users"))
            .unwrap();

        let mut request = Request::new();
        let mut response = Response::new();
        router
            .resolve(Method::Get, "/api/users")
            .run(&mut request, &mut response);

        assert_eq!(*log.lock().unwrap(), ["root", "api", "users"]);
    }

    #[test]
    fn composite_handler_runs_every_callable() {
        use crate::http::{request::Request, response::Response};
        use std::sync::atomic::{AtomicUsize, Ordering};

        let counter = Arc::new(AtomicUsize::new(0));
        let calls: Vec<HandlerFn> = (0..3)
            .map(|_| {
                let counter = Arc::clone(&counter);
                handler_fn(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        let mut router = Router::new();
        router.handle(Method::Get, "/multi", calls).unwrap();

        let mut request = Request::new();
        let mut response = Response::new();
        router
            .resolve(Method::Get, "/multi")
            .run(&mut request, &mut response);

        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }
}
