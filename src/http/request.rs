//! Request value and the byte-driven request-head parser.
//!
//! The parser is a non-backtracking deterministic state machine: it consumes
//! one byte per step and reports [`ParseOutcome::InProgress`],
//! [`ParseOutcome::Accept`] or [`ParseOutcome::Reject`] after every byte.
//! The driver feeds it arbitrary-size buffers and stops on `Accept` or
//! `Reject`, otherwise it requests more bytes. A rejecting byte leaves the
//! machine state untouched, so the violated state and the byte are available
//! for diagnostics.

use crate::http::{
    types::{Headers, Method, Version},
    uri::{is_uri_byte, Uri},
};
use std::collections::HashMap;

// Character classification per RFC 2616: predicates on the byte's numeric
// value, independent of locale.
//
//   token      = 1*<any CHAR except CTLs or separators>
//   separators = "(" | ")" | "<" | ">" | "@" | "," | ";" | ":" | "\" | <">
//              | "/" | "[" | "]" | "?" | "=" | "{" | "}" | SP | HT
//   CTL        = octets 0-31 and DEL (127)

#[inline(always)]
const fn is_char(b: u8) -> bool {
    b <= 127
}

#[inline(always)]
const fn is_ctl(b: u8) -> bool {
    b <= 31 || b == 127
}

#[inline(always)]
const fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

#[inline(always)]
const fn is_alpha(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

#[inline(always)]
const fn is_cr(b: u8) -> bool {
    b == b'\r'
}

#[inline(always)]
const fn is_lf(b: u8) -> bool {
    b == b'\n'
}

#[inline(always)]
const fn is_sp(b: u8) -> bool {
    b == b' '
}

#[inline(always)]
const fn is_ht(b: u8) -> bool {
    b == b'\t'
}

#[inline(always)]
const fn is_separator(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')'
            | b'<'
            | b'>'
            | b'@'
            | b','
            | b';'
            | b':'
            | b'\\'
            | b'"'
            | b'/'
            | b'['
            | b']'
            | b'?'
            | b'='
            | b'{'
            | b'}'
            | b' '
            | b'\t'
    )
}

#[inline(always)]
const fn is_token(b: u8) -> bool {
    is_char(b) && !is_ctl(b) && !is_separator(b)
}

// REQUEST

/// A parsed HTTP request head.
///
/// `uri_param` is populated by the router during resolution; `uri_query` is
/// populated by the query-parser middleware. The body field exists for
/// collaborators that consume payloads; the core parser stops at the header
/// terminator and never fills it.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) version: Version,
    pub(crate) headers: Headers,
    pub(crate) body: Vec<u8>,
    pub(crate) uri_param: HashMap<String, String>,
    pub(crate) uri_query: HashMap<String, String>,
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    pub fn new() -> Self {
        Request {
            method: Method::Undetermined,
            uri: Uri::new(),
            version: Version::Undetermined,
            headers: Headers::new(),
            body: Vec::new(),
            uri_param: HashMap::new(),
            uri_query: HashMap::new(),
        }
    }

    pub(crate) fn reset(&mut self) {
        self.method = Method::Undetermined;
        self.uri.clear();
        self.version = Version::Undetermined;
        self.headers.clear();
        self.body.clear();
        self.uri_param.clear();
        self.uri_query.clear();
    }
}

// Public API
impl Request {
    #[inline(always)]
    pub const fn method(&self) -> Method {
        self.method
    }

    #[inline(always)]
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    #[inline(always)]
    pub const fn version(&self) -> Version {
        self.version
    }

    #[inline(always)]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// First header value with the given name, compared case-insensitively.
    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Placeholder binding extracted by the router, e.g. `id` for a route
    /// registered as `/user/<id>`.
    #[inline]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.uri_param.get(name).map(String::as_str)
    }

    #[inline]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.uri_param
    }

    /// Query-string value filled in by the query-parser middleware.
    #[inline]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.uri_query.get(name).map(String::as_str)
    }

    #[inline]
    pub fn queries(&self) -> &HashMap<String, String> {
        &self.uri_query
    }
}

// PARSER

/// Outcome reported after every byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Keep reading.
    InProgress,
    /// The whole request head is parsed and valid.
    Accept,
    /// A byte violated the grammar in the current state.
    Reject,
}

/// Main parser state; one variant per position in the request-head grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    ReqStart,
    ReqStartLf,
    ReqMethod,
    ReqUri,
    ReqHttpH,
    ReqHttpHt,
    ReqHttpHtt,
    ReqHttpHttp,
    ReqHttpSlash,
    ReqHttpMajor,
    ReqHttpDot,
    ReqHttpMinor,
    ReqStartLineCr,
    ReqStartLineLf,
    ReqFieldNameStart,
    ReqFieldName,
    ReqFieldValue,
    ReqHeaderLf,
    ReqHeaderLws,
    ReqHeaderEnd,
}

/// Nested URI sub-machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UriState {
    UriStart,
    UriScheme,
    UriSlash,
    UriSlashSlash,
    UriHost,
    UriPort,
    UriAbsPath,
    UriQuery,
    UriFragment,
}

/// The state and offending byte of a rejected parse, surfaced to the driver
/// for its `400 Bad Request` diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectCause {
    pub state: ParserState,
    pub byte: u8,
}

/// Incremental request-head parser.
///
/// One instance per connection; [`RequestParser::reset`] prepares it for the
/// next request. Splitting the same valid byte stream into any sequence of
/// chunks yields the same final [`Request`] and the same `Accept` outcome.
#[derive(Debug)]
pub struct RequestParser {
    state: ParserState,
    uri_state: UriState,
    method_token: Vec<u8>,
    version_major: u8,
    version_minor: u8,
    reject: Option<RejectCause>,
    malformed_escape: bool,
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestParser {
    pub fn new() -> Self {
        RequestParser {
            state: ParserState::ReqStart,
            uri_state: UriState::UriStart,
            method_token: Vec::new(),
            version_major: 0,
            version_minor: 0,
            reject: None,
            malformed_escape: false,
        }
    }

    pub fn reset(&mut self) {
        self.state = ParserState::ReqStart;
        self.uri_state = UriState::UriStart;
        self.method_token.clear();
        self.version_major = 0;
        self.version_minor = 0;
        self.reject = None;
        self.malformed_escape = false;
    }

    /// Cause of the last rejection, if any.
    #[inline]
    pub fn reject_cause(&self) -> Option<RejectCause> {
        self.reject
    }

    /// True when the last rejection came from a bad percent escape in the
    /// request target rather than a grammar violation.
    #[inline]
    pub fn malformed_escape(&self) -> bool {
        self.malformed_escape
    }

    /// Feeds a buffer into the machine.
    ///
    /// Returns how many bytes were consumed (including a rejecting byte) and
    /// the outcome after the last consumed byte. After `Accept` the caller
    /// may read the completed [`Request`]; after `Reject` it must discard
    /// it.
    pub fn feed(&mut self, request: &mut Request, bytes: &[u8]) -> (usize, ParseOutcome) {
        let mut consumed = 0;
        let mut outcome = ParseOutcome::InProgress;

        for &byte in bytes {
            consumed += 1;
            outcome = self.consume(request, byte);
            if outcome != ParseOutcome::InProgress {
                break;
            }
        }
        (consumed, outcome)
    }

    /// Advances the machine by one byte.
    fn consume(&mut self, request: &mut Request, byte: u8) -> ParseOutcome {
        use ParseOutcome::{Accept, InProgress, Reject};
        use ParserState as S;

        let outcome = match self.state {
            S::ReqStart => {
                if is_cr(byte) {
                    self.state = S::ReqStartLf;
                    InProgress
                } else if is_token(byte) {
                    self.method_token.clear();
                    self.method_token.push(byte);
                    request.method = Method::Undetermined;
                    self.state = S::ReqMethod;
                    InProgress
                } else {
                    Reject
                }
            }
            S::ReqStartLf => {
                if is_lf(byte) {
                    self.state = S::ReqStart;
                    InProgress
                } else {
                    Reject
                }
            }
            S::ReqMethod => {
                if is_token(byte) {
                    self.method_token.push(byte);
                    InProgress
                } else if is_sp(byte) {
                    // The whole token is compared against the closed method
                    // set; unknown tokens never reach the router.
                    match Method::from_token(&self.method_token) {
                        Some(method) => {
                            request.method = method;
                            self.state = S::ReqUri;
                            InProgress
                        }
                        None => Reject,
                    }
                } else {
                    Reject
                }
            }
            S::ReqUri => {
                if is_uri_byte(byte) {
                    self.consume_uri(&mut request.uri, byte)
                } else if is_sp(byte) {
                    self.finish_uri(&mut request.uri)
                } else {
                    Reject
                }
            }
            S::ReqHttpH => self.expect(byte, b'H', S::ReqHttpHt),
            S::ReqHttpHt => self.expect(byte, b'T', S::ReqHttpHtt),
            S::ReqHttpHtt => self.expect(byte, b'T', S::ReqHttpHttp),
            S::ReqHttpHttp => self.expect(byte, b'P', S::ReqHttpSlash),
            S::ReqHttpSlash => self.expect(byte, b'/', S::ReqHttpMajor),
            S::ReqHttpMajor => {
                if is_digit(byte) {
                    self.version_major = byte - b'0';
                    self.state = S::ReqHttpDot;
                    InProgress
                } else {
                    Reject
                }
            }
            S::ReqHttpDot => self.expect(byte, b'.', S::ReqHttpMinor),
            S::ReqHttpMinor => {
                if is_digit(byte) {
                    self.version_minor = byte - b'0';
                    self.state = S::ReqStartLineCr;
                    InProgress
                } else {
                    Reject
                }
            }
            S::ReqStartLineCr => {
                if is_cr(byte) {
                    self.state = S::ReqStartLineLf;
                    InProgress
                } else {
                    Reject
                }
            }
            S::ReqStartLineLf => {
                if is_lf(byte) {
                    self.state = S::ReqFieldNameStart;
                    InProgress
                } else {
                    Reject
                }
            }
            S::ReqFieldNameStart => {
                if is_cr(byte) {
                    self.state = S::ReqHeaderEnd;
                    InProgress
                } else if is_token(byte) {
                    request.headers.push_empty();
                    Self::build_header_name(request, byte);
                    self.state = S::ReqFieldName;
                    InProgress
                } else {
                    Reject
                }
            }
            S::ReqFieldName => {
                if is_token(byte) {
                    Self::build_header_name(request, byte);
                    InProgress
                } else if byte == b':' {
                    self.state = S::ReqFieldValue;
                    InProgress
                } else {
                    Reject
                }
            }
            S::ReqFieldValue => {
                if is_sp(byte) || is_ht(byte) {
                    // Leading whitespace is not part of the value; interior
                    // whitespace is.
                    if !Self::header_value_empty(request) {
                        Self::build_header_value(request, byte);
                    }
                    InProgress
                } else if is_cr(byte) {
                    self.state = S::ReqHeaderLf;
                    InProgress
                } else if !is_ctl(byte) {
                    Self::build_header_value(request, byte);
                    InProgress
                } else {
                    Reject
                }
            }
            S::ReqHeaderLf => {
                if is_lf(byte) {
                    self.state = S::ReqHeaderLws;
                    InProgress
                } else {
                    Reject
                }
            }
            S::ReqHeaderLws => {
                // LWS = [CRLF] 1*( SP | HT ).  After a header's CRLF:
                //   SP | HT    resumes the previous value (folded line)
                //   CR         ends the header block
                //   token byte starts the next header name
                if is_sp(byte) || is_ht(byte) {
                    self.state = S::ReqFieldValue;
                    InProgress
                } else if is_cr(byte) {
                    self.state = S::ReqHeaderEnd;
                    InProgress
                } else if is_token(byte) {
                    request.headers.push_empty();
                    Self::build_header_name(request, byte);
                    self.state = S::ReqFieldName;
                    InProgress
                } else {
                    Reject
                }
            }
            S::ReqHeaderEnd => {
                if is_lf(byte) {
                    request.version =
                        Version::from_digits(self.version_major, self.version_minor);
                    Accept
                } else {
                    Reject
                }
            }
        };

        if outcome == ParseOutcome::Reject {
            self.reject = Some(RejectCause {
                state: self.state,
                byte,
            });
        }
        outcome
    }

    #[inline]
    fn expect(&mut self, byte: u8, wanted: u8, next: ParserState) -> ParseOutcome {
        if byte == wanted {
            self.state = next;
            ParseOutcome::InProgress
        } else {
            ParseOutcome::Reject
        }
    }

    /// URI sub-machine, entered for every URI-charset byte of the request
    /// target.
    ///
    /// Accepts `abs_path` origin-form targets and `absoluteURI` targets of
    /// the shape `scheme "://" host [":" port] [abs_path ["?" query]
    /// ["#" fragment]]`.
    fn consume_uri(&mut self, uri: &mut Uri, byte: u8) -> ParseOutcome {
        use ParseOutcome::{InProgress, Reject};
        use UriState as U;

        match self.uri_state {
            U::UriStart => {
                if byte == b'/' {
                    uri.abs_path.push('/');
                    self.uri_state = U::UriAbsPath;
                    InProgress
                } else if is_alpha(byte) {
                    uri.scheme.push(byte as char);
                    self.uri_state = U::UriScheme;
                    InProgress
                } else {
                    Reject
                }
            }
            U::UriScheme => {
                if is_alpha(byte) {
                    uri.scheme.push(byte as char);
                    InProgress
                } else if byte == b':' {
                    self.uri_state = U::UriSlash;
                    InProgress
                } else {
                    Reject
                }
            }
            U::UriSlash => {
                if byte == b'/' {
                    self.uri_state = U::UriSlashSlash;
                    InProgress
                } else {
                    Reject
                }
            }
            U::UriSlashSlash => {
                if byte == b'/' {
                    self.uri_state = U::UriHost;
                    InProgress
                } else {
                    Reject
                }
            }
            U::UriHost => {
                if byte == b'/' {
                    uri.abs_path.push('/');
                    self.uri_state = U::UriAbsPath;
                    InProgress
                } else if byte == b':' {
                    self.uri_state = U::UriPort;
                    InProgress
                } else {
                    uri.host.push(byte as char);
                    InProgress
                }
            }
            U::UriPort => {
                if is_digit(byte) {
                    uri.port.push(byte as char);
                    InProgress
                } else if byte == b'/' {
                    uri.abs_path.push('/');
                    self.uri_state = U::UriAbsPath;
                    InProgress
                } else {
                    Reject
                }
            }
            U::UriAbsPath => {
                if byte == b'?' {
                    self.uri_state = U::UriQuery;
                    InProgress
                } else if byte == b'#' {
                    self.uri_state = U::UriFragment;
                    InProgress
                } else {
                    uri.abs_path.push(byte as char);
                    InProgress
                }
            }
            U::UriQuery => {
                if byte == b'#' {
                    self.uri_state = U::UriFragment;
                    InProgress
                } else {
                    uri.query.push(byte as char);
                    InProgress
                }
            }
            U::UriFragment => {
                uri.fragment.push(byte as char);
                InProgress
            }
        }
    }

    /// Runs at the `SP` terminating the request target: percent-decodes
    /// every URI field and normalizes the path of authority-only targets.
    fn finish_uri(&mut self, uri: &mut Uri) -> ParseOutcome {
        if uri.abs_path.is_empty() && uri.host.is_empty() && uri.scheme.is_empty() {
            return ParseOutcome::Reject;
        }
        if uri.decode_fields().is_err() {
            self.malformed_escape = true;
            return ParseOutcome::Reject;
        }
        if uri.abs_path.is_empty() {
            uri.abs_path.push('/');
        }
        self.state = ParserState::ReqHttpH;
        ParseOutcome::InProgress
    }

    #[inline]
    fn build_header_name(request: &mut Request, byte: u8) {
        if let Some(header) = request.headers.last_mut() {
            header.name.push(byte.to_ascii_lowercase() as char);
        }
    }

    #[inline]
    fn build_header_value(request: &mut Request, byte: u8) {
        if let Some(header) = request.headers.last_mut() {
            header.value.push(char::from(byte));
        }
    }

    #[inline]
    fn header_value_empty(request: &mut Request) -> bool {
        request
            .headers
            .last_mut()
            .map(|h| h.value.is_empty())
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> (RequestParser, Request, ParseOutcome) {
        let mut parser = RequestParser::new();
        let mut request = Request::new();
        let (_, outcome) = parser.feed(&mut request, input.as_bytes());
        (parser, request, outcome)
    }

    #[test]
    fn accepts_simple_request() {
        let input = "GET /hi HTTP/1.0\r\nHost: 127.0.0.1:8888\r\nUser-Agent: curl/7.43.0\r\nAccept: */*\r\n\r\n";
        let (_, request, outcome) = parse(input);

        assert_eq!(outcome, ParseOutcome::Accept);
        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.uri().abs_path, "/hi");
        assert_eq!(request.version(), Version::Http10);

        let headers: Vec<(&str, &str)> = request
            .headers()
            .iter()
            .map(|h| (h.name.as_str(), h.value.as_str()))
            .collect();
        assert_eq!(
            headers,
            [
                ("host", "127.0.0.1:8888"),
                ("user-agent", "curl/7.43.0"),
                ("accept", "*/*"),
            ]
        );
    }

    #[test]
    fn parses_absolute_uri_request_line() {
        let input = "POST http://abc.com:80/~smith/home.html#footer HTTP/1.0\r\n";
        let (_, request, outcome) = parse(input);

        assert_eq!(outcome, ParseOutcome::InProgress);
        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.uri().scheme, "http");
        assert_eq!(request.uri().host, "abc.com");
        assert_eq!(request.uri().port, "80");
        assert_eq!(request.uri().abs_path, "/~smith/home.html");
        assert_eq!(request.uri().fragment, "footer");
    }

    #[test]
    fn decodes_percent_escapes_in_path() {
        let input = "GET /wiki/%E7%99%BE%E5%88%86%E5%8F%B7%E7%BC%96%E7%A0%81 HTTP/1.1\r\n\r\n";
        let (_, request, outcome) = parse(input);

        assert_eq!(outcome, ParseOutcome::Accept);
        assert_eq!(request.uri().abs_path, "/wiki/百分号编码");
    }

    #[test]
    fn splits_query_and_fragment() {
        let (_, request, outcome) = parse("GET /find?user=qwe&id=223#top HTTP/1.1\r\n\r\n");

        assert_eq!(outcome, ParseOutcome::Accept);
        assert_eq!(request.uri().abs_path, "/find");
        assert_eq!(request.uri().query, "user=qwe&id=223");
        assert_eq!(request.uri().fragment, "top");
    }

    #[test]
    fn absolute_uri_without_path_defaults_to_root() {
        let (_, request, outcome) = parse("GET http://abc.com HTTP/1.1\r\n\r\n");

        assert_eq!(outcome, ParseOutcome::Accept);
        assert_eq!(request.uri().host, "abc.com");
        assert_eq!(request.uri().abs_path, "/");
    }

    #[test]
    fn leading_crlf_is_skipped() {
        let (_, request, outcome) = parse("\r\n\r\nGET / HTTP/1.1\r\n\r\n");

        assert_eq!(outcome, ParseOutcome::Accept);
        assert_eq!(request.method(), Method::Get);
    }

    #[test]
    fn parses_every_method() {
        #[rustfmt::skip]
        let cases = [
            ("GET",     Method::Get),
            ("HEAD",    Method::Head),
            ("POST",    Method::Post),
            ("PUT",     Method::Put),
            ("PATCH",   Method::Patch),
            ("DELETE",  Method::Delete),
            ("CONNECT", Method::Connect),
            ("OPTIONS", Method::Options),
            ("TRACE",   Method::Trace),
        ];

        for (token, expected) in cases {
            let input = format!("{token} / HTTP/1.1\r\n\r\n");
            let (_, request, outcome) = parse(&input);
            assert_eq!(outcome, ParseOutcome::Accept, "method={token}");
            assert_eq!(request.method(), expected);
        }
    }

    #[test]
    fn rejects_invalid_requests() {
        #[rustfmt::skip]
        let cases = [
            " GET / HTTP/1.1\r\n\r\n",      // leading SP
            "ZZZ / HTTP/1.1\r\n\r\n",       // unknown method token
            "GETX / HTTP/1.1\r\n\r\n",      // token verified at SP
            "get / HTTP/1.1\r\n\r\n",       // methods are case-sensitive
            "GET  HTTP/1.1\r\n\r\n",        // empty request target
            "GET / HTTX/1.1\r\n\r\n",       // bad protocol literal
            "GET / http/1.1\r\n\r\n",       // lowercase protocol
            "GET / HTTP-1.1\r\n\r\n",       // missing slash
            "GET / HTTP/x.1\r\n\r\n",       // non-digit major
            "GET / HTTP/1x1\r\n\r\n",       // missing dot
            "GET / HTTP/1.x\r\n\r\n",       // non-digit minor
            "GET / HTTP/1.15\r\n\r\n",      // multi-digit minor
            "GET / HTTP/1.1 \r\n\r\n",      // trailing junk before CR
            "GET / HTTP/1.1\rX",            // CR must be followed by LF
            "GET / HTTP/1.1\r\nHost 1\r\n\r\n",   // missing colon
            "GET / HTTP/1.1\r\n: v\r\n\r\n",      // empty header name
            "GET / HTTP/1.1\r\nA: b\rZ",          // header CR without LF
            "GET /a%zz HTTP/1.1\r\n\r\n",         // malformed escape in path
        ];

        for input in cases {
            let (parser, _, outcome) = parse(input);
            assert_eq!(outcome, ParseOutcome::Reject, "input={input:?}");
            assert!(parser.reject_cause().is_some(), "input={input:?}");
        }
    }

    #[test]
    fn malformed_escape_is_distinguished_from_grammar_rejects() {
        let (parser, _, outcome) = parse("GET /a%zz HTTP/1.1\r\n\r\n");
        assert_eq!(outcome, ParseOutcome::Reject);
        assert!(parser.malformed_escape());

        let (parser, _, outcome) = parse("ZZZ / HTTP/1.1\r\n\r\n");
        assert_eq!(outcome, ParseOutcome::Reject);
        assert!(!parser.malformed_escape());
    }

    #[test]
    fn prefix_of_valid_stream_never_rejects() {
        let input = "GET /hi?a=1 HTTP/1.1\r\nHost: 127.0.0.1\r\nAccept: */*\r\n\r\n";

        for cut in 0..input.len() {
            let (_, _, outcome) = parse(&input[..cut]);
            assert_ne!(outcome, ParseOutcome::Reject, "cut={cut}");
        }
    }

    #[test]
    fn chunked_feeding_is_equivalent() {
        let input = "GET /user/42?sort=name HTTP/1.1\r\nHost: localhost\r\nX-Tag: abc\r\n\r\n";
        let (_, whole, outcome) = parse(input);
        assert_eq!(outcome, ParseOutcome::Accept);

        for cut in 1..input.len() {
            let mut parser = RequestParser::new();
            let mut request = Request::new();

            let (first, outcome) = parser.feed(&mut request, input[..cut].as_bytes());
            assert_eq!(first, cut);
            assert_eq!(outcome, ParseOutcome::InProgress, "cut={cut}");

            let (_, outcome) = parser.feed(&mut request, input[cut..].as_bytes());
            assert_eq!(outcome, ParseOutcome::Accept, "cut={cut}");
            assert_eq!(request, whole, "cut={cut}");
        }
    }

    #[test]
    fn reject_leaves_state_recoverable() {
        let mut parser = RequestParser::new();
        let mut request = Request::new();

        let (_, outcome) = parser.feed(&mut request, b"GET / HTTP/");
        assert_eq!(outcome, ParseOutcome::InProgress);

        // A non-digit violates `req_http_major`; the state does not advance.
        let (consumed, outcome) = parser.feed(&mut request, b"X");
        assert_eq!((consumed, outcome), (1, ParseOutcome::Reject));
        let cause = parser.reject_cause().unwrap();
        assert_eq!(cause.state, ParserState::ReqHttpMajor);
        assert_eq!(cause.byte, b'X');

        // Feeding the grammatical byte afterwards resumes the parse.
        let (_, outcome) = parser.feed(&mut request, b"1.1\r\n\r\n");
        assert_eq!(outcome, ParseOutcome::Accept);
    }

    #[test]
    fn header_value_whitespace() {
        let (_, request, outcome) =
            parse("GET / HTTP/1.1\r\nA:    lead\r\nB: two words\r\n\r\n");

        assert_eq!(outcome, ParseOutcome::Accept);
        assert_eq!(request.header("a"), Some("lead"));
        assert_eq!(request.header("b"), Some("two words"));
    }

    #[test]
    fn header_continuation_line_resumes_value() {
        let (_, request, outcome) = parse("GET / HTTP/1.1\r\nA: b\r\n c\r\n\r\n");

        assert_eq!(outcome, ParseOutcome::Accept);
        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.header("a"), Some("bc"));
    }

    #[test]
    fn empty_header_value_is_kept() {
        let (_, request, outcome) = parse("GET / HTTP/1.1\r\nX-Empty:\r\nX-Sp: \r\n\r\n");

        assert_eq!(outcome, ParseOutcome::Accept);
        assert_eq!(request.header("x-empty"), Some(""));
        assert_eq!(request.header("x-sp"), Some(""));
    }

    #[test]
    fn version_digits_map_to_variants() {
        #[rustfmt::skip]
        let cases = [
            ("0.9", Version::Http09),
            ("1.0", Version::Http10),
            ("1.1", Version::Http11),
            ("2.0", Version::Http20),
            ("1.2", Version::Undetermined),
        ];

        for (digits, expected) in cases {
            let input = format!("GET / HTTP/{digits}\r\n\r\n");
            let (_, request, outcome) = parse(&input);
            assert_eq!(outcome, ParseOutcome::Accept, "digits={digits}");
            assert_eq!(request.version(), expected);
        }
    }

    #[test]
    fn parser_reset_allows_reuse() {
        let mut parser = RequestParser::new();
        let mut request = Request::new();

        let (_, outcome) = parser.feed(&mut request, b"ZZZ");
        assert_eq!(outcome, ParseOutcome::InProgress);
        let (_, outcome) = parser.feed(&mut request, b" ");
        assert_eq!(outcome, ParseOutcome::Reject);

        parser.reset();
        request.reset();
        let (_, outcome) = parser.feed(&mut request, b"GET / HTTP/1.1\r\n\r\n");
        assert_eq!(outcome, ParseOutcome::Accept);
        assert!(parser.reject_cause().is_none());
        assert_eq!(request.method(), Method::Get);
    }

    #[test]
    fn request_reset_clears_everything() {
        let (_, mut request, outcome) =
            parse("GET /x?a=1 HTTP/1.1\r\nHost: h\r\n\r\n");
        assert_eq!(outcome, ParseOutcome::Accept);

        request.reset();
        assert_eq!(request, Request::new());
    }
}
