use crate::{
    http::{request::RejectCause, types::Version, uri::DecodeError},
    router::router_impl::RegisterError,
};
use std::{error, fmt, io};

/// Driver-level failure classification.
///
/// The parser and router never produce these themselves: they report
/// outcomes, module-local errors ([`DecodeError`], [`RegisterError`]) or
/// empty results. The connection driver folds those into this enum and maps
/// each kind to a canned wire response. Registration failures never reach a
/// socket — they abort startup — but they carry a mapping like everything
/// else.
#[derive(Debug, PartialEq)]
pub(crate) enum ErrorKind {
    /// A byte violated the request grammar; carries the parser diagnostics.
    ParseReject(Option<RejectCause>),
    /// A truncated or non-hex percent escape in the request target.
    MalformedEscape,
    /// A route pattern with unbalanced brackets reached registration.
    UnbalancedPattern,
    /// A route pattern was registered twice for one method.
    DuplicatePattern,
    /// The request head outgrew the configured limit.
    HeadTooLarge,
    /// No registered pattern matched the request path.
    Unmatched,
    /// The per-connection read deadline expired.
    DeadlineExpired,
    /// The pending-connection queue is full.
    Overloaded,
    Io(IoError),
}

macro_rules! http_errors {
    ($( $name:ident: $status_code:expr; )*) => {
        // Canned CRLF responses, connection-close, empty body.
        pub(crate) const fn as_http(&self, version: Version) -> &'static [u8] {
            match (self, version) { $(
                (Self::$name { .. }, Version::Http10) => concat!(
                    "HTTP/1.0 ", $status_code, "\r\n",
                    "connection: close\r\n",
                    "content-length: 0\r\n\r\n",
                ),
                (Self::$name { .. }, _) => concat!(
                    "HTTP/1.1 ", $status_code, "\r\n",
                    "connection: close\r\n",
                    "content-length: 0\r\n\r\n",
                ),
            )* }.as_bytes()
        }
    };
}

impl ErrorKind {
    http_errors! {
        ParseReject: "400 Bad Request";
        MalformedEscape: "400 Bad Request";
        UnbalancedPattern: "500 Internal Server Error";
        DuplicatePattern: "500 Internal Server Error";
        HeadTooLarge: "431 Request Header Fields Too Large";
        Unmatched: "404 Not Found";
        DeadlineExpired: "408 Request Timeout";
        Overloaded: "503 Service Unavailable";
        Io: "503 Service Unavailable";
    }
}

impl error::Error for ErrorKind {}
impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<DecodeError> for ErrorKind {
    fn from(_: DecodeError) -> Self {
        ErrorKind::MalformedEscape
    }
}

impl From<RegisterError> for ErrorKind {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::DuplicatePattern(_) => ErrorKind::DuplicatePattern,
            RegisterError::UnbalancedPattern(_)
            | RegisterError::UnrootedPattern(_)
            | RegisterError::UnroutableMethod => ErrorKind::UnbalancedPattern,
        }
    }
}

impl From<io::Error> for ErrorKind {
    fn from(err: io::Error) -> Self {
        ErrorKind::Io(IoError(err))
    }
}

#[derive(Debug)]
pub(crate) struct IoError(pub(crate) io::Error);

impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}
