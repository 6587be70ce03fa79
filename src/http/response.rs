//! HTTP response builder and serializer.

use crate::http::types::{Header, Headers, StatusCode, Version};

/// An HTTP response under construction.
///
/// Handlers build the response by chaining
/// [`status()`](Response::status) -> [`header()`](Response::header) ->
/// [`body()`](Response::body); the driver serializes it with
/// [`to_bytes`](Response::to_bytes) once the handler chain has run.
///
/// # Examples
/// ```
/// use trellis_web::{Response, StatusCode};
///
/// let mut resp = Response::new();
/// resp.status(StatusCode::Ok)
///     .header("content-type", "text/plain")
///     .body("Hello World");
///
/// let wire = resp.to_bytes();
/// assert!(wire.starts_with(b"HTTP/1.1 200 OK\r\n"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub(crate) version: Version,
    status: StatusCode,
    headers: Headers,
    body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Response {
            version: Version::Http11,
            status: StatusCode::Ok,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub(crate) fn reset(&mut self) {
        self.version = Version::Http11;
        self.status = StatusCode::Ok;
        self.headers.clear();
        self.body.clear();
    }

    // The driver mirrors the request's version; 1.1 is kept for everything
    // that is not plain 1.0.
    #[inline(always)]
    pub(crate) fn set_version(&mut self, version: Version) {
        self.version = match version {
            Version::Http10 => Version::Http10,
            _ => Version::Http11,
        };
    }
}

// Public API
impl Response {
    /// Sets the HTTP status code.
    #[inline]
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Sets a header: replaces the first header with the same name or
    /// appends a new one.
    ///
    /// `content-length` is calculated automatically during serialization
    /// unless set explicitly.
    #[inline]
    pub fn header<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) -> &mut Self {
        self.headers.set(Header::new(name, value));
        self
    }

    /// Removes every header with the given name.
    #[inline]
    pub fn remove_header(&mut self, name: &str) -> &mut Self {
        self.headers.remove(name);
        self
    }

    /// Sets the response body.
    #[inline]
    pub fn body<B: AsRef<[u8]>>(&mut self, body: B) -> &mut Self {
        self.body.clear();
        self.body.extend_from_slice(body.as_ref());
        self
    }

    #[inline(always)]
    pub const fn status_code(&self) -> StatusCode {
        self.status
    }

    #[inline(always)]
    pub const fn version(&self) -> Version {
        self.version
    }

    #[inline(always)]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The status line, e.g. `HTTP/1.1 200 OK\r\n`.
    pub fn status_line(&self) -> String {
        format!(
            "{} {} {}\r\n",
            self.version.as_str(),
            self.status.code(),
            self.status.reason()
        )
    }

    /// Serializes the response as
    /// `STATUS-LINE CRLF *( HEADER CRLF ) CRLF BODY`.
    ///
    /// A `content-length` header is appended when none was set explicitly.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128 + self.body.len());

        out.extend_from_slice(self.status_line().as_bytes());
        for header in &self.headers {
            out.extend_from_slice(header.name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(header.value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        if self.headers.get("content-length").is_none() {
            out.extend_from_slice(format!("content-length: {}\r\n", self.body.len()).as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
        out
    }
}
