//! Parsed URI value and the percent-encoding codec.
//!
//! The request parser accumulates raw (still escaped) bytes into the [`Uri`]
//! fields and calls [`Uri::decode_fields`] once the request line's URI is
//! complete, so an accepted request always carries decoded text.

use memchr::memchr;
use std::{collections::HashMap, error, fmt};

// CHARSET

// RFC 3986 unreserved set: ALPHA / DIGIT / "-" / "_" / "." / "~"
#[inline(always)]
pub(crate) const fn is_uri_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~')
}

// Unreserved + the reserved subset accepted inside a request target,
// plus `%` so escape sequences can reach the decoder.
#[inline(always)]
pub(crate) const fn is_uri_byte(b: u8) -> bool {
    is_uri_unreserved(b)
        || matches!(
            b,
            b'!' | b'*'
                | b'\''
                | b'('
                | b')'
                | b';'
                | b':'
                | b'@'
                | b'&'
                | b'='
                | b'+'
                | b'$'
                | b','
                | b'/'
                | b'?'
                | b'#'
                | b'['
                | b']'
                | b'%'
        )
}

// URI

/// A parsed request URI.
///
/// Every field is an owned string; after the parser accepts the request
/// line, every field is percent-decoded. For origin-form URIs only
/// `abs_path` (and possibly `query`/`fragment`) are populated; absolute-form
/// URIs also fill `scheme`, `host` and `port`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uri {
    pub scheme: String,
    pub host: String,
    pub port: String,
    pub abs_path: String,
    pub query: String,
    pub fragment: String,
}

impl Uri {
    #[inline]
    pub fn new() -> Self {
        Uri::default()
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.scheme.clear();
        self.host.clear();
        self.port.clear();
        self.abs_path.clear();
        self.query.clear();
        self.fragment.clear();
    }

    /// Percent-decodes every field in place.
    pub(crate) fn decode_fields(&mut self) -> Result<(), DecodeError> {
        self.scheme = urldecode(&self.scheme)?;
        self.host = urldecode(&self.host)?;
        self.port = urldecode(&self.port)?;
        self.abs_path = urldecode(&self.abs_path)?;
        self.query = urldecode(&self.query)?;
        self.fragment = urldecode(&self.fragment)?;
        Ok(())
    }

    /// Serializes as `scheme "://" host [":" port] abs_path ["?" query]
    /// ["#" fragment]`, omitting the authority block when absent.
    pub fn to_uri_string(&self) -> String {
        let mut out = String::new();
        if !self.scheme.is_empty() {
            out.push_str(&self.scheme);
            out.push_str("://");
            out.push_str(&self.host);
            if !self.port.is_empty() {
                out.push(':');
                out.push_str(&self.port);
            }
        }
        out.push_str(&self.abs_path);
        if !self.query.is_empty() {
            out.push('?');
            out.push_str(&self.query);
        }
        if !self.fragment.is_empty() {
            out.push('#');
            out.push_str(&self.fragment);
        }
        out
    }
}

// CODEC

/// Percent-decoding failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A `%` not followed by two hex digits.
    MalformedEscape,
    /// Decoded bytes do not form valid UTF-8.
    InvalidUtf8,
}

impl error::Error for DecodeError {}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::MalformedEscape => write!(f, "truncated or non-hex percent escape"),
            DecodeError::InvalidUtf8 => write!(f, "decoded bytes are not valid UTF-8"),
        }
    }
}

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

#[inline(always)]
const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Percent-encodes a string: unreserved bytes pass through, everything else
/// becomes `%XX` with uppercase hex digits.
pub fn urlencode(url: &str) -> String {
    let mut encoded = String::with_capacity(url.len());
    for &b in url.as_bytes() {
        if is_uri_unreserved(b) {
            encoded.push(b as char);
        } else {
            encoded.push('%');
            encoded.push(HEX_UPPER[(b >> 4) as usize] as char);
            encoded.push(HEX_UPPER[(b & 0x0F) as usize] as char);
        }
    }
    encoded
}

/// Percent-decodes a string in a single pass.
///
/// Non-`%` bytes are copied verbatim; each `%XX` escape emits one byte.
/// Fails on a truncated or non-hex escape, and on decoded bytes that do not
/// re-validate as UTF-8.
pub fn urldecode(url: &str) -> Result<String, DecodeError> {
    let src = url.as_bytes();
    let mut decoded: Vec<u8> = Vec::with_capacity(src.len());

    let mut pos = 0;
    while let Some(offset) = memchr(b'%', &src[pos..]) {
        let at = pos + offset;
        decoded.extend_from_slice(&src[pos..at]);

        let hi = src
            .get(at + 1)
            .copied()
            .and_then(hex_value)
            .ok_or(DecodeError::MalformedEscape)?;
        let lo = src
            .get(at + 2)
            .copied()
            .and_then(hex_value)
            .ok_or(DecodeError::MalformedEscape)?;

        decoded.push((hi << 4) | lo);
        pos = at + 3;
    }
    decoded.extend_from_slice(&src[pos..]);

    if simdutf8::basic::from_utf8(&decoded).is_err() {
        return Err(DecodeError::InvalidUtf8);
    }
    // SAFETY: validated as UTF-8 just above.
    Ok(unsafe { String::from_utf8_unchecked(decoded) })
}

// QUERY

/// Converts a query string into a key-value map.
///
/// Splits on `&`, then each token on its first `=`. A token without `=`
/// yields a key with an empty value; when a key occurs more than once the
/// last value wins. A leading `?` is tolerated.
pub fn make_query(qstr: &str) -> HashMap<String, String> {
    let data = qstr.strip_prefix('?').unwrap_or(qstr);

    let mut query_map = HashMap::new();
    if data.is_empty() {
        return query_map;
    }

    for token in data.split('&') {
        match token.split_once('=') {
            Some((key, value)) => query_map.insert(key.to_string(), value.to_string()),
            None => query_map.insert(token.to_string(), String::new()),
        };
    }
    query_map
}
