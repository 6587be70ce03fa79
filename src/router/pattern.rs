//! String kernel for the route dispatcher: common-prefix computation and the
//! placeholder-aware pattern matcher the radix trie applies per edge.

use memchr::memchr;

/// Length of the maximal shared leading byte sequence of `x` and `y`.
///
/// Exact and byte-wise; no Unicode folding.
#[inline]
pub fn common_prefix_len(x: &str, y: &str) -> usize {
    x.as_bytes()
        .iter()
        .zip(y.as_bytes())
        .take_while(|(a, b)| a == b)
        .count()
}

/// Result of matching a route pattern against a concrete path.
///
/// `pattern_len` / `query_len` are the byte counts each cursor consumed
/// before the match completed or halted. The match is *full* when both
/// inputs were consumed entirely; a pattern-exhausted partial match is how
/// the trie decides to descend into a child.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteMatch {
    pub pattern_len: usize,
    pub query_len: usize,
    pub bindings: Vec<(String, String)>,
}

impl RouteMatch {
    #[inline]
    pub fn is_full(&self, pattern: &str, query: &str) -> bool {
        self.pattern_len == pattern.len() && self.query_len == query.len()
    }
}

/// Advances two cursors over `pattern` and `query` under the route rules:
///
/// - equal bytes advance both cursors;
/// - `<name>` in the pattern captures one query segment (up to the next `/`
///   or end of input) and records a `(name, value)` binding;
/// - any other mismatch halts the match.
///
/// Preconditions: `query` contains no `<`; `pattern` has balanced brackets.
/// A `<` with no closing `>` inside the pattern halts the match without
/// recording a binding.
pub fn route_match(pattern: &str, query: &str) -> RouteMatch {
    let p = pattern.as_bytes();
    let q = query.as_bytes();

    let mut pi = 0;
    let mut qi = 0;
    let mut bindings = Vec::new();

    while pi < p.len() && qi < q.len() {
        if p[pi] == q[qi] {
            pi += 1;
            qi += 1;
            continue;
        }

        if p[pi] == b'<' {
            let Some(close) = memchr(b'>', &p[pi + 1..]) else {
                break;
            };
            let name = &pattern[pi + 1..pi + 1 + close];

            let value_end = memchr(b'/', &q[qi..])
                .map(|offset| qi + offset)
                .unwrap_or(q.len());
            bindings.push((name.to_string(), query[qi..value_end].to_string()));

            pi += close + 2;
            qi = value_end;
            continue;
        }

        break;
    }

    RouteMatch {
        pattern_len: pi,
        query_len: qi,
        bindings,
    }
}

/// Linear bracket-balance check over `<>`, `{}` and `[]`, applied to route
/// patterns at registration time.
pub fn balanced_brackets(s: &str) -> bool {
    let mut stack: Vec<u8> = Vec::new();

    for b in s.bytes() {
        match b {
            b'<' => stack.push(b'>'),
            b'{' => stack.push(b'}'),
            b'[' => stack.push(b']'),
            b'>' | b'}' | b']' => {
                if stack.pop() != Some(b) {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty()
}
