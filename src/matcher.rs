//! Glob path matching: Ant-style `*`, `?` and `**` patterns
//!
//! ```text
//! /users/*        matches /users/1, not /users/1/orders
//! /users/**       matches /users, /users/1, /users/1/orders
//! /files/*.json   matches /files/a.json
//! ```
//!
//! A pattern and a path must agree on the leading `/`. Empty segments are
//! ignored on both sides, so a trailing or doubled `/` does not change the
//! result: `/users` matches `/users/` and `/a/b` matches `/a//b`.
//!
//! Stateless; safe to call from any number of tasks at once.

/// Check whether `path` matches the glob `pattern`
///
/// # Examples
///
/// ```
/// use request_logging::matcher;
///
/// assert!(matcher::matches("/users/**", "/users/1/orders"));
/// assert!(!matcher::matches("/users/*", "/users/1/orders"));
/// ```
pub fn matches(pattern: &str, path: &str) -> bool {
    if pattern.starts_with('/') != path.starts_with('/') {
        return false;
    }
    let pattern_segments = segments(pattern);
    let path_segments = segments(path);
    match_segments(&pattern_segments, &path_segments)
}

/// Split on `/`, dropping empty segments
fn segments(input: &str) -> Vec<&str> {
    input.split('/').filter(|s| !s.is_empty()).collect()
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((&"**", rest)) => {
            // `**` swallows zero or more whole segments
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((head, rest)) => match path.split_first() {
            Some((segment, tail)) => match_segment(head, segment) && match_segments(rest, tail),
            None => false,
        },
    }
}

/// Match one segment against `*` (any run) and `?` (one char) wildcards
fn match_segment(pattern: &str, segment: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let segment: Vec<char> = segment.chars().collect();

    let (mut p, mut s) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while s < segment.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == segment[s]) {
            p += 1;
            s += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, s));
            p += 1;
        } else if let Some((star_p, star_s)) = backtrack {
            p = star_p + 1;
            s = star_s + 1;
            backtrack = Some((star_p, star_s + 1));
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}
