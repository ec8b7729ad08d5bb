//! Raw header block parsing.
//!
//! The transport surfaces the reply header block as an ordered sequence
//! of lines: status lines (`HTTP/1.1 200 OK`) interleaved with header
//! lines (`Name: value`). When the transport follows redirects, the
//! sequence contains one status line per hop; the final hop's status is
//! the one surfaced, and a hop count greater than one is what marks the
//! response as redirected.

use tracing::debug;

/// Parsed, immutable view of a raw header block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedHeaders {
    entries: Vec<(String, String)>,
    status: u16,
    first_line: Option<String>,
    status_line: Option<String>,
}

impl ParsedHeaders {
    /// An empty header block, as used by error-type responses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The final HTTP status code, or 0 if no status line was seen.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// True if the final status is in the 200-299 range.
    pub fn is_ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// The raw first line of the sequence.
    pub fn first_line(&self) -> Option<&str> {
        self.first_line.as_deref()
    }

    /// The raw most recent status line.
    pub fn status_line(&self) -> Option<&str> {
        self.status_line.as_deref()
    }

    /// True if at least one status line was observed and the most
    /// recent one differs from the very first line of the sequence.
    ///
    /// This is a purely positional comparison; intermediate codes are
    /// not checked for being 3xx. Known looseness, kept for
    /// compatibility.
    pub fn redirected(&self) -> bool {
        match (&self.first_line, &self.status_line) {
            (Some(first), Some(current)) => first != current,
            _ => false,
        }
    }

    /// Ordered header entries, first insertion order preserved.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Looks up a header value by case-insensitive name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Number of header entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no header entries were recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Matches an HTTP status line (`HTTP/<version> <code> ...`) and
/// extracts the numeric code.
fn parse_status_line(line: &str) -> Option<u16> {
    if !line.starts_with("HTTP/") {
        return None;
    }
    let mut parts = line.split_whitespace();
    let _version = parts.next()?;
    parts.next()?.parse().ok()
}

/// Parses a raw ordered sequence of header-or-status lines.
///
/// Lines containing a colon are recorded as `trim(name) -> trim(value)`;
/// a later duplicate name overwrites the earlier value in place, so
/// first-insertion order is preserved. Lines without a colon are matched
/// against the status-line pattern; each match updates the current
/// status and becomes the most recent status line.
///
/// An empty sequence yields status 0 with no lines recorded; callers
/// treat that as a transport-level anomaly, not as a parsed reply.
pub fn parse_header_lines<S: AsRef<str>>(lines: &[S]) -> ParsedHeaders {
    let mut parsed = ParsedHeaders::default();

    for line in lines {
        let line = line.as_ref();
        if parsed.first_line.is_none() {
            parsed.first_line = Some(line.to_string());
        }

        match line.split_once(':') {
            Some((name, value)) => {
                let name = name.trim();
                let value = value.trim();
                if let Some(existing) = parsed
                    .entries
                    .iter_mut()
                    .find(|(n, _)| n.eq_ignore_ascii_case(name))
                {
                    existing.1 = value.to_string();
                } else {
                    parsed.entries.push((name.to_string(), value.to_string()));
                }
            }
            None => {
                if let Some(code) = parse_status_line(line) {
                    parsed.status = code;
                    parsed.status_line = Some(line.to_string());
                }
            }
        }
    }

    debug!(
        status = parsed.status,
        headers = parsed.entries.len(),
        redirected = parsed.redirected(),
        "parsed header block"
    );

    parsed
}
