use std::borrow::Cow;

mod parsers;
mod scanner;

use parsers::{
    is_block_comment_end, is_block_comment_start, is_line_comment_start, matches_tag,
    try_start_dollar_quote,
};
use scanner::{Marker, MarkerKind, State, scan_digits};

/// Target placeholder style for translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style placeholders like `$1`.
    Postgres,
    /// SQLite-style placeholders like `?1`.
    Sqlite,
}

// `arr[?]`, `ARRAY[?]` and `(expr)[?]` are subscripts, not quoted identifiers.
fn opens_bracketed_identifier(bytes: &[u8], idx: usize) -> bool {
    let Some(&prev) = idx.checked_sub(1).and_then(|i| bytes.get(i)) else {
        return true;
    };
    !(prev.is_ascii_alphanumeric() || matches!(prev, b'_' | b']' | b')' | b'"'))
}

fn scan_markers(sql: &str) -> Vec<Marker> {
    let mut markers = Vec::new();
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'`' => state = State::Backtick,
                b'[' if opens_bracketed_identifier(bytes, idx) => state = State::Bracketed,
                _ if is_line_comment_start(bytes, idx) => {
                    state = State::LineComment;
                    idx += 1;
                }
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' => {
                    if let Some((tag, close)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = close;
                    } else if let Some((end, number)) = scan_digits(bytes, idx + 1) {
                        markers.push(Marker {
                            start: idx,
                            end,
                            kind: MarkerKind::Dollar(number),
                        });
                        idx = end - 1;
                    }
                }
                b'?' => {
                    if let Some((end, number)) = scan_digits(bytes, idx + 1) {
                        markers.push(Marker {
                            start: idx,
                            end,
                            kind: MarkerKind::Question(number),
                        });
                        idx = end - 1;
                    } else {
                        markers.push(Marker {
                            start: idx,
                            end: idx + 1,
                            kind: MarkerKind::Bare,
                        });
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::Backtick => {
                if b == b'`' {
                    if bytes.get(idx + 1) == Some(&b'`') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::Bracketed => {
                if b == b']' {
                    if bytes.get(idx + 1) == Some(&b']') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if matches_tag(bytes, idx, tag) {
                    idx += tag.len() + 1;
                    state = State::Normal;
                }
            }
        }
        idx += 1;
    }

    markers
}

/// Number of bind positions the SQL expects.
///
/// Bare `?` markers are numbered left to right; numbered markers (`?N`, `$N`) count up
/// to their highest index. Markers inside string literals, quoted identifiers, comments
/// and dollar-quoted blocks are ignored.
#[must_use]
pub fn count_placeholders(sql: &str) -> usize {
    let mut bare = 0;
    let mut highest = 0;
    for marker in scan_markers(sql) {
        match marker.kind {
            MarkerKind::Bare => bare += 1,
            MarkerKind::Question(n) | MarkerKind::Dollar(n) => highest = highest.max(n),
        }
    }
    bare.max(highest)
}

/// Whether the SQL contains at least one placeholder outside literals and comments.
#[must_use]
pub fn has_placeholders(sql: &str) -> bool {
    !scan_markers(sql).is_empty()
}

/// Rewrite placeholders into the target style.
///
/// For [`PlaceholderStyle::Postgres`] bare `?` becomes `$1, $2, ...` and `?N` becomes `$N`;
/// for [`PlaceholderStyle::Sqlite`] `$N` becomes `?N`. Returns a borrowed `Cow` when no
/// changes are needed.
#[must_use]
pub fn translate_placeholders(sql: &str, target: PlaceholderStyle) -> Cow<'_, str> {
    let markers = scan_markers(sql);
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut next_bare = 0;

    for marker in markers {
        let replacement = match (target, marker.kind) {
            (PlaceholderStyle::Postgres, MarkerKind::Bare) => {
                next_bare += 1;
                format!("${next_bare}")
            }
            (PlaceholderStyle::Postgres, MarkerKind::Question(n)) => format!("${n}"),
            (PlaceholderStyle::Sqlite, MarkerKind::Dollar(n)) => format!("?{n}"),
            _ => continue,
        };
        let buf = out.get_or_insert_with(|| String::with_capacity(sql.len() + 8));
        buf.push_str(&sql[copied..marker.start]);
        buf.push_str(&replacement);
        copied = marker.end;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}
