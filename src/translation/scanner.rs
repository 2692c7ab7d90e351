#[derive(Clone)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    /// MySQL / SQLite `` `ident` ``
    Backtick,
    /// SQL Server / SQLite `[ident]`
    Bracketed,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

/// A placeholder found outside literals and comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Marker {
    pub start: usize,
    /// Exclusive byte offset.
    pub end: usize,
    pub kind: MarkerKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MarkerKind {
    /// `?`
    Bare,
    /// `?N`
    Question(usize),
    /// `$N`
    Dollar(usize),
}

pub(super) fn scan_digits(bytes: &[u8], start: usize) -> Option<(usize, usize)> {
    let mut idx = start;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx == start {
        None
    } else {
        std::str::from_utf8(&bytes[start..idx])
            .ok()
            .and_then(|digits| digits.parse().ok())
            .map(|number| (idx, number))
    }
}
