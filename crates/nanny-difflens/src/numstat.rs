//! Parsing of `git diff --numstat` lines.
//!
//! Each line reads `<inserted>\t<deleted>\t<path>`. Binary files print `-`
//! in place of both counts; such lines fail [`is_stat_line`] and callers
//! drop them before parsing.
//!
//! Git C-quotes paths holding `"`, `\` or control characters even with
//! `core.quotepath=off`; [`StatLine::target_path`] undoes that.

use std::borrow::Cow;
use std::fmt;

/// A line count parsed from one numstat field.
///
/// # Examples
///
/// ```
/// use nanny_difflens::numstat::Count;
///
/// assert_eq!(Count::parse("42"), Count::Lines(42));
/// assert_eq!(Count::parse("-"), Count::Unparseable);
/// assert_eq!(Count::parse("-").lines(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    /// A decimal line count.
    Lines(u64),
    /// The field was not a decimal integer (e.g. the binary marker `-`).
    Unparseable,
}

impl Count {
    /// Parse a decimal field. Anything else is [`Count::Unparseable`],
    /// never zero.
    pub fn parse(field: &str) -> Self {
        field.parse().map_or(Count::Unparseable, Count::Lines)
    }

    /// The count, if the field was numeric.
    pub fn lines(self) -> Option<u64> {
        match self {
            Count::Lines(n) => Some(n),
            Count::Unparseable => None,
        }
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Count::Lines(n) => write!(f, "{n}"),
            Count::Unparseable => write!(f, "-"),
        }
    }
}

/// One parsed numstat line.
///
/// # Examples
///
/// ```
/// use nanny_difflens::numstat::{parse_stat_line, Count};
///
/// let line = parse_stat_line("3\t5\tsrc/app.ts");
/// assert_eq!(line.inserted, Count::Lines(3));
/// assert_eq!(line.deleted, Count::Lines(5));
/// assert_eq!(line.path, "src/app.ts");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatLine {
    pub inserted: Count,
    pub deleted: Count,
    /// Path as printed by git, including rename notation.
    pub path: String,
}

impl StatLine {
    /// Both counts, or `None` if either is unparseable.
    pub fn counts(&self) -> Option<(u64, u64)> {
        Some((self.inserted.lines()?, self.deleted.lines()?))
    }

    /// The path the change ends up at.
    ///
    /// Renames print as `old => new` or `dir/{old => new}/rest`; this
    /// returns the destination, unquoted, so exclusion patterns see a real
    /// path.
    ///
    /// # Examples
    ///
    /// ```
    /// use nanny_difflens::numstat::parse_stat_line;
    ///
    /// let line = parse_stat_line("1\t1\tsrc/{old.rs => new.rs}");
    /// assert_eq!(line.target_path(), "src/new.rs");
    ///
    /// let line = parse_stat_line(concat!("1\t0\t", r#""we\"ird.lock""#));
    /// assert_eq!(line.target_path(), "we\"ird.lock");
    /// ```
    pub fn target_path(&self) -> Cow<'_, str> {
        match rename_target(&self.path) {
            Cow::Borrowed(path) => unquote(path),
            Cow::Owned(path) => Cow::Owned(unquote(&path).into_owned()),
        }
    }
}

/// The strict line-shape guard: digits, tab, digits, tab.
///
/// Rejects binary markers, headers, and blank lines.
///
/// # Examples
///
/// ```
/// use nanny_difflens::numstat::is_stat_line;
///
/// assert!(is_stat_line("10\t2\tfile1.ts"));
/// assert!(!is_stat_line("-\t-\timg.png"));
/// assert!(!is_stat_line(""));
/// ```
pub fn is_stat_line(line: &str) -> bool {
    strip_count(line).and_then(strip_count).is_some()
}

/// Remove a leading `\d+\t` and return the rest.
fn strip_count(s: &str) -> Option<&str> {
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    s[digits..].strip_prefix('\t')
}

/// Split one line into inserted, deleted, and path.
///
/// Never fails: missing or non-numeric count fields come back as
/// [`Count::Unparseable`] and a missing path as the empty string.
pub fn parse_stat_line(line: &str) -> StatLine {
    let mut fields = line.splitn(3, '\t');
    let inserted = fields.next().map_or(Count::Unparseable, Count::parse);
    let deleted = fields.next().map_or(Count::Unparseable, Count::parse);
    let path = fields.next().unwrap_or_default().to_string();
    StatLine {
        inserted,
        deleted,
        path,
    }
}

fn rename_target(path: &str) -> Cow<'_, str> {
    const ARROW: &str = " => ";

    if !path.contains(ARROW) {
        return Cow::Borrowed(path);
    }

    if let (Some(open), Some(close)) = (path.find('{'), path.rfind('}')) {
        if open < close {
            let inner = &path[open + 1..close];
            if let Some((_, new)) = inner.split_once(ARROW) {
                let joined = format!("{}{}{}", &path[..open], new, &path[close + 1..]);
                return Cow::Owned(joined.replace("//", "/"));
            }
        }
    }

    match path.split_once(ARROW) {
        Some((_, new)) => Cow::Borrowed(new),
        None => Cow::Borrowed(path),
    }
}

/// Decode a path git wrapped in double quotes with C-style escapes.
///
/// Unquoted paths are returned as they are. Octal escapes are raw bytes,
/// so multi-byte characters are reassembled before decoding as UTF-8.
fn unquote(path: &str) -> Cow<'_, str> {
    let Some(inner) = path
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return Cow::Borrowed(path);
    };

    let mut decoded = Vec::with_capacity(inner.len());
    let mut bytes = inner.bytes().peekable();
    while let Some(byte) = bytes.next() {
        if byte != b'\\' {
            decoded.push(byte);
            continue;
        }
        match bytes.next() {
            Some(b'a') => decoded.push(0x07),
            Some(b'b') => decoded.push(0x08),
            Some(b't') => decoded.push(b'\t'),
            Some(b'n') => decoded.push(b'\n'),
            Some(b'v') => decoded.push(0x0b),
            Some(b'f') => decoded.push(0x0c),
            Some(b'r') => decoded.push(b'\r'),
            Some(first @ b'0'..=b'3') => {
                let mut value = first - b'0';
                for _ in 0..2 {
                    match bytes.peek() {
                        Some(&digit @ b'0'..=b'7') => {
                            value = value * 8 + (digit - b'0');
                            bytes.next();
                        }
                        _ => break,
                    }
                }
                decoded.push(value);
            }
            Some(other) => decoded.push(other),
            None => decoded.push(b'\\'),
        }
    }

    Cow::Owned(String::from_utf8_lossy(&decoded).into_owned())
}
