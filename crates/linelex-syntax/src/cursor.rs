//! A read-only view over the unconsumed part of one line.
//!
//! ## Learning: `Copy` cursors
//!
//! `TextCursor` is a handful of integers and two borrowed slices, so it
//! derives `Copy`. Rules receive `&TextCursor` and can never move it;
//! rules that need to look further ahead (number suffixes) make a shifted
//! copy instead of mutating the caller's cursor.

use std::collections::HashSet;

/// Characters that end a word for keyword and `WordDetect` matching.
pub const DEFAULT_DELIMITERS: &str = " \t.():!+,-<=>%&*/;?[]^{|}~\\";

/// A grammar-wide delimiter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    chars: HashSet<char>,
}

impl Delimiters {
    /// Builds the default set, minus `weak` and plus `additional`.
    pub fn new(weak: &str, additional: &str) -> Self {
        let mut chars: HashSet<char> = DEFAULT_DELIMITERS.chars().collect();
        for c in weak.chars() {
            chars.remove(&c);
        }
        chars.extend(additional.chars());
        Self { chars }
    }

    /// Returns true if `c` separates words.
    #[inline]
    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new("", "")
    }
}

/// One line of text, decoded once into chars with a byte-offset table.
///
/// Columns everywhere in the engine are char indices; the offset table
/// lets regex matching work on `&str` slices without re-scanning.
#[derive(Debug)]
pub struct LineText<'a> {
    text: &'a str,
    chars: Vec<char>,
    offsets: Vec<usize>,
}

impl<'a> LineText<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut chars = Vec::with_capacity(text.len());
        let mut offsets = Vec::with_capacity(text.len() + 1);
        for (offset, c) in text.char_indices() {
            offsets.push(offset);
            chars.push(c);
        }
        offsets.push(text.len());
        Self {
            text,
            chars,
            offsets,
        }
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn as_str(&self) -> &'a str {
        self.text
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Converts a byte offset inside the line to a char column.
    fn column_of_byte(&self, byte: usize) -> usize {
        self.offsets.partition_point(|&offset| offset < byte)
    }
}

/// Position and flags of a cursor, detached from the borrowed line data.
///
/// The line loop swaps the active dynamic data whenever the context stack
/// changes; a mark lets it rebuild the cursor without rescanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CursorMark {
    pub(crate) pos: usize,
    only_spaces_before: bool,
    word_start: bool,
}

impl CursorMark {
    pub(crate) fn start() -> Self {
        Self {
            pos: 0,
            only_spaces_before: true,
            word_start: true,
        }
    }
}

/// Cursor over the remainder of a [`LineText`].
///
/// Carries two flags that are updated as characters are consumed rather
/// than recomputed: whether only whitespace has been seen so far, and
/// whether the next position starts a word.
#[derive(Debug, Clone, Copy)]
pub struct TextCursor<'t> {
    line: &'t LineText<'t>,
    data: &'t [String],
    pos: usize,
    only_spaces_before: bool,
    word_start: bool,
}

impl<'t> TextCursor<'t> {
    /// Creates a cursor at column 0 with the active dynamic data.
    pub fn new(line: &'t LineText<'t>, data: &'t [String]) -> Self {
        Self {
            line,
            data,
            pos: 0,
            only_spaces_before: true,
            word_start: true,
        }
    }

    /// Rebuilds a cursor from a mark taken on the same line.
    pub(crate) fn resume(line: &'t LineText<'t>, data: &'t [String], mark: CursorMark) -> Self {
        Self {
            line,
            data,
            pos: mark.pos,
            only_spaces_before: mark.only_spaces_before,
            word_start: mark.word_start,
        }
    }

    pub(crate) fn mark(&self) -> CursorMark {
        CursorMark {
            pos: self.pos,
            only_spaces_before: self.only_spaces_before,
            word_start: self.word_start,
        }
    }

    /// Replaces the dynamic data exposed to rules.
    pub fn with_data(mut self, data: &'t [String]) -> Self {
        self.data = data;
        self
    }

    /// Consumes one character.
    pub fn shift_once(&mut self) {
        if let Some(&c) = self.line.chars.get(self.pos) {
            if !c.is_whitespace() {
                self.only_spaces_before = false;
            }
            self.word_start = !is_word_char(c);
            self.pos += 1;
        }
    }

    /// Consumes `n` characters.
    pub fn shift(&mut self, n: usize) {
        for _ in 0..n {
            self.shift_once();
        }
    }

    /// Returns a copy of this cursor advanced by `n` characters.
    pub fn shifted(mut self, n: usize) -> Self {
        self.shift(n);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.line.len()
    }

    /// Current column (char index into the line).
    pub fn column(&self) -> usize {
        self.pos
    }

    /// True while every character before the cursor is whitespace.
    pub fn is_first_non_space(&self) -> bool {
        self.only_spaces_before
    }

    /// True at column 0 or after a non-word character.
    pub fn is_word_start(&self) -> bool {
        self.word_start
    }

    /// Remaining characters.
    pub fn rest(&self) -> &'t [char] {
        &self.line.chars[self.pos.min(self.line.len())..]
    }

    /// Remaining text as a string slice.
    pub fn rest_str(&self) -> &'t str {
        let start = self.line.offsets[self.pos.min(self.line.len())];
        &self.line.text[start..]
    }

    /// Number of chars in the first `bytes` bytes of [`rest_str`](Self::rest_str).
    pub fn chars_in_bytes(&self, bytes: usize) -> usize {
        let start = self.line.offsets[self.pos.min(self.line.len())];
        self.line.column_of_byte(start + bytes) - self.pos
    }

    /// Character at `offset` past the cursor.
    pub fn peek(&self, offset: usize) -> Option<char> {
        self.line.chars.get(self.pos + offset).copied()
    }

    /// Character immediately before the cursor.
    pub fn prev_char(&self) -> Option<char> {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.line.chars.get(i))
            .copied()
    }

    /// Captured data of the current context (`%N` substitutions).
    pub fn data(&self) -> &'t [String] {
        self.data
    }

    /// The delimiter-bounded word at the cursor.
    ///
    /// Only returns a word when the cursor itself sits on a word boundary,
    /// i.e. at line start or right after a delimiter. That gives
    /// whole-word keyword matching without a separate tokenizer pass.
    pub fn word(&self, delimiters: &Delimiters) -> Option<&'t str> {
        if let Some(prev) = self.prev_char() {
            if !delimiters.contains(prev) {
                return None;
            }
        }
        let rest = self.rest();
        let len = rest
            .iter()
            .position(|&c| delimiters.contains(c))
            .unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        let start = self.line.offsets[self.pos];
        let end = self.line.offsets[self.pos + len];
        Some(&self.line.text[start..end])
    }
}

/// Letters, digits and underscore.
#[inline]
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_tracks_first_non_space() {
        let line = LineText::new("  ab");
        let mut cursor = TextCursor::new(&line, &[]);
        assert!(cursor.is_first_non_space());
        cursor.shift(2);
        assert!(cursor.is_first_non_space());
        cursor.shift_once();
        assert!(!cursor.is_first_non_space());
        assert_eq!(cursor.column(), 3);
    }

    #[test]
    fn test_word_start_flag() {
        let line = LineText::new("a.b1");
        let mut cursor = TextCursor::new(&line, &[]);
        assert!(cursor.is_word_start());
        cursor.shift_once();
        assert!(!cursor.is_word_start());
        cursor.shift_once();
        assert!(cursor.is_word_start());
    }

    #[test]
    fn test_word_requires_boundary_before() {
        let delimiters = Delimiters::default();
        let line = LineText::new("foo(bar) xbaz");
        let mut cursor = TextCursor::new(&line, &[]);
        assert_eq!(cursor.word(&delimiters), Some("foo"));

        cursor.shift(1);
        assert_eq!(cursor.word(&delimiters), None);

        cursor.shift(3);
        assert_eq!(cursor.word(&delimiters), Some("bar"));
    }

    #[test]
    fn test_word_none_on_delimiter() {
        let delimiters = Delimiters::default();
        let line = LineText::new("(x)");
        let cursor = TextCursor::new(&line, &[]);
        assert_eq!(cursor.word(&delimiters), None);
    }

    #[test]
    fn test_weak_and_additional_delimiters() {
        let delimiters = Delimiters::new("-", "@");
        assert!(!delimiters.contains('-'));
        assert!(delimiters.contains('@'));
        assert!(delimiters.contains(' '));
    }

    #[test]
    fn test_multibyte_columns() {
        let line = LineText::new("é\"x\"");
        let mut cursor = TextCursor::new(&line, &[]);
        cursor.shift_once();
        assert_eq!(cursor.rest_str(), "\"x\"");
        assert_eq!(cursor.chars_in_bytes(3), 3);
        assert_eq!(cursor.peek(0), Some('"'));
        assert_eq!(cursor.prev_char(), Some('é'));
    }

    #[test]
    fn test_mark_and_resume() {
        let line = LineText::new(" ab");
        let mut cursor = TextCursor::new(&line, &[]);
        cursor.shift(2);
        let mark = cursor.mark();

        let data = vec!["x".to_string()];
        let resumed = TextCursor::resume(&line, &data, mark);
        assert_eq!(resumed.column(), 2);
        assert!(!resumed.is_first_non_space());
        assert!(!resumed.is_word_start());
        assert_eq!(resumed.data(), &data[..]);
    }

    #[test]
    fn test_shift_past_end_is_noop() {
        let line = LineText::new("a");
        let mut cursor = TextCursor::new(&line, &[]);
        cursor.shift(5);
        assert!(cursor.is_empty());
        assert_eq!(cursor.column(), 1);
        assert_eq!(cursor.rest_str(), "");
    }
}
