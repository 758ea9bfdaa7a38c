//! A highlighted text document.
//!
//! ## Learning: Incremental re-highlighting
//!
//! Each line's highlighting depends only on its own text and the state the
//! previous line handed over. After an edit, only the touched lines are
//! stale. Re-highlighting starts at the first stale line and walks down;
//! once a line past the edited range hands over the same state as before,
//! every later line is still valid and the walk stops.

use linelex_syntax::{
    HighlightedLine, Language, LanguageQuery, LineState, Registry, StyledSegment, TextFormat,
    TextType, Theme,
};
use ropey::Rope;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{CoreError, CoreResult};

/// Text plus one highlighting result per line.
#[derive(Debug)]
pub struct Document {
    rope: Rope,
    path: Option<PathBuf>,
    language: Option<Arc<Language>>,
    theme: Theme,
    /// Always `rope.len_lines()` long; `None` marks a stale line
    lines: Vec<Option<HighlightedLine>>,
    /// First line that needs highlighting, if any
    dirty_from: Option<usize>,
    /// Lines below this one are only revisited until their state settles
    edited_until: usize,
}

impl Document {
    /// Creates a document from text and highlights it.
    pub fn from_str(text: &str, language: Option<Arc<Language>>) -> Self {
        let rope = Rope::from_str(text);
        let line_count = rope.len_lines();
        let mut doc = Self {
            rope,
            path: None,
            language,
            theme: Theme::default(),
            lines: vec![None; line_count],
            dirty_from: Some(0),
            edited_until: line_count,
        };
        doc.rehighlight();
        doc
    }

    /// Opens a file, choosing its grammar from the file name and first line.
    pub fn open(path: impl AsRef<Path>, registry: &Registry) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let first_line = text.lines().next();
        let query = LanguageQuery {
            file_path: Some(path),
            first_line,
            ..Default::default()
        };
        let language = match registry.choose_language(&query) {
            Some(id) => Some(registry.load_language(&id)?),
            None => {
                tracing::debug!("No grammar for {}", path.display());
                None
            }
        };
        let mut doc = Self::from_str(&text, language);
        doc.path = Some(path.to_path_buf());
        Ok(doc)
    }

    // ==================== Getters ====================

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn language(&self) -> Option<&Arc<Language>> {
        self.language.as_ref()
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Text of one line without its line break.
    pub fn line(&self, line: usize) -> CoreResult<String> {
        self.check_line(line)?;
        Ok(line_text(&self.rope, line))
    }

    // ==================== Settings ====================

    /// Switches grammar; every line becomes stale.
    pub fn set_language(&mut self, language: Option<Arc<Language>>) {
        self.language = language;
        self.lines.iter_mut().for_each(|line| *line = None);
        self.dirty_from = Some(0);
        self.edited_until = self.lines.len();
        self.rehighlight();
    }

    /// Changes the display theme. Highlighting results stay valid since
    /// styles only map to formats when asked.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    // ==================== Editing ====================

    /// Inserts `text` at a char offset and re-highlights.
    pub fn insert(&mut self, char_idx: usize, text: &str) -> CoreResult<usize> {
        if char_idx > self.rope.len_chars() {
            return Err(CoreError::InvalidRange(format!(
                "insert at {} past end {}",
                char_idx,
                self.rope.len_chars()
            )));
        }
        self.edit(char_idx..char_idx, |rope| rope.insert(char_idx, text));
        Ok(self.rehighlight())
    }

    /// Removes a char range and re-highlights.
    pub fn remove(&mut self, range: Range<usize>) -> CoreResult<usize> {
        if range.start > range.end || range.end > self.rope.len_chars() {
            return Err(CoreError::InvalidRange(format!(
                "{:?} in document of {} chars",
                range,
                self.rope.len_chars()
            )));
        }
        let edit_range = range.clone();
        self.edit(edit_range, |rope| rope.remove(range));
        Ok(self.rehighlight())
    }

    /// Replaces a char range with `text` and re-highlights.
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> CoreResult<usize> {
        if range.start > range.end || range.end > self.rope.len_chars() {
            return Err(CoreError::InvalidRange(format!(
                "{:?} in document of {} chars",
                range,
                self.rope.len_chars()
            )));
        }
        let start = range.start;
        let edit_range = range.clone();
        self.edit(edit_range, |rope| {
            rope.remove(range);
            rope.insert(start, text);
        });
        Ok(self.rehighlight())
    }

    /// Applies a rope mutation covering `range` and marks the lines it
    /// touched as stale, keeping `lines` aligned with the rope.
    fn edit(&mut self, range: Range<usize>, apply: impl FnOnce(&mut Rope)) {
        let first = self.rope.char_to_line(range.start);
        let old_last = self.rope.char_to_line(range.end);
        let old_count = self.rope.len_lines();

        apply(&mut self.rope);

        let new_count = self.rope.len_lines();
        let removed = old_last - first + 1;
        let added = removed + new_count - old_count;
        self.lines
            .splice(first..first + removed, std::iter::repeat_n(None, added));

        self.dirty_from = Some(self.dirty_from.map_or(first, |dirty| dirty.min(first)));
        self.edited_until = self.edited_until.max(first + added);
        tracing::trace!(first, removed, added, "Edited lines");
    }

    // ==================== Highlighting ====================

    /// Re-highlights stale lines. Returns how many lines were processed.
    pub fn rehighlight(&mut self) -> usize {
        let Some(language) = self.language.clone() else {
            return 0;
        };
        let Some(start) = self.dirty_from.take() else {
            return 0;
        };

        let mut processed = 0;
        for line in start..self.lines.len() {
            let previous = line
                .checked_sub(1)
                .and_then(|prev| self.lines[prev].as_ref())
                .map(|highlighted| &highlighted.state);
            let text = line_text(&self.rope, line);
            let highlighted = language.highlight_line(&text, previous);
            processed += 1;

            let settled = line >= self.edited_until
                && self.lines[line].as_ref().is_some_and(|old| {
                    old.state.revalidation_hash() == highlighted.state.revalidation_hash()
                });
            self.lines[line] = Some(highlighted);
            if settled {
                break;
            }
        }
        self.edited_until = 0;
        tracing::debug!(start, processed, "Re-highlighted lines");
        processed
    }

    /// Highlighting result of one line.
    pub fn highlighted(&self, line: usize) -> CoreResult<Option<&HighlightedLine>> {
        self.check_line(line)?;
        Ok(self.lines[line].as_ref())
    }

    pub fn line_state(&self, line: usize) -> CoreResult<Option<&LineState>> {
        Ok(self.highlighted(line)?.map(|highlighted| &highlighted.state))
    }

    pub fn segments(&self, line: usize) -> CoreResult<&[StyledSegment]> {
        Ok(self
            .highlighted(line)?
            .map(|highlighted| highlighted.segments.as_slice())
            .unwrap_or(&[]))
    }

    /// Text type at a char column; unhighlighted text counts as code.
    pub fn text_type(&self, line: usize, column: usize) -> CoreResult<TextType> {
        Ok(self
            .line_state(line)?
            .map(|state| state.text_type(column))
            .unwrap_or_default())
    }

    /// Number of open folding regions after `line`.
    pub fn folding_depth(&self, line: usize) -> CoreResult<usize> {
        Ok(self
            .line_state(line)?
            .map(LineState::folding_depth)
            .unwrap_or(0))
    }

    /// Display formats for one line under the current theme.
    pub fn formats(&self, line: usize) -> CoreResult<Vec<(Range<usize>, TextFormat)>> {
        Ok(self
            .segments(line)?
            .iter()
            .map(|segment| {
                (
                    segment.start..segment.start + segment.len,
                    segment.style.format(&self.theme),
                )
            })
            .collect())
    }

    fn check_line(&self, line: usize) -> CoreResult<()> {
        let len = self.rope.len_lines();
        if line >= len {
            return Err(CoreError::LineOutOfRange { line, len });
        }
        Ok(())
    }
}

/// Line text with the trailing line break stripped.
fn line_text(rope: &Rope, line: usize) -> String {
    let mut text = rope.line(line).to_string();
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}
