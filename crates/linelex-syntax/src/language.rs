//! Languages and the per-line highlighting loop.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::context::{Context, LineSink};
use crate::cursor::{CursorMark, Delimiters, LineText, TextCursor};
use crate::registry::Limits;
use crate::stack::{ContextPtr, ContextStack};
use crate::style::{Style, TextType};

/// The `<language>` element: everything needed to list and choose a
/// grammar without building its contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageHeader {
    /// Registry id (file stem of the grammar).
    pub id: String,
    pub name: String,
    pub section: String,
    /// Filename globs, e.g. `*.c`.
    pub extensions: Vec<String>,
    pub mimetypes: Vec<String>,
    /// Globs matched against the first line of a file, e.g. `#!*sh*`.
    pub first_line_globs: Vec<String>,
    pub priority: i32,
    pub hidden: bool,
    pub indenter: Option<String>,
}

/// A loaded grammar. Immutable once linked; shared through `Arc`.
#[derive(Debug)]
pub struct Language {
    pub(crate) header: LanguageHeader,
    pub(crate) single_line_comment: Option<String>,
    pub(crate) multi_line_comment: Option<(String, String)>,
    pub(crate) keywords: HashSet<String>,
    pub(crate) case_sensitive: bool,
    pub(crate) delimiters: Arc<Delimiters>,
    pub(crate) indentation_based_folding: bool,
    pub(crate) styles: HashMap<String, Arc<Style>>,
    pub(crate) contexts: Vec<Context>,
    pub(crate) context_index: HashMap<String, usize>,
    pub(crate) limits: Limits,
    pub(crate) linked: LinkedLanguages,
}

/// Other languages this one switches into or includes rules from.
///
/// Context references only hold weak handles, so these strong ones keep
/// the targets alive for as long as this language is. Set once linking
/// succeeds.
#[derive(Default)]
pub(crate) struct LinkedLanguages(OnceCell<Vec<Arc<Language>>>);

impl LinkedLanguages {
    pub(crate) fn set(&self, languages: Vec<Arc<Language>>) {
        if self.0.set(languages).is_err() {
            tracing::trace!("Linked languages already recorded");
        }
    }

    fn get(&self) -> &[Arc<Language>] {
        self.0.get().map(Vec::as_slice).unwrap_or_default()
    }
}

// Linked languages may point back at us; print ids only.
impl fmt::Debug for LinkedLanguages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.get().iter().map(|language| language.id()))
            .finish()
    }
}

impl Language {
    pub fn header(&self) -> &LanguageHeader {
        &self.header
    }

    pub fn id(&self) -> &str {
        &self.header.id
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn indenter(&self) -> Option<&str> {
        self.header.indenter.as_deref()
    }

    pub fn single_line_comment(&self) -> Option<&str> {
        self.single_line_comment.as_deref()
    }

    /// `(start, end)` markers of block comments.
    pub fn multi_line_comment(&self) -> Option<(&str, &str)> {
        self.multi_line_comment
            .as_ref()
            .map(|(start, end)| (start.as_str(), end.as_str()))
    }

    /// Every word of every keyword list (lower-cased if the grammar is
    /// case-insensitive).
    pub fn keywords(&self) -> &HashSet<String> {
        &self.keywords
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// True if the grammar asks for indentation-based folding.
    pub fn indentation_based_folding(&self) -> bool {
        self.indentation_based_folding
    }

    /// Looks up a style by its `<itemData>` name (case-insensitive).
    pub fn style(&self, name: &str) -> Option<&Arc<Style>> {
        self.styles.get(&name.to_lowercase())
    }

    /// Languages reached through cross-grammar references, without this
    /// one. Empty until the language is linked.
    pub fn linked_languages(&self) -> &[Arc<Language>] {
        self.linked.get()
    }

    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    pub fn context(&self, name: &str) -> Option<&Context> {
        self.context_index.get(name).map(|&i| &self.contexts[i])
    }

    pub(crate) fn context_at(&self, index: usize) -> &Context {
        &self.contexts[index]
    }

    /// The first declared context.
    pub fn default_context(&self) -> &Context {
        &self.contexts[0]
    }

    /// Entering state for the first line of a document.
    pub fn default_stack(self: &Arc<Self>) -> ContextStack {
        ContextStack::new(ContextPtr::new(self.clone(), 0))
    }

    /// Highlights one line, starting from the state the previous line
    /// ended in (or the default state when there is none).
    ///
    /// Never fails: grammar anomalies degrade to "no match".
    pub fn highlight_line(self: &Arc<Self>, text: &str, prev: Option<&LineState>) -> HighlightedLine {
        let entering = match prev {
            Some(state) => state.stack.clone(),
            None => self.default_stack(),
        };
        let regions = prev.map(|state| state.regions.clone()).unwrap_or_default();

        let line = LineText::new(text);
        let mut sink = LineSink::new(line.len(), regions);
        let mut stack = entering.clone();

        if line.is_empty() {
            let empty = stack.current().context().line_empty();
            stack = match empty {
                Some(switcher) => stack.switch_context(switcher, None),
                None => self.end_of_line(stack),
            };
        } else {
            stack = self.parse_line(&line, stack, &mut sink);
            if !sink.line_continue {
                stack = self.end_of_line(stack);
            }
        }

        if let Some(switcher) = stack.current().context().line_begin() {
            stack = stack.switch_context(switcher, None);
        }

        HighlightedLine {
            segments: sink.segments,
            state: LineState {
                entering,
                stack,
                text_types: TextTypeMap(sink.text_types),
                regions: sink.regions,
            },
        }
    }

    fn parse_line(&self, line: &LineText<'_>, mut stack: ContextStack, sink: &mut LineSink) -> ContextStack {
        let mut mark = CursorMark::start();
        let mut stalled = 0;

        while mark.pos < line.len() {
            let before = mark.pos;
            let next = {
                let mut cursor = TextCursor::resume(line, stack.current_data(), mark);
                let next = stack
                    .current()
                    .context()
                    .parse_segment(&stack, &mut cursor, sink, &self.limits);
                mark = cursor.mark();
                next
            };
            stack = next;

            if mark.pos > before {
                stalled = 0;
                continue;
            }
            stalled += 1;
            if stalled > self.limits.max_zero_progress_steps {
                tracing::debug!(
                    "No progress after {} context switches at column {} in '{}', skipping a char",
                    stalled,
                    mark.pos,
                    self.name()
                );
                let mut cursor = TextCursor::resume(line, &[], mark);
                sink.push(mark.pos, 1, stack.current().context().style());
                sink.line_continue = false;
                cursor.shift_once();
                mark = cursor.mark();
                stalled = 0;
            }
        }
        stack
    }

    /// Follows end-of-line directives until one leaves the stack unchanged
    /// or a context repeats.
    ///
    /// A directive repeats when its new top was already on top during this
    /// loop, or when it pushes a context the stack already holds. Cycles of
    /// pushes (`A` ends into `B`, `B` back into `A`) would otherwise grow
    /// the stack on every line. On a repeat the shallower stack is kept.
    fn end_of_line(&self, mut stack: ContextStack) -> ContextStack {
        let mut visited = vec![stack.current().clone()];
        for _ in 0..=self.limits.max_zero_progress_steps {
            let Some(switcher) = stack.current().context().line_end() else {
                return stack;
            };
            let next = stack.switch_context(switcher, None);
            if next == stack {
                return stack;
            }
            let top = next.current();
            let pushes_again = next.depth() > stack.depth() && stack.contains(top);
            if visited.contains(top) || pushes_again {
                tracing::debug!(
                    "End-of-line directives in '{}' cycle back to {:?}, stopping",
                    self.name(),
                    top
                );
                return if next.depth() < stack.depth() { next } else { stack };
            }
            visited.push(top.clone());
            stack = next;
        }
        tracing::warn!(
            "End-of-line directives in '{}' do not settle, stopping at {:?}",
            self.name(),
            stack
        );
        stack
    }
}

/// A run of characters sharing one style. Offsets are char columns.
#[derive(Debug, Clone)]
pub struct StyledSegment {
    pub start: usize,
    pub len: usize,
    pub style: Arc<Style>,
}

impl PartialEq for StyledSegment {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.len == other.len && *self.style == *other.style
    }
}

/// One text type per character of a line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TextTypeMap(Vec<TextType>);

impl TextTypeMap {
    /// Text type at `column`, or `None` past the end of the line.
    pub fn get(&self, column: usize) -> Option<TextType> {
        self.0.get(column).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[TextType] {
        &self.0
    }
}

impl fmt::Display for TextTypeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0
            .iter()
            .try_for_each(|text_type| write!(f, "{}", text_type.as_char()))
    }
}

/// What an editor stores per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineState {
    entering: ContextStack,
    stack: ContextStack,
    text_types: TextTypeMap,
    regions: Vec<Arc<str>>,
}

impl LineState {
    /// The stack the line was highlighted from.
    pub fn entering_stack(&self) -> &ContextStack {
        &self.entering
    }

    /// The stack the next line starts from.
    pub fn stack(&self) -> &ContextStack {
        &self.stack
    }

    pub fn text_types(&self) -> &TextTypeMap {
        &self.text_types
    }

    /// Text type at `column`; columns past the end are code.
    pub fn text_type(&self, column: usize) -> TextType {
        self.text_types.get(column).unwrap_or_default()
    }

    /// Open region tags, innermost last.
    pub fn regions(&self) -> &[Arc<str>] {
        &self.regions
    }

    pub fn folding_depth(&self) -> usize {
        self.regions.len()
    }

    /// Changes whenever the state handed to the next line changes.
    pub fn revalidation_hash(&self) -> u64 {
        let mut stack_hasher = DefaultHasher::new();
        self.stack.hash(&mut stack_hasher);
        let mut region_hasher = DefaultHasher::new();
        self.regions.hash(&mut region_hasher);
        stack_hasher.finish() ^ region_hasher.finish()
    }
}

/// Result of [`Language::highlight_line`].
#[derive(Debug, Clone)]
pub struct HighlightedLine {
    pub segments: Vec<StyledSegment>,
    pub state: LineState,
}

impl HighlightedLine {
    pub fn text_types(&self) -> &TextTypeMap {
        &self.state.text_types
    }
}
