//! Contexts: named lexer states and the per-segment matching loop.

use std::sync::Arc;

use crate::cursor::TextCursor;
use crate::language::StyledSegment;
use crate::registry::Limits;
use crate::rules::{MatchResult, Rule};
use crate::stack::ContextStack;
use crate::style::{Style, TextType};
use crate::switcher::ContextSwitcher;

/// A named lexer state: ordered rules plus line-boundary directives.
#[derive(Debug)]
pub struct Context {
    pub(crate) name: String,
    pub(crate) attribute: String,
    pub(crate) style: Arc<Style>,
    pub(crate) line_end: Option<ContextSwitcher>,
    pub(crate) line_begin: Option<ContextSwitcher>,
    pub(crate) line_empty: Option<ContextSwitcher>,
    pub(crate) fallthrough: Option<ContextSwitcher>,
    pub(crate) dynamic: bool,
    pub(crate) rules: Vec<Rule>,
}

impl Context {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `<itemData>` name this context styles unmatched text with.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn style(&self) -> &Arc<Style> {
        &self.style
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn line_end(&self) -> Option<&ContextSwitcher> {
        self.line_end.as_ref()
    }

    pub fn line_begin(&self) -> Option<&ContextSwitcher> {
        self.line_begin.as_ref()
    }

    pub fn line_empty(&self) -> Option<&ContextSwitcher> {
        self.line_empty.as_ref()
    }

    pub fn fallthrough(&self) -> Option<&ContextSwitcher> {
        self.fallthrough.as_ref()
    }

    /// First rule (in declaration order) that matches at the cursor.
    pub fn try_match(&self, cursor: &TextCursor<'_>) -> Option<MatchResult> {
        self.try_rules(cursor, 0, Limits::default().max_include_depth, &|_| true)
    }

    /// First rule whose result passes `accept`.
    pub(crate) fn try_rules(
        &self,
        cursor: &TextCursor<'_>,
        depth: usize,
        max_depth: usize,
        accept: &dyn Fn(&MatchResult) -> bool,
    ) -> Option<MatchResult> {
        self.rules
            .iter()
            .find_map(|rule| rule.try_match_at_depth(cursor, depth, max_depth, accept))
    }

    /// Runs this context over the rest of the line.
    ///
    /// Returns as soon as a match or a fallthrough changes the stack, or
    /// when the line is exhausted. `stack` must have this context on top.
    pub(crate) fn parse_segment(
        &self,
        stack: &ContextStack,
        cursor: &mut TextCursor<'_>,
        sink: &mut LineSink,
        limits: &Limits,
    ) -> ContextStack {
        // A zero-width match that goes nowhere would spin forever; it
        // counts as no match and later rules get their turn.
        let moves = |result: &MatchResult| {
            result.length > 0 || next_stack(stack, result) != *stack
        };

        while !cursor.is_empty() {
            if let Some(result) = self.try_rules(cursor, 0, limits.max_include_depth, &moves) {
                let next = next_stack(stack, &result);
                let changed = next != *stack;

                sink.apply_regions(&result);
                sink.line_continue = result.line_continue;

                let style = match &result.style {
                    Some(style) => style.clone(),
                    None if changed => next.current().context().style().clone(),
                    None => self.style.clone(),
                };
                sink.push(cursor.column(), result.length, &style);
                cursor.shift(result.length);

                if changed {
                    return next;
                }
                continue;
            }

            if let Some(switcher) = &self.fallthrough {
                let next = stack.switch_context(switcher, None);
                if next != *stack {
                    return next;
                }
            }

            sink.line_continue = false;
            sink.push(cursor.column(), 1, &self.style);
            cursor.shift_once();
        }
        stack.clone()
    }
}

fn next_stack(stack: &ContextStack, result: &MatchResult) -> ContextStack {
    match &result.transition {
        Some(transition) => stack.apply(transition, result.data.clone()),
        None => stack.clone(),
    }
}

/// Collects the output of one line while its segments are parsed.
#[derive(Debug)]
pub(crate) struct LineSink {
    pub(crate) segments: Vec<StyledSegment>,
    pub(crate) text_types: Vec<TextType>,
    pub(crate) regions: Vec<Arc<str>>,
    pub(crate) line_continue: bool,
}

impl LineSink {
    pub(crate) fn new(len: usize, regions: Vec<Arc<str>>) -> Self {
        Self {
            segments: Vec::new(),
            text_types: Vec::with_capacity(len),
            regions,
            line_continue: false,
        }
    }

    /// Styles `len` chars at `start`, merging with the previous segment
    /// when it is adjacent and uses the same style.
    pub(crate) fn push(&mut self, start: usize, len: usize, style: &Arc<Style>) {
        if len == 0 {
            return;
        }
        self.text_types
            .extend(std::iter::repeat_n(style.text_type(), len));
        if let Some(last) = self.segments.last_mut() {
            if last.start + last.len == start && Arc::ptr_eq(&last.style, style) {
                last.len += len;
                return;
            }
        }
        self.segments.push(StyledSegment {
            start,
            len,
            style: style.clone(),
        });
    }

    /// End tags close only a matching innermost region; begin tags open one.
    pub(crate) fn apply_regions(&mut self, result: &MatchResult) {
        if let Some(end) = &result.end_region {
            if self.regions.last() == Some(end) {
                self.regions.pop();
            } else {
                tracing::trace!("Ignoring unbalanced endRegion '{}'", end);
            }
        }
        if let Some(begin) = &result.begin_region {
            self.regions.push(begin.clone());
        }
    }
}
