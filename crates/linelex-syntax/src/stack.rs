//! The context stack: the complete lexical state carried between lines.
//!
//! ## Learning: Persistent values
//!
//! `ContextStack` is immutable. Switching produces a new stack and leaves
//! the old one intact, so a line's entering state can be stored next to the
//! line and compared later without defensive copies. Equality and hashing
//! are structural: same contexts (by identity) with the same captured data.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::context::Context;
use crate::language::Language;
use crate::switcher::{ContextSwitcher, Transition};

/// A strong handle to one context of a language.
///
/// Compares by identity: same language allocation, same arena index.
#[derive(Clone)]
pub struct ContextPtr {
    language: Arc<Language>,
    index: usize,
}

impl ContextPtr {
    pub(crate) fn new(language: Arc<Language>, index: usize) -> Self {
        Self { language, index }
    }

    pub fn context(&self) -> &Context {
        self.language.context_at(self.index)
    }

    pub fn language(&self) -> &Arc<Language> {
        &self.language
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl PartialEq for ContextPtr {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && Arc::ptr_eq(&self.language, &other.language)
    }
}

impl Eq for ContextPtr {}

impl Hash for ContextPtr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.language) as usize).hash(state);
        self.index.hash(state);
    }
}

impl fmt::Debug for ContextPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.language.name(), self.context().name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StackEntry {
    context: ContextPtr,
    data: Option<Arc<[String]>>,
}

/// Ordered (context, captured data) entries; entry 0 is the language's
/// default context and is never popped.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContextStack {
    entries: Arc<[StackEntry]>,
}

impl ContextStack {
    /// A one-entry stack holding `root`.
    pub fn new(root: ContextPtr) -> Self {
        Self {
            entries: Arc::from(vec![StackEntry {
                context: root,
                data: None,
            }]),
        }
    }

    /// The top entry's context.
    pub fn current(&self) -> &ContextPtr {
        // Invariant: never empty.
        &self.entries[self.entries.len() - 1].context
    }

    /// Captured data attached to the top entry.
    pub fn current_data(&self) -> &[String] {
        self.entries[self.entries.len() - 1]
            .data
            .as_deref()
            .unwrap_or(&[])
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// True if `context` is on the stack at any level.
    pub fn contains(&self, context: &ContextPtr) -> bool {
        self.entries.iter().any(|entry| entry.context == *context)
    }

    /// Context names from bottom to top.
    pub fn context_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.context.context().name().to_string())
            .collect()
    }

    /// Applies a parsed switcher. Unreachable targets leave the stack as is.
    pub fn switch_context(&self, switcher: &ContextSwitcher, data: Option<Arc<[String]>>) -> Self {
        match switcher.transition() {
            Some(transition) => self.apply(&transition, data),
            None => self.clone(),
        }
    }

    /// Pops `transition.pops` entries (always leaving the root), then pushes
    /// the target if there is one. Data is kept only for dynamic targets.
    pub fn apply(&self, transition: &Transition, data: Option<Arc<[String]>>) -> Self {
        let len = self.entries.len();
        let keep = len.saturating_sub(transition.pops).max(1);
        if transition.pops >= len {
            tracing::debug!(
                "#pop count {} exceeds stack depth {}, clamping",
                transition.pops,
                len
            );
        }

        if keep == len && transition.target.is_none() {
            return self.clone();
        }

        let mut entries: Vec<StackEntry> = self.entries[..keep].to_vec();
        if let Some(target) = &transition.target {
            let data = if target.context().is_dynamic() { data } else { None };
            entries.push(StackEntry {
                context: target.clone(),
                data,
            });
        }
        Self {
            entries: Arc::from(entries),
        }
    }
}

impl fmt::Debug for ContextStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| &entry.context))
            .finish()
    }
}
