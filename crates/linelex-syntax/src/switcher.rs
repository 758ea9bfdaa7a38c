//! Context transitions: `#stay`, `#pop`, `#pop#pop!Target`, `Target`,
//! `Target##Grammar` and `##Grammar`.
//!
//! A switcher is parsed once at load time. Its target is resolved in a
//! second pass (after every context of the grammar exists), so the
//! resolved handle lives in a set-once cell.

use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::language::Language;
use crate::stack::ContextPtr;
use crate::{SyntaxError, SyntaxResult};

/// Where a switch or an `IncludeRules` points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextTarget {
    /// A context of the same grammar.
    Local(String),
    /// A context of another grammar; `None` means its default context.
    External {
        context: Option<String>,
        grammar: String,
    },
}

impl ContextTarget {
    /// Parses `Name`, `Name##Grammar` or `##Grammar`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        match text.split_once("##") {
            Some((context, grammar)) if !grammar.is_empty() && !grammar.contains("##") => {
                Some(Self::External {
                    context: (!context.is_empty()).then(|| context.to_string()),
                    grammar: grammar.to_string(),
                })
            }
            Some(_) => None,
            None => Some(Self::Local(text.to_string())),
        }
    }
}

impl fmt::Display for ContextTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(name) => f.write_str(name),
            Self::External { context, grammar } => {
                write!(f, "{}##{}", context.as_deref().unwrap_or(""), grammar)
            }
        }
    }
}

/// A resolved, non-owning handle to a context in some language's arena.
#[derive(Debug, Clone)]
pub(crate) struct ContextRef {
    language: Weak<Language>,
    index: usize,
}

impl ContextRef {
    pub(crate) fn new(language: &Arc<Language>, index: usize) -> Self {
        Self {
            language: Arc::downgrade(language),
            index,
        }
    }

    /// Upgrades to a strong pointer. Fails only if the owning language was
    /// dropped, which linked languages prevent by holding their targets.
    pub(crate) fn upgrade(&self) -> Option<ContextPtr> {
        self.language
            .upgrade()
            .map(|language| ContextPtr::new(language, self.index))
    }
}

/// A target plus its resolution slot, filled when the owning language is
/// linked.
#[derive(Debug)]
pub struct ContextReference {
    target: ContextTarget,
    resolved: OnceCell<ContextRef>,
}

impl ContextReference {
    pub(crate) fn new(target: ContextTarget) -> Self {
        Self {
            target,
            resolved: OnceCell::new(),
        }
    }

    pub fn target(&self) -> &ContextTarget {
        &self.target
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    pub(crate) fn resolve_to(&self, reference: ContextRef) {
        // Linking runs once per language; a second call keeps the first value.
        let _ = self.resolved.set(reference);
    }

    /// The resolved context, if linking reached it and its language is
    /// still alive.
    pub fn get(&self) -> Option<ContextPtr> {
        self.resolved.get().and_then(ContextRef::upgrade)
    }
}

/// A parsed context operation.
///
/// `#stay` is represented as the absence of a switcher (`Option::None`),
/// so every `ContextSwitcher` does something: pops, a push, or both.
#[derive(Debug)]
pub struct ContextSwitcher {
    pops: usize,
    target: Option<ContextReference>,
    operation: String,
}

impl ContextSwitcher {
    /// Parses an operation string. Returns `Ok(None)` for `#stay` and for
    /// an empty operation.
    ///
    /// Fails on a malformed target (`Name##`, `a##b##c`), on `#stay`
    /// after pops and on any other `#` keyword.
    pub fn parse(operation: &str) -> SyntaxResult<Option<Self>> {
        let malformed =
            |why: &str| SyntaxError::Malformed(format!("context operation '{}': {}", operation, why));

        let mut rest = operation.trim();
        let mut pops = 0;
        while let Some(after) = rest.strip_prefix("#pop") {
            pops += 1;
            rest = after.strip_prefix('!').unwrap_or(after);
        }

        let target = if rest.is_empty() {
            None
        } else if rest == "#stay" {
            if pops > 0 {
                return Err(malformed("#stay after #pop"));
            }
            None
        } else if rest.starts_with('#') {
            return Err(malformed("unknown operation"));
        } else {
            let target = ContextTarget::parse(rest).ok_or_else(|| malformed("bad target"))?;
            Some(ContextReference::new(target))
        };

        if pops == 0 && target.is_none() {
            return Ok(None);
        }
        Ok(Some(Self {
            pops,
            target,
            operation: operation.to_string(),
        }))
    }

    /// How many entries this switch pops.
    pub fn pops(&self) -> usize {
        self.pops
    }

    /// The unresolved target, if the switch pushes one.
    pub fn target(&self) -> Option<&ContextTarget> {
        self.target.as_ref().map(ContextReference::target)
    }

    /// The original text, for diagnostics.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub(crate) fn reference(&self) -> Option<&ContextReference> {
        self.target.as_ref()
    }

    /// Produces the runtime transition.
    ///
    /// Returns `None` when the switch pushes a target that can no longer be
    /// reached; callers treat that as `#stay`.
    pub fn transition(&self) -> Option<Transition> {
        let target = match &self.target {
            Some(reference) => match reference.get() {
                Some(ptr) => Some(ptr),
                None => {
                    tracing::debug!("Context operation '{}' has no live target", self.operation);
                    return None;
                }
            },
            None => None,
        };
        Some(Transition {
            pops: self.pops,
            target,
        })
    }
}

/// A switch ready to apply to a [`ContextStack`](crate::ContextStack).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub pops: usize,
    pub target: Option<ContextPtr>,
}
