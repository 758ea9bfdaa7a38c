//! # Linelex Syntax
//!
//! A grammar-driven syntax highlighting engine that works one line at a time.
//!
//! ## How it fits together
//!
//! ```text
//! ┌──────────────┐  load_language(id)  ┌──────────────────────────────┐
//! │   Registry   │ ──────────────────▶ │ Language (Arc, immutable)     │
//! │ (grammar     │                     │  ├─ Context "Normal"          │
//! │  cache)      │                     │  │   └─ Rule, Rule, ...       │
//! └──────────────┘                     │  └─ Context "String" ...      │
//!                                      └──────────────┬───────────────┘
//!                                                     │ highlight_line(line, prev)
//!                                                     ▼
//!                         segments + text types + LineState (exit ContextStack)
//! ```
//!
//! A line is highlighted from the state the previous line ended in. Two
//! lines that end in equal states are interchangeable starting points for
//! the next line, which is what makes incremental re-highlighting cheap.
//!
//! ## Learning: Arenas instead of pointer graphs
//!
//! Contexts refer to each other freely (and across grammars), which would
//! mean reference cycles if each context owned its neighbours. Instead every
//! `Language` owns its contexts in a `Vec`, and references are indices plus
//! a `Weak` handle to the owning language. Nothing in the graph owns
//! anything else, so cycles are harmless.

mod context;
mod cursor;
mod language;
mod loader;
mod numeric;
mod registry;
mod rules;
mod stack;
mod style;
mod switcher;
mod theme;

pub use context::Context;
pub use cursor::{Delimiters, LineText, TextCursor};
pub use language::{HighlightedLine, Language, LanguageHeader, LineState, StyledSegment, TextTypeMap};
pub use registry::{
    Catalog, DirectorySource, GrammarSource, LanguageOverride, LanguageQuery, Limits,
    MemorySource, Registry, SYNTAX_PATH_ENV, global, install_global,
};
pub use rules::{MatchResult, Rule, RuleKind};
pub use stack::{ContextPtr, ContextStack};
pub use style::{DefaultStyle, Style, StyleOverrides, TextType};
pub use switcher::{ContextReference, ContextSwitcher, ContextTarget, Transition};
pub use theme::{Color, TextFormat, Theme};

/// Result type for syntax operations
pub type SyntaxResult<T> = Result<T, SyntaxError>;

/// Errors that can occur while loading grammars or themes.
///
/// Highlighting itself never fails; these only come out of loading.
#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed grammar XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Unknown grammar: {0}")]
    UnknownGrammar(String),

    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    #[error("Invalid boolean value '{value}' for attribute '{attribute}'")]
    InvalidBool { attribute: String, value: String },

    #[error("Invalid integer value '{value}' for attribute '{attribute}'")]
    InvalidInt { attribute: String, value: String },

    #[error("Invalid literal '{value}' for attribute '{attribute}'")]
    InvalidLiteral { attribute: String, value: String },

    #[error("Unknown rule <{0}>")]
    UnknownRule(String),

    #[error("Unknown default style '{0}'")]
    UnknownStyle(String),

    #[error("Unknown attribute (itemData) '{0}'")]
    UnknownAttribute(String),

    #[error("Unknown keyword list '{0}'")]
    UnknownKeywordList(String),

    #[error("Unknown context '{context}' in grammar '{grammar}'")]
    UnknownContext { grammar: String, context: String },

    #[error("Grammar '{0}' declares no contexts")]
    EmptyGrammar(String),

    #[error("Malformed grammar: {0}")]
    Malformed(String),

    #[error("Failed to load referenced grammar '{grammar}': {source}")]
    Reference {
        grammar: String,
        #[source]
        source: Box<SyntaxError>,
    },

    #[error("Theme error: {0}")]
    Theme(#[from] serde_json::Error),
}
