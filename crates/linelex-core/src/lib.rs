//! # Linelex Core
//!
//! Host-side integration of the highlighting engine.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐   registry()   ┌───────────────────────────┐
//! │    Config    │ ─────────────▶ │ Registry (linelex-syntax) │
//! └──────────────┘                └─────────────┬─────────────┘
//!                                               │ Arc<Language>
//!                                               ▼
//!                  ┌─────────────────────────────────────────────┐
//!                  │ Document                                     │
//!                  │  rope text + one LineState per line          │
//!                  │  edit ─▶ re-highlight until states settle    │
//!                  └─────────────────────────────────────────────┘
//! ```
//!
//! ## Learning: Keeping the engine stateless
//!
//! `Language::highlight_line` is a pure function of its inputs. All the
//! remembering (which lines are stale, where a cascade may stop) lives in
//! `Document`, which owns the per-line states.

pub mod config;
pub mod document;

pub use config::{Config, ConfigError, SyntaxConfig, ThemeConfig};
pub use document::Document;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Syntax error: {0}")]
    Syntax(#[from] linelex_syntax::SyntaxError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Line {line} out of range (document has {len} lines)")]
    LineOutOfRange { line: usize, len: usize },

    #[error("Invalid range: {0}")]
    InvalidRange(String),
}
