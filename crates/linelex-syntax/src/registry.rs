//! Grammar sources, the process-wide grammar cache and language selection.
//!
//! ## Learning: One lock around a recursive load
//!
//! Loading a grammar can load others (`##Doxygen` inside a C comment), and
//! those can point back at the first. The registry takes its lock once per
//! top-level request and threads `&mut RegistryState` through the
//! recursion, so the lock is never re-entered. A language is inserted into
//! the cache *before* its references are linked; a cycle then finds it
//! there instead of starting another load.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::language::{Language, LanguageHeader};
use crate::loader;
use crate::{SyntaxError, SyntaxResult};

/// Environment variable holding extra grammar directories.
pub const SYNTAX_PATH_ENV: &str = "LINELEX_SYNTAX_PATH";

/// Bounds that keep pathological grammars from hanging a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum nesting of `IncludeRules`.
    pub max_include_depth: usize,
    /// Context switches allowed at one column before a char is forced.
    pub max_zero_progress_steps: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_include_depth: 16,
            max_zero_progress_steps: 64,
        }
    }
}

/// Where grammar documents come from.
pub trait GrammarSource: Send + Sync {
    /// Ids of every grammar this source can read.
    fn ids(&self) -> Vec<String>;

    /// Reads the grammar document for `id`.
    fn read(&self, id: &str) -> SyntaxResult<String>;
}

/// Reads `<id>.xml` files from a list of directories. Earlier directories
/// shadow later ones.
#[derive(Debug, Clone, Default)]
pub struct DirectorySource {
    dirs: Vec<PathBuf>,
}

impl DirectorySource {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Directories from `LINELEX_SYNTAX_PATH`, then the user data dir.
    pub fn from_env() -> Self {
        let mut dirs: Vec<PathBuf> = std::env::var_os(SYNTAX_PATH_ENV)
            .map(|paths| std::env::split_paths(&paths).collect())
            .unwrap_or_default();
        if let Some(data) = dirs::data_dir() {
            dirs.push(data.join("linelex").join("syntax"));
        }
        Self { dirs }
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dirs.push(dir.into());
        self
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    fn path_of(&self, id: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(format!("{id}.xml")))
            .find(|path| path.is_file())
    }
}

impl GrammarSource for DirectorySource {
    fn ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for dir in &self.dirs {
            let Ok(entries) = std::fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "xml") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        if !ids.iter().any(|id| id == stem) {
                            ids.push(stem.to_string());
                        }
                    }
                }
            }
        }
        ids.sort();
        ids
    }

    fn read(&self, id: &str) -> SyntaxResult<String> {
        let path = self
            .path_of(id)
            .ok_or_else(|| SyntaxError::UnknownGrammar(id.to_string()))?;
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Grammars held in memory, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    grammars: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: &str, xml: &str) -> Self {
        self.insert(id, xml);
        self
    }

    pub fn insert(&mut self, id: &str, xml: &str) {
        self.grammars.insert(id.to_string(), xml.to_string());
    }
}

impl GrammarSource for MemorySource {
    fn ids(&self) -> Vec<String> {
        self.grammars.keys().cloned().collect()
    }

    fn read(&self, id: &str) -> SyntaxResult<String> {
        self.grammars
            .get(id)
            .cloned()
            .ok_or_else(|| SyntaxError::UnknownGrammar(id.to_string()))
    }
}

/// User overrides for one grammar's header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageOverride {
    /// Replaces the grammar's filename globs.
    pub extensions: Option<Vec<String>>,
    /// Replaces the grammar's priority.
    pub priority: Option<i32>,
}

impl LanguageOverride {
    fn apply(&self, header: &mut LanguageHeader) {
        if let Some(extensions) = &self.extensions {
            header.extensions = extensions.clone();
        }
        if let Some(priority) = self.priority {
            header.priority = priority;
        }
    }
}

/// What is known about a file when picking its grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageQuery<'a> {
    pub mime_type: Option<&'a str>,
    pub language_name: Option<&'a str>,
    pub file_path: Option<&'a Path>,
    pub first_line: Option<&'a str>,
}

#[derive(Debug)]
struct CatalogEntry {
    header: LanguageHeader,
    extensions: GlobSet,
    first_lines: GlobSet,
}

fn glob_set(patterns: &[String], grammar: &str) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match GlobBuilder::new(pattern).case_insensitive(true).build() {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!("Ignoring glob '{}' of '{}': {}", pattern, grammar, e),
        }
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!("Cannot build globs of '{}': {}", grammar, e);
        GlobSet::empty()
    })
}

/// Headers of every grammar a source provides, without building contexts.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    fn build(source: &dyn GrammarSource, overrides: &HashMap<String, LanguageOverride>) -> Self {
        let mut entries = Vec::new();
        for id in source.ids() {
            let header = source.read(&id).and_then(|xml| loader::parse_header(&id, &xml));
            let mut header = match header {
                Ok(header) => header,
                Err(e) => {
                    tracing::warn!("Skipping grammar '{}': {}", id, e);
                    continue;
                }
            };
            if let Some(o) = overrides.get(&id) {
                o.apply(&mut header);
            }
            entries.push(CatalogEntry {
                extensions: glob_set(&header.extensions, &header.name),
                first_lines: glob_set(&header.first_line_globs, &header.name),
                header,
            });
        }
        tracing::debug!("Catalog holds {} grammars", entries.len());
        Self { entries }
    }

    pub fn headers(&self) -> impl Iterator<Item = &LanguageHeader> {
        self.entries.iter().map(|entry| &entry.header)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&LanguageHeader> {
        self.headers().find(|header| header.id == id)
    }

    /// Looks up a grammar by its display name, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<&LanguageHeader> {
        self.headers()
            .find(|header| header.name.eq_ignore_ascii_case(name))
    }

    /// Resolves a grammar reference: an id first, then a display name.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.get(name)
            .or_else(|| self.find_by_name(name))
            .map(|header| header.id.as_str())
    }

    /// Picks a grammar: explicit name, then filename glob, then mimetype,
    /// then first-line glob. Ties go to the highest priority.
    pub fn choose(&self, query: &LanguageQuery<'_>) -> Option<&str> {
        if let Some(name) = query.language_name {
            if let Some(id) = self.resolve(name) {
                return Some(id);
            }
            tracing::debug!("No grammar named '{}'", name);
        }

        let visible = || self.entries.iter().filter(|entry| !entry.header.hidden);

        if let Some(file_name) = query.file_path.and_then(Path::file_name) {
            let found = best(visible().filter(|entry| entry.extensions.is_match(file_name)));
            if found.is_some() {
                return found;
            }
        }

        if let Some(mime) = query.mime_type {
            let found = best(visible().filter(|entry| {
                entry
                    .header
                    .mimetypes
                    .iter()
                    .any(|m| m.eq_ignore_ascii_case(mime))
            }));
            if found.is_some() {
                return found;
            }
        }

        if let Some(line) = query.first_line {
            return best(visible().filter(|entry| entry.first_lines.is_match(line)));
        }
        None
    }
}

/// Highest priority wins; among equals the first in catalog order.
fn best<'a>(entries: impl Iterator<Item = &'a CatalogEntry>) -> Option<&'a str> {
    let mut winner: Option<&CatalogEntry> = None;
    for entry in entries {
        if winner.is_none_or(|w| entry.header.priority > w.header.priority) {
            winner = Some(entry);
        }
    }
    winner.map(|entry| entry.header.id.as_str())
}

#[derive(Default)]
struct RegistryState {
    loaded: HashMap<String, Arc<Language>>,
    catalog: Option<Arc<Catalog>>,
}

/// The grammar cache.
///
/// Loaded languages are shared, immutable and kept for the registry's
/// lifetime. Tests build their own registry over a [`MemorySource`]; the
/// editor uses [`global`].
pub struct Registry {
    source: Box<dyn GrammarSource>,
    limits: Limits,
    overrides: HashMap<String, LanguageOverride>,
    state: Mutex<RegistryState>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("limits", &self.limits)
            .field("loaded", &self.state.lock().loaded.len())
            .finish()
    }
}

impl Registry {
    pub fn new(source: impl GrammarSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            limits: Limits::default(),
            overrides: HashMap::new(),
            state: Mutex::new(RegistryState::default()),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_overrides(mut self, overrides: HashMap<String, LanguageOverride>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Headers of every available grammar. Built once, on first use.
    pub fn catalog(&self) -> Arc<Catalog> {
        let mut state = self.state.lock();
        self.catalog_locked(&mut state)
    }

    fn catalog_locked(&self, state: &mut RegistryState) -> Arc<Catalog> {
        state
            .catalog
            .get_or_insert_with(|| Arc::new(Catalog::build(self.source.as_ref(), &self.overrides)))
            .clone()
    }

    /// Grammar id for a file, see [`Catalog::choose`].
    pub fn choose_language(&self, query: &LanguageQuery<'_>) -> Option<String> {
        self.catalog().choose(query).map(str::to_string)
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.state.lock().loaded.contains_key(id)
    }

    /// Drops every cached language and the catalog.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.loaded.clear();
        state.catalog = None;
    }

    /// Loads (or returns the cached) language `id`, together with every
    /// grammar it references.
    ///
    /// On failure nothing loaded during this call stays cached.
    pub fn load_language(&self, id: &str) -> SyntaxResult<Arc<Language>> {
        let mut state = self.state.lock();
        let mut inserted = Vec::new();
        let result = self.load_locked(&mut state, id, &mut inserted);
        if let Err(e) = &result {
            tracing::warn!("Failed to load grammar '{}': {}", id, e);
            for id in inserted {
                state.loaded.remove(&id);
            }
        }
        result
    }

    /// Loads by id or, failing that, by display name.
    pub fn load_by_name(&self, name: &str) -> SyntaxResult<Arc<Language>> {
        let id = self
            .catalog()
            .resolve(name)
            .map(str::to_string)
            .ok_or_else(|| SyntaxError::UnknownGrammar(name.to_string()))?;
        self.load_language(&id)
    }

    fn load_locked(
        &self,
        state: &mut RegistryState,
        id: &str,
        inserted: &mut Vec<String>,
    ) -> SyntaxResult<Arc<Language>> {
        if let Some(language) = state.loaded.get(id) {
            tracing::debug!("Grammar cache hit: {}", id);
            return Ok(language.clone());
        }

        let xml = self.source.read(id)?;
        let mut language = loader::build_language(id, &xml, self.limits)?;
        if let Some(o) = self.overrides.get(id) {
            o.apply(&mut language.header);
        }
        let language = Arc::new(language);

        state.loaded.insert(id.to_string(), language.clone());
        inserted.push(id.to_string());

        loader::link_language(&language, &mut |grammar: &str| {
            self.load_reference(state, grammar, inserted)
                .map_err(|source| SyntaxError::Reference {
                    grammar: grammar.to_string(),
                    source: Box::new(source),
                })
        })?;

        tracing::info!(
            "Loaded grammar '{}' ({} contexts)",
            language.name(),
            language.contexts().len()
        );
        Ok(language)
    }

    /// Loads the grammar a `##Name` reference points at.
    fn load_reference(
        &self,
        state: &mut RegistryState,
        grammar: &str,
        inserted: &mut Vec<String>,
    ) -> SyntaxResult<Arc<Language>> {
        let id = if state.loaded.contains_key(grammar) {
            grammar.to_string()
        } else {
            self.catalog_locked(state)
                .resolve(grammar)
                .map(str::to_string)
                .ok_or_else(|| SyntaxError::UnknownGrammar(grammar.to_string()))?
        };
        self.load_locked(state, &id, inserted)
    }
}

static GLOBAL: OnceCell<Registry> = OnceCell::new();

/// The process-wide registry. Defaults to [`DirectorySource::from_env`]
/// unless [`install_global`] ran first.
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(|| Registry::new(DirectorySource::from_env()))
}

/// Installs the process-wide registry. Fails (handing the registry back)
/// if one is already in place.
pub fn install_global(registry: Registry) -> Result<(), Registry> {
    GLOBAL.set(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar(name: &str, extra: &str, target: &str) -> String {
        format!(
            r##"<language name="{name}" {extra}>
  <highlighting>
    <contexts>
      <context name="Normal" attribute="Normal"><DetectChar char="x" context="{target}"/></context>
      <context name="Other" attribute="Normal"/>
    </contexts>
    <itemDatas><itemData name="Normal" defStyleNum="dsNormal"/></itemDatas>
  </highlighting>
</language>"##
        )
    }

    fn source() -> MemorySource {
        MemorySource::new()
            .with("c", &grammar("C", r##"extensions="*.c;*.h" mimetype="text/x-csrc" priority="5""##, "Other"))
            .with("cpp", &grammar("C++", r##"extensions="*.cpp;*.h" priority="9""##, "Other"))
            .with("sh", &grammar("Bash", r##"extensions="*.sh" firstLineGlobs="#!*sh*""##, "Other"))
            .with("hidden", &grammar("Hidden", r##"extensions="*.c" priority="99" hidden="true""##, "Other"))
    }

    #[test]
    fn test_load_is_cached() {
        let registry = Registry::new(source());
        let first = registry.load_language("c").unwrap();
        let second = registry.load_language("c").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.is_loaded("c"));

        registry.clear();
        assert!(!registry.is_loaded("c"));
        let third = registry.load_language("c").unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_unknown_grammar() {
        let registry = Registry::new(source());
        assert!(matches!(
            registry.load_language("cobol"),
            Err(SyntaxError::UnknownGrammar(_))
        ));
    }

    #[test]
    fn test_failed_reference_evicts_everything() {
        let source = MemorySource::new()
            .with("a", &grammar("A", "", "##B"))
            .with("b", &grammar("B", "", "Missing##A"));
        let registry = Registry::new(source);

        let result = registry.load_language("a");
        assert!(matches!(result, Err(SyntaxError::Reference { .. })));
        assert!(!registry.is_loaded("a"));
        assert!(!registry.is_loaded("b"));
    }

    #[test]
    fn test_choose_by_name_then_extension() {
        let registry = Registry::new(source());
        let query = LanguageQuery {
            language_name: Some("c++"),
            file_path: Some(Path::new("main.c")),
            ..Default::default()
        };
        assert_eq!(registry.choose_language(&query).as_deref(), Some("cpp"));

        let query = LanguageQuery {
            file_path: Some(Path::new("/src/MAIN.C")),
            ..Default::default()
        };
        assert_eq!(registry.choose_language(&query).as_deref(), Some("c"));
    }

    #[test]
    fn test_choose_priority_tie_break() {
        let registry = Registry::new(source());
        let query = LanguageQuery {
            file_path: Some(Path::new("util.h")),
            ..Default::default()
        };
        assert_eq!(registry.choose_language(&query).as_deref(), Some("cpp"));
    }

    #[test]
    fn test_choose_mime_and_first_line() {
        let registry = Registry::new(source());
        let query = LanguageQuery {
            mime_type: Some("TEXT/X-CSRC"),
            file_path: Some(Path::new("README")),
            ..Default::default()
        };
        assert_eq!(registry.choose_language(&query).as_deref(), Some("c"));

        let query = LanguageQuery {
            file_path: Some(Path::new("configure")),
            first_line: Some("#!/bin/sh"),
            ..Default::default()
        };
        assert_eq!(registry.choose_language(&query).as_deref(), Some("sh"));

        let query = LanguageQuery {
            first_line: Some("hello"),
            ..Default::default()
        };
        assert_eq!(registry.choose_language(&query), None);
    }

    #[test]
    fn test_overrides_change_choice() {
        let overrides = HashMap::from([(
            "c".to_string(),
            LanguageOverride {
                extensions: Some(vec!["*.inc".to_string()]),
                priority: Some(100),
            },
        )]);
        let registry = Registry::new(source()).with_overrides(overrides);
        let query = LanguageQuery {
            file_path: Some(Path::new("defs.inc")),
            ..Default::default()
        };
        assert_eq!(registry.choose_language(&query).as_deref(), Some("c"));
        assert_eq!(registry.load_language("c").unwrap().header().priority, 100);
    }

    #[test]
    fn test_directory_source_shadowing() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(first.path().join("c.xml"), grammar("First C", "", "Other")).unwrap();
        std::fs::write(second.path().join("c.xml"), grammar("Second C", "", "Other")).unwrap();
        std::fs::write(second.path().join("sh.xml"), grammar("Bash", "", "Other")).unwrap();
        std::fs::write(second.path().join("notes.txt"), "ignored").unwrap();

        let source = DirectorySource::new(vec![first.path().to_path_buf()]).with_dir(second.path());
        assert_eq!(source.ids(), vec!["c", "sh"]);

        let registry = Registry::new(source);
        assert_eq!(registry.load_language("c").unwrap().name(), "First C");
        assert_eq!(registry.catalog().len(), 2);
    }

    #[test]
    fn test_catalog_skips_broken_grammars() {
        let source = source().with("broken", "<language");
        let registry = Registry::new(source);
        let catalog = registry.catalog();
        assert_eq!(catalog.len(), 4);
        assert!(catalog.get("broken").is_none());
        assert_eq!(catalog.find_by_name("bash").map(|h| h.id.as_str()), Some("sh"));
    }
}
