//! Matching rules.
//!
//! ## Learning: Closed enums instead of trait objects
//!
//! Grammars use a fixed vocabulary of about twenty matcher kinds, so rules
//! are one struct holding the shared options plus a `RuleKind` enum for the
//! matcher itself. A single `match` dispatches, and the compiler checks
//! that every kind is handled.

use parking_lot::Mutex;
use regex::{Regex, RegexBuilder};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::cursor::{Delimiters, TextCursor};
use crate::numeric;
use crate::registry::Limits;
use crate::style::Style;
use crate::switcher::{ContextReference, ContextSwitcher, Transition};

/// Result of a successful match. Owned, so it can outlive the borrow of
/// the grammar it came from.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Consumed characters (0 for lookahead rules).
    pub length: usize,
    /// Captured data handed to the next context, if it is dynamic.
    pub data: Option<Arc<[String]>>,
    /// Set by `LineContinue`; suppresses end-of-line transitions.
    pub line_continue: bool,
    /// Context switch to apply; `None` means `#stay`.
    pub transition: Option<Transition>,
    /// The rule's own style. `None` means "use the context's style".
    pub style: Option<Arc<Style>>,
    pub begin_region: Option<Arc<str>>,
    pub end_region: Option<Arc<str>>,
}

/// A regular-expression matcher and its precomputed prefilters.
#[derive(Debug)]
pub struct RegexRule {
    pub(crate) pattern: String,
    pub(crate) insensitive: bool,
    pub(crate) minimal: bool,
    /// `None` for dynamic rules and for patterns that failed to compile.
    pub(crate) regex: Option<Regex>,
    pub(crate) word_start: bool,
    pub(crate) line_start: bool,
    /// Dynamic rules: compiled patterns keyed by the substituted text.
    substituted: Mutex<HashMap<String, Option<Regex>>>,
}

/// Distinct substitutions kept per dynamic rule before the cache restarts.
const DYNAMIC_CACHE_LIMIT: usize = 64;

impl RegexRule {
    pub(crate) fn new(pattern: &str, insensitive: bool, minimal: bool, dynamic: bool) -> Self {
        // Prefilters only look at the literal start of the pattern, after
        // any opening parentheses. `(^a|^b)`-style alternations are not
        // detected; the anchored match still behaves sensibly for them.
        let head = pattern.trim_start_matches('(');
        let regex = if dynamic {
            None
        } else {
            compile_regex(pattern, insensitive, minimal)
        };
        Self {
            pattern: pattern.to_string(),
            insensitive,
            minimal,
            regex,
            word_start: head.starts_with("\\b"),
            line_start: head.starts_with('^'),
            substituted: Mutex::new(HashMap::new()),
        }
    }

    /// Compiles a substituted dynamic pattern, reusing earlier results.
    fn compile_substituted(&self, pattern: String) -> Option<Regex> {
        let mut cache = self.substituted.lock();
        if let Some(regex) = cache.get(&pattern) {
            return regex.clone();
        }
        if cache.len() >= DYNAMIC_CACHE_LIMIT {
            tracing::trace!("Dynamic regex cache for '{}' is full, clearing", self.pattern);
            cache.clear();
        }
        let regex = compile_regex(&pattern, self.insensitive, self.minimal);
        cache.insert(pattern, regex.clone());
        regex
    }
}

/// Compiles `pattern` anchored at the start of the haystack.
fn compile_regex(pattern: &str, insensitive: bool, minimal: bool) -> Option<Regex> {
    match RegexBuilder::new(&format!("^(?:{pattern})"))
        .case_insensitive(insensitive)
        .swap_greed(minimal)
        .build()
    {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!("Regex '{}' does not compile, rule disabled: {}", pattern, e);
            None
        }
    }
}

/// The matcher variants.
#[derive(Debug)]
pub enum RuleKind {
    DetectChar(char),
    Detect2Chars(char, char),
    AnyChar(Vec<char>),
    StringDetect {
        text: String,
        insensitive: bool,
    },
    WordDetect {
        text: String,
        insensitive: bool,
        delimiters: Arc<Delimiters>,
    },
    Keyword {
        list: String,
        words: Arc<HashSet<String>>,
        case_sensitive: bool,
        delimiters: Arc<Delimiters>,
    },
    RegExpr(RegexRule),
    Int {
        suffixes: Vec<Rule>,
    },
    Float {
        suffixes: Vec<Rule>,
    },
    HlCOct,
    HlCHex,
    HlCStringChar,
    HlCChar,
    RangeDetect(char, char),
    LineContinue(char),
    IncludeRules {
        reference: ContextReference,
        include_attrib: bool,
    },
    DetectSpaces,
    DetectIdentifier,
}

/// A rule: a matcher plus the options every matcher shares.
#[derive(Debug)]
pub struct Rule {
    pub(crate) kind: RuleKind,
    pub(crate) style: Option<Arc<Style>>,
    pub(crate) switcher: Option<ContextSwitcher>,
    pub(crate) lookahead: bool,
    pub(crate) first_non_space: bool,
    pub(crate) column: Option<usize>,
    pub(crate) dynamic: bool,
    pub(crate) begin_region: Option<Arc<str>>,
    pub(crate) end_region: Option<Arc<str>>,
}

impl Rule {
    /// A rule with default options around `kind`.
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            style: None,
            switcher: None,
            lookahead: false,
            first_non_space: false,
            column: None,
            dynamic: false,
            begin_region: None,
            end_region: None,
        }
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    pub fn style(&self) -> Option<&Arc<Style>> {
        self.style.as_ref()
    }

    pub fn switcher(&self) -> Option<&ContextSwitcher> {
        self.switcher.as_ref()
    }

    /// Tries to match at the cursor. Never moves the cursor.
    pub fn try_match(&self, cursor: &TextCursor<'_>) -> Option<MatchResult> {
        self.try_match_at_depth(cursor, 0, Limits::default().max_include_depth, &|_| true)
    }

    /// `accept` filters results; included contexts keep trying their later
    /// rules past a rejected one.
    pub(crate) fn try_match_at_depth(
        &self,
        cursor: &TextCursor<'_>,
        depth: usize,
        max_depth: usize,
        accept: &dyn Fn(&MatchResult) -> bool,
    ) -> Option<MatchResult> {
        if self.column.is_some_and(|column| column != cursor.column()) {
            return None;
        }
        if self.first_non_space && !cursor.is_first_non_space() {
            return None;
        }

        if let RuleKind::IncludeRules {
            reference,
            include_attrib,
        } = &self.kind
        {
            return self.match_included(reference, *include_attrib, cursor, depth, max_depth, accept);
        }

        let (length, data) = self.match_kind(cursor)?;
        let result = MatchResult {
            length: if self.lookahead { 0 } else { length },
            data,
            line_continue: matches!(self.kind, RuleKind::LineContinue(_)),
            transition: self.switcher.as_ref().and_then(ContextSwitcher::transition),
            style: self.style.clone(),
            begin_region: self.begin_region.clone(),
            end_region: self.end_region.clone(),
        };
        accept(&result).then_some(result)
    }

    fn match_included(
        &self,
        reference: &ContextReference,
        include_attrib: bool,
        cursor: &TextCursor<'_>,
        depth: usize,
        max_depth: usize,
        accept: &dyn Fn(&MatchResult) -> bool,
    ) -> Option<MatchResult> {
        if depth >= max_depth {
            tracing::warn!(
                "IncludeRules '{}' exceeds include depth {}, skipping",
                reference.target(),
                max_depth
            );
            return None;
        }
        let Some(ptr) = reference.get() else {
            tracing::debug!("IncludeRules '{}' has no live target", reference.target());
            return None;
        };
        let included = ptr.context();
        let mut result = included.try_rules(cursor, depth + 1, max_depth, accept)?;
        if include_attrib && result.style.is_none() {
            result.style = Some(included.style().clone());
        }
        Some(result)
    }

    /// Runs the concrete matcher: consumed length and captured data.
    fn match_kind(&self, cursor: &TextCursor<'_>) -> Option<(usize, Option<Arc<[String]>>)> {
        let rest = cursor.rest();
        let first = *rest.first()?;

        let length = match &self.kind {
            RuleKind::DetectChar(c) => {
                let expected = self.dynamic_char(*c, cursor)?;
                (first == expected).then_some(1)?
            }
            RuleKind::Detect2Chars(c1, c2) => {
                let e1 = self.dynamic_char(*c1, cursor)?;
                let e2 = self.dynamic_char(*c2, cursor)?;
                (first == e1 && rest.get(1) == Some(&e2)).then_some(2)?
            }
            RuleKind::AnyChar(set) => set.contains(&first).then_some(1)?,
            RuleKind::StringDetect { text, insensitive } => {
                let text = self.dynamic_text(text, cursor, false)?;
                prefix_len(rest, &text, *insensitive)?
            }
            RuleKind::WordDetect {
                text,
                insensitive,
                delimiters,
            } => {
                if cursor.prev_char().is_some_and(|c| !delimiters.contains(c)) {
                    return None;
                }
                let text = self.dynamic_text(text, cursor, false)?;
                let len = prefix_len(rest, &text, *insensitive)?;
                if rest.get(len).is_some_and(|&c| !delimiters.contains(c)) {
                    return None;
                }
                len
            }
            RuleKind::Keyword {
                words,
                case_sensitive,
                delimiters,
                ..
            } => {
                let word = cursor.word(delimiters)?;
                let found = if *case_sensitive {
                    words.contains(word)
                } else {
                    words.contains(&word.to_lowercase())
                };
                found.then(|| word.chars().count())?
            }
            RuleKind::RegExpr(rule) => return self.match_regex(rule, cursor),
            RuleKind::Int { suffixes } => {
                if !cursor.is_word_start() {
                    return None;
                }
                let len = numeric::scan_int(rest)?;
                len + suffix_len(suffixes, cursor, len)
            }
            RuleKind::Float { suffixes } => {
                if !cursor.is_word_start() {
                    return None;
                }
                let len = numeric::scan_float(rest)?;
                len + suffix_len(suffixes, cursor, len)
            }
            RuleKind::HlCOct => {
                if !cursor.is_word_start() {
                    return None;
                }
                numeric::scan_c_oct(rest)?
            }
            RuleKind::HlCHex => {
                if !cursor.is_word_start() {
                    return None;
                }
                numeric::scan_c_hex(rest)?
            }
            RuleKind::HlCStringChar => numeric::scan_c_escape(rest)?,
            RuleKind::HlCChar => numeric::scan_c_char(rest)?,
            RuleKind::RangeDetect(open, close) => {
                if first != *open {
                    return None;
                }
                rest[1..].iter().position(|c| c == close).map(|i| i + 2)?
            }
            RuleKind::LineContinue(c) => (rest.len() == 1 && first == *c).then_some(1)?,
            RuleKind::DetectSpaces => {
                match rest.iter().take_while(|c| c.is_whitespace()).count() {
                    0 => return None,
                    n => n,
                }
            }
            RuleKind::DetectIdentifier => {
                if !(first.is_alphabetic() || first == '_') {
                    return None;
                }
                1 + rest[1..]
                    .iter()
                    .take_while(|c| c.is_alphanumeric() || **c == '_')
                    .count()
            }
            RuleKind::IncludeRules { .. } => return None,
        };
        Some((length, None))
    }

    fn match_regex(
        &self,
        rule: &RegexRule,
        cursor: &TextCursor<'_>,
    ) -> Option<(usize, Option<Arc<[String]>>)> {
        if rule.word_start && !cursor.is_word_start() {
            return None;
        }
        if rule.line_start && cursor.column() > 0 {
            return None;
        }

        let dynamic;
        let regex = if self.dynamic {
            let pattern = substitute(&rule.pattern, cursor.data(), true)?;
            dynamic = rule.compile_substituted(pattern)?;
            &dynamic
        } else {
            rule.regex.as_ref()?
        };

        let text = cursor.rest_str();
        if self.switcher.is_none() {
            let found = regex.find(text)?;
            if found.end() == 0 {
                return None;
            }
            return Some((cursor.chars_in_bytes(found.end()), None));
        }

        let captures = regex.captures(text)?;
        let whole = captures.get(0)?;
        if whole.end() == 0 {
            return None;
        }
        let data: Arc<[String]> = captures
            .iter()
            .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
            .collect();
        Some((cursor.chars_in_bytes(whole.end()), Some(data)))
    }

    /// For dynamic rules, a literal digit `N` stands for the first char of
    /// captured entry `N`.
    fn dynamic_char(&self, c: char, cursor: &TextCursor<'_>) -> Option<char> {
        if !self.dynamic {
            return Some(c);
        }
        let Some(index) = c.to_digit(10) else {
            return Some(c);
        };
        let found = cursor
            .data()
            .get(index as usize)
            .and_then(|entry| entry.chars().next());
        if found.is_none() {
            tracing::debug!("Dynamic char index {} not available", index);
        }
        found
    }

    fn dynamic_text<'a>(
        &self,
        text: &'a str,
        cursor: &TextCursor<'_>,
        escape: bool,
    ) -> Option<std::borrow::Cow<'a, str>> {
        if self.dynamic {
            substitute(text, cursor.data(), escape).map(std::borrow::Cow::Owned)
        } else {
            Some(std::borrow::Cow::Borrowed(text))
        }
    }
}

/// Extra length from the first matching suffix rule at `offset`.
/// Suffix rules only extend the number; their styles and switches are dropped.
fn suffix_len(suffixes: &[Rule], cursor: &TextCursor<'_>, offset: usize) -> usize {
    let shifted = cursor.shifted(offset);
    if shifted.is_empty() {
        return 0;
    }
    suffixes
        .iter()
        .find_map(|rule| rule.try_match(&shifted))
        .map_or(0, |result| result.length)
}

/// Length (in chars) of `pattern` if `text` starts with it.
fn prefix_len(text: &[char], pattern: &str, insensitive: bool) -> Option<usize> {
    let mut len = 0;
    for expected in pattern.chars() {
        let actual = *text.get(len)?;
        let equal = if insensitive {
            actual == expected || actual.to_lowercase().eq(expected.to_lowercase())
        } else {
            actual == expected
        };
        if !equal {
            return None;
        }
        len += 1;
    }
    (len > 0).then_some(len)
}

/// Replaces `%N` with captured entry `N`, regex-escaped if `escape`.
///
/// Returns `None` if any referenced entry is missing.
pub(crate) fn substitute(text: &str, data: &[String], escape: bool) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let digits: String = std::iter::from_fn(|| chars.next_if(|(_, d)| d.is_ascii_digit()))
            .map(|(_, d)| d)
            .collect();
        if digits.is_empty() {
            out.push(c);
            continue;
        }
        let index: usize = digits.parse().ok()?;
        let Some(entry) = data.get(index) else {
            tracing::debug!("'{}' references missing capture %{} at {}", text, index, i);
            return None;
        };
        if escape {
            out.push_str(&regex::escape(entry));
        } else {
            out.push_str(entry);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::LineText;

    fn run(rule: &Rule, text: &str) -> Option<usize> {
        let line = LineText::new(text);
        let cursor = TextCursor::new(&line, &[]);
        rule.try_match(&cursor).map(|r| r.length)
    }

    fn keyword(words: &[&str], case_sensitive: bool) -> Rule {
        Rule::new(RuleKind::Keyword {
            list: "test".into(),
            words: Arc::new(words.iter().map(|w| w.to_string()).collect()),
            case_sensitive,
            delimiters: Arc::new(Delimiters::default()),
        })
    }

    #[test]
    fn test_detect_chars() {
        assert_eq!(run(&Rule::new(RuleKind::DetectChar('"')), "\"x"), Some(1));
        assert_eq!(run(&Rule::new(RuleKind::DetectChar('"')), "x\""), None);
        assert_eq!(run(&Rule::new(RuleKind::Detect2Chars('/', '*')), "/* c"), Some(2));
        assert_eq!(run(&Rule::new(RuleKind::Detect2Chars('/', '*')), "/"), None);
        assert_eq!(run(&Rule::new(RuleKind::AnyChar(vec!['+', '-'])), "-1"), Some(1));
    }

    #[test]
    fn test_string_detect_case() {
        let sensitive = Rule::new(RuleKind::StringDetect {
            text: "TODO".into(),
            insensitive: false,
        });
        let insensitive = Rule::new(RuleKind::StringDetect {
            text: "TODO".into(),
            insensitive: true,
        });
        assert_eq!(run(&sensitive, "todo: x"), None);
        assert_eq!(run(&insensitive, "todo: x"), Some(4));
    }

    #[test]
    fn test_word_detect_needs_boundaries() {
        let rule = Rule::new(RuleKind::WordDetect {
            text: "end".into(),
            insensitive: false,
            delimiters: Arc::new(Delimiters::default()),
        });
        assert_eq!(run(&rule, "end;"), Some(3));
        assert_eq!(run(&rule, "end"), Some(3));
        assert_eq!(run(&rule, "ending"), None);
    }

    #[test]
    fn test_keyword_case_folding() {
        let rule = keyword(&["if", "else"], false);
        assert_eq!(run(&rule, "IF (x)"), Some(2));
        assert_eq!(run(&rule, "iffy"), None);

        let strict = keyword(&["if"], true);
        assert_eq!(run(&strict, "IF"), None);
    }

    #[test]
    fn test_keyword_requires_word_boundary_before() {
        let rule = keyword(&["if"], true);
        let line = LineText::new("xif");
        let cursor = TextCursor::new(&line, &[]).shifted(1);
        assert!(rule.try_match(&cursor).is_none());
    }

    #[test]
    fn test_regex_anchored_not_searching() {
        let rule = Rule::new(RuleKind::RegExpr(RegexRule::new("[0-9]+", false, false, false)));
        assert_eq!(run(&rule, "123abc"), Some(3));
        assert_eq!(run(&rule, "abc123"), None);
    }

    #[test]
    fn test_regex_minimal() {
        let greedy = Rule::new(RuleKind::RegExpr(RegexRule::new("<.*>", false, false, false)));
        let minimal = Rule::new(RuleKind::RegExpr(RegexRule::new("<.*>", false, true, false)));
        assert_eq!(run(&greedy, "<a><b>"), Some(6));
        assert_eq!(run(&minimal, "<a><b>"), Some(3));
    }

    #[test]
    fn test_regex_zero_length_is_no_match() {
        let rule = Rule::new(RuleKind::RegExpr(RegexRule::new("a*", false, false, false)));
        assert_eq!(run(&rule, "bbb"), None);
    }

    #[test]
    fn test_regex_line_start_prefilter() {
        let rule = Rule::new(RuleKind::RegExpr(RegexRule::new("^#", false, false, false)));
        let line = LineText::new("a#");
        let cursor = TextCursor::new(&line, &[]).shifted(1);
        assert!(rule.try_match(&cursor).is_none());
        assert_eq!(run(&rule, "#x"), Some(1));
    }

    #[test]
    fn test_invalid_regex_never_matches() {
        let rule = Rule::new(RuleKind::RegExpr(RegexRule::new("(unclosed", false, false, false)));
        assert_eq!(run(&rule, "(unclosed"), None);
    }

    #[test]
    fn test_float_with_suffix() {
        let suffix = Rule::new(RuleKind::AnyChar(vec!['f', 'F', 'l', 'L']));
        let rule = Rule::new(RuleKind::Float {
            suffixes: vec![suffix],
        });
        assert_eq!(run(&rule, "3.14e-2f"), Some(8));
        assert_eq!(run(&rule, "3.14e-2"), Some(7));
    }

    #[test]
    fn test_int_needs_word_start() {
        let rule = Rule::new(RuleKind::Int { suffixes: vec![] });
        let line = LineText::new("x12");
        let cursor = TextCursor::new(&line, &[]).shifted(1);
        assert!(rule.try_match(&cursor).is_none());
        assert_eq!(run(&rule, "12)"), Some(2));
    }

    #[test]
    fn test_range_detect() {
        let rule = Rule::new(RuleKind::RangeDetect('<', '>'));
        assert_eq!(run(&rule, "<stdio.h> x"), Some(9));
        assert_eq!(run(&rule, "<stdio.h"), None);
    }

    #[test]
    fn test_line_continue_only_at_end() {
        let rule = Rule::new(RuleKind::LineContinue('\\'));
        let line = LineText::new("a \\");
        let cursor = TextCursor::new(&line, &[]).shifted(2);
        let result = rule.try_match(&cursor).unwrap();
        assert!(result.line_continue);
        assert_eq!(run(&rule, "\\ x"), None);
    }

    #[test]
    fn test_spaces_and_identifiers() {
        assert_eq!(run(&Rule::new(RuleKind::DetectSpaces), " \t x"), Some(3));
        assert_eq!(run(&Rule::new(RuleKind::DetectSpaces), "x"), None);
        assert_eq!(run(&Rule::new(RuleKind::DetectIdentifier), "_foo1+"), Some(5));
        assert_eq!(run(&Rule::new(RuleKind::DetectIdentifier), "1foo"), None);
    }

    #[test]
    fn test_lookahead_reports_zero_length() {
        let mut rule = Rule::new(RuleKind::DetectChar('x'));
        rule.lookahead = true;
        assert_eq!(run(&rule, "x"), Some(0));
    }

    #[test]
    fn test_column_and_first_non_space() {
        let mut at_col = Rule::new(RuleKind::DetectChar('#'));
        at_col.column = Some(0);
        let line = LineText::new(" #");
        let cursor = TextCursor::new(&line, &[]).shifted(1);
        assert!(at_col.try_match(&cursor).is_none());

        let mut first = Rule::new(RuleKind::DetectChar('#'));
        first.first_non_space = true;
        assert!(first.try_match(&cursor).is_some());

        let line = LineText::new("x #");
        let cursor = TextCursor::new(&line, &[]).shifted(2);
        assert!(first.try_match(&cursor).is_none());
    }

    #[test]
    fn test_dynamic_substitution_is_escaped() {
        let data = vec!["a.c".to_string()];
        let mut rule = Rule::new(RuleKind::RegExpr(RegexRule::new("%0", false, false, true)));
        rule.dynamic = true;

        let line = LineText::new("abc");
        let cursor = TextCursor::new(&line, &data);
        assert!(rule.try_match(&cursor).is_none());

        let line = LineText::new("a.c");
        let cursor = TextCursor::new(&line, &data);
        assert_eq!(rule.try_match(&cursor).map(|r| r.length), Some(3));
    }

    #[test]
    fn test_dynamic_regex_compiled_once_per_data() {
        let mut rule = Rule::new(RuleKind::RegExpr(RegexRule::new("%1$", false, false, true)));
        rule.dynamic = true;
        let RuleKind::RegExpr(regex) = &rule.kind else {
            unreachable!()
        };

        let eof = vec!["<<EOF".to_string(), "EOF".to_string()];
        let line = LineText::new("EOF");
        for _ in 0..3 {
            let cursor = TextCursor::new(&line, &eof);
            assert_eq!(rule.try_match(&cursor).map(|r| r.length), Some(3));
        }
        assert_eq!(regex.substituted.lock().len(), 1);

        let end = vec!["<<END".to_string(), "END".to_string()];
        let cursor = TextCursor::new(&line, &end);
        assert!(rule.try_match(&cursor).is_none());
        assert_eq!(regex.substituted.lock().len(), 2);
    }

    #[test]
    fn test_dynamic_char_index() {
        let data = vec!["<<EOF".to_string(), "EOF".to_string()];
        let mut rule = Rule::new(RuleKind::DetectChar('1'));
        rule.dynamic = true;

        let line = LineText::new("E");
        let cursor = TextCursor::new(&line, &data);
        assert!(rule.try_match(&cursor).is_some());

        let mut out_of_range = Rule::new(RuleKind::DetectChar('4'));
        out_of_range.dynamic = true;
        assert!(out_of_range.try_match(&cursor).is_none());
    }

    #[test]
    fn test_substitute() {
        let data = vec!["foo".to_string(), "a+b".to_string()];
        assert_eq!(substitute("x%0y", &data, false).as_deref(), Some("xfooy"));
        assert_eq!(substitute("%1", &data, true).as_deref(), Some("a\\+b"));
        assert_eq!(substitute("100%", &data, false).as_deref(), Some("100%"));
        assert_eq!(substitute("%7", &data, false), None);
    }
}
