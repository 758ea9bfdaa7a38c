//! Grammar loading: XML to [`Language`], then reference linking.
//!
//! Loading is two passes. [`build_language`] turns one document into a
//! `Language` whose context switches are still unresolved names. Once the
//! language sits behind an `Arc` (and in the registry cache),
//! [`link_language`] resolves every name to an arena index, loading other
//! grammars through a callback when a reference crosses files.
//!
//! ## Learning: Strict loading, lenient matching
//!
//! Anything wrong with the grammar document itself (missing attributes,
//! bad booleans, unknown styles or contexts) is a load error, and no
//! half-built language escapes. Problems that can only show up while
//! matching (a regex that does not compile, a bad `%N` index) are logged
//! and the rule simply never matches.

use roxmltree::{Document, Node, ParsingOptions};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::context::Context;
use crate::cursor::Delimiters;
use crate::language::{Language, LanguageHeader, LinkedLanguages};
use crate::registry::Limits;
use crate::rules::{RegexRule, Rule, RuleKind};
use crate::style::{DefaultStyle, Style, StyleOverrides};
use crate::switcher::{ContextRef, ContextReference, ContextSwitcher, ContextTarget};
use crate::theme::Color;
use crate::{SyntaxError, SyntaxResult};

fn parse_document(xml: &str) -> SyntaxResult<Document<'_>> {
    // Kate grammars start with a DOCTYPE that declares entities.
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    Ok(Document::parse_with_options(xml, options)?)
}

fn language_element<'a, 'input>(doc: &'a Document<'input>) -> SyntaxResult<Node<'a, 'input>> {
    let root = doc.root_element();
    if root.has_tag_name("language") {
        Ok(root)
    } else {
        Err(SyntaxError::Malformed(format!(
            "root element is <{}>, expected <language>",
            root.tag_name().name()
        )))
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

fn required<'a>(node: Node<'a, '_>, attribute: &str) -> SyntaxResult<&'a str> {
    node.attribute(attribute)
        .ok_or_else(|| SyntaxError::MissingAttribute {
            element: node.tag_name().name().to_string(),
            attribute: attribute.to_string(),
        })
}

fn parse_bool_value(attribute: &str, value: &str) -> SyntaxResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(SyntaxError::InvalidBool {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }),
    }
}

fn bool_attr(node: Node<'_, '_>, attribute: &str) -> SyntaxResult<Option<bool>> {
    node.attribute(attribute)
        .map(|value| parse_bool_value(attribute, value))
        .transpose()
}

fn int_attr<T: std::str::FromStr>(node: Node<'_, '_>, attribute: &str) -> SyntaxResult<Option<T>> {
    node.attribute(attribute)
        .map(|value| {
            value.trim().parse().map_err(|_| SyntaxError::InvalidInt {
                attribute: attribute.to_string(),
                value: value.to_string(),
            })
        })
        .transpose()
}

/// Unescapes `\a \b \f \n \r \t \\`. Other backslashes are kept.
pub(crate) fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('a') => out.push('\u{7}'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn char_attr(node: Node<'_, '_>, attribute: &str) -> SyntaxResult<char> {
    let raw = required(node, attribute)?;
    let value = unescape(raw);
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(SyntaxError::InvalidLiteral {
            attribute: attribute.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or("")
        .split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_header_node(id: &str, root: Node<'_, '_>) -> SyntaxResult<LanguageHeader> {
    Ok(LanguageHeader {
        id: id.to_string(),
        name: required(root, "name")?.to_string(),
        section: root.attribute("section").unwrap_or("Other").to_string(),
        extensions: split_list(root.attribute("extensions")),
        mimetypes: split_list(root.attribute("mimetype")),
        first_line_globs: split_list(root.attribute("firstLineGlobs")),
        priority: int_attr(root, "priority")?.unwrap_or(0),
        hidden: bool_attr(root, "hidden")?.unwrap_or(false),
        indenter: root
            .attribute("indenter")
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    })
}

/// Parses only the `<language>` element.
pub(crate) fn parse_header(id: &str, xml: &str) -> SyntaxResult<LanguageHeader> {
    let doc = parse_document(xml)?;
    parse_header_node(id, language_element(&doc)?)
}

/// Grammar-wide settings collected before contexts are built.
struct Builder {
    case_sensitive: bool,
    delimiters: Arc<Delimiters>,
    lists: HashMap<String, Arc<HashSet<String>>>,
    styles: HashMap<String, Arc<Style>>,
}

/// Builds a language from one grammar document. Context references are
/// left unresolved; see [`link_language`].
pub(crate) fn build_language(id: &str, xml: &str, limits: Limits) -> SyntaxResult<Language> {
    let doc = parse_document(xml)?;
    let root = language_element(&doc)?;
    let header = parse_header_node(id, root)?;

    let highlighting = child(root, "highlighting")
        .ok_or_else(|| SyntaxError::Malformed("missing <highlighting>".to_string()))?;
    let general = child(root, "general");

    let keywords_node = general.and_then(|g| child(g, "keywords"));
    let case_sensitive = match keywords_node {
        Some(node) => bool_attr(node, "casesensitive")?.unwrap_or(true),
        None => true,
    };
    let delimiters = Arc::new(Delimiters::new(
        keywords_node
            .and_then(|n| n.attribute("weakDeliminator"))
            .unwrap_or(""),
        keywords_node
            .and_then(|n| n.attribute("additionalDeliminator"))
            .unwrap_or(""),
    ));

    let mut all_keywords = HashSet::new();
    let mut lists = HashMap::new();
    for list in highlighting.children().filter(|n| n.has_tag_name("list")) {
        let name = required(list, "name")?;
        let words: HashSet<String> = list
            .children()
            .filter(|n| n.has_tag_name("item"))
            .filter_map(|n| n.text())
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        all_keywords.extend(
            words
                .iter()
                .map(|w| if case_sensitive { w.clone() } else { w.to_lowercase() }),
        );
        lists.insert(name.to_string(), Arc::new(words));
    }

    let styles = parse_item_datas(highlighting)?;

    let builder = Builder {
        case_sensitive,
        delimiters: delimiters.clone(),
        lists,
        styles,
    };

    let contexts_node = child(highlighting, "contexts")
        .ok_or_else(|| SyntaxError::Malformed("missing <contexts>".to_string()))?;
    let mut contexts = Vec::new();
    let mut context_index = HashMap::new();
    for node in contexts_node.children().filter(|n| n.has_tag_name("context")) {
        let context = builder.build_context(node)?;
        if context_index
            .insert(context.name.clone(), contexts.len())
            .is_some()
        {
            return Err(SyntaxError::Malformed(format!(
                "context '{}' is declared twice",
                context.name
            )));
        }
        contexts.push(context);
    }
    if contexts.is_empty() {
        return Err(SyntaxError::EmptyGrammar(header.name));
    }

    let mut single_line_comment = None;
    let mut multi_line_comment = None;
    if let Some(comments) = general.and_then(|g| child(g, "comments")) {
        for comment in comments.children().filter(|n| n.has_tag_name("comment")) {
            match required(comment, "name")? {
                "singleLine" => {
                    single_line_comment = Some(required(comment, "start")?.to_string());
                }
                "multiLine" => {
                    multi_line_comment = Some((
                        required(comment, "start")?.to_string(),
                        required(comment, "end")?.to_string(),
                    ));
                }
                other => tracing::debug!("Ignoring comment kind '{}'", other),
            }
        }
    }

    let indentation_based_folding = match general.and_then(|g| child(g, "folding")) {
        Some(node) => bool_attr(node, "indentationsensitive")?.unwrap_or(false),
        None => false,
    };

    Ok(Language {
        header,
        single_line_comment,
        multi_line_comment,
        keywords: all_keywords,
        case_sensitive,
        delimiters,
        indentation_based_folding,
        styles: builder.styles,
        contexts,
        context_index,
        limits,
        linked: LinkedLanguages::default(),
    })
}

fn parse_item_datas(highlighting: Node<'_, '_>) -> SyntaxResult<HashMap<String, Arc<Style>>> {
    let mut styles = HashMap::new();
    let Some(item_datas) = child(highlighting, "itemDatas") else {
        return Ok(styles);
    };
    for item in item_datas.children().filter(|n| n.has_tag_name("itemData")) {
        let name = required(item, "name")?;
        let ds_name = required(item, "defStyleNum")?;
        let default_style = DefaultStyle::from_name(ds_name)
            .ok_or_else(|| SyntaxError::UnknownStyle(ds_name.to_string()))?;

        let color = |attribute: &str| -> Option<Color> {
            let value = item.attribute(attribute)?;
            let color = Color::from_hex(value);
            if color.is_none() {
                tracing::warn!("Ignoring bad color '{}' on itemData '{}'", value, name);
            }
            color
        };
        let overrides = StyleOverrides {
            color: color("color"),
            selection_color: color("selColor"),
            background: color("backgroundColor"),
            bold: bool_attr(item, "bold")?,
            italic: bool_attr(item, "italic")?,
            underline: bool_attr(item, "underline")?,
            strikeout: bool_attr(item, "strikeOut")?,
        };
        let spell_checking = bool_attr(item, "spellChecking")?.unwrap_or(true);
        styles.insert(
            name.to_lowercase(),
            Arc::new(Style::from_item(name, default_style, overrides, spell_checking)),
        );
    }
    Ok(styles)
}

impl Builder {
    fn style(&self, name: &str) -> SyntaxResult<Arc<Style>> {
        if let Some(style) = self.styles.get(&name.to_lowercase()) {
            return Ok(style.clone());
        }
        // Some grammars use a default style name directly as attribute.
        DefaultStyle::from_name(name)
            .map(|ds| Arc::new(Style::builtin(ds)))
            .ok_or_else(|| SyntaxError::UnknownAttribute(name.to_string()))
    }

    fn switcher(node: Node<'_, '_>, attribute: &str) -> SyntaxResult<Option<ContextSwitcher>> {
        match node.attribute(attribute) {
            Some(operation) => ContextSwitcher::parse(operation),
            None => Ok(None),
        }
    }

    fn build_context(&self, node: Node<'_, '_>) -> SyntaxResult<Context> {
        let name = required(node, "name")?.to_string();
        let attribute = node.attribute("attribute").unwrap_or("");
        let style = if attribute.is_empty() {
            Arc::new(Style::builtin(DefaultStyle::Normal))
        } else {
            self.style(attribute)?
        };

        let fallthrough = if bool_attr(node, "fallthrough")? == Some(false) {
            None
        } else {
            Self::switcher(node, "fallthroughContext")?
        };

        let rules = node
            .children()
            .filter(Node::is_element)
            .map(|rule| self.build_rule(rule))
            .collect::<SyntaxResult<Vec<_>>>()?;

        Ok(Context {
            name,
            attribute: attribute.to_string(),
            style,
            line_end: Self::switcher(node, "lineEndContext")?,
            line_begin: Self::switcher(node, "lineBeginContext")?,
            line_empty: Self::switcher(node, "lineEmptyContext")?,
            fallthrough,
            dynamic: bool_attr(node, "dynamic")?.unwrap_or(false),
            rules,
        })
    }

    fn build_rule(&self, node: Node<'_, '_>) -> SyntaxResult<Rule> {
        let dynamic = bool_attr(node, "dynamic")?.unwrap_or(false);
        let insensitive = bool_attr(node, "insensitive")?.unwrap_or(false);
        let text = |attribute: &str| -> SyntaxResult<String> { Ok(unescape(required(node, attribute)?)) };

        let kind = match node.tag_name().name() {
            "DetectChar" => RuleKind::DetectChar(char_attr(node, "char")?),
            "Detect2Chars" => RuleKind::Detect2Chars(char_attr(node, "char")?, char_attr(node, "char1")?),
            "AnyChar" => RuleKind::AnyChar(text("String")?.chars().collect()),
            "StringDetect" => RuleKind::StringDetect {
                text: text("String")?,
                insensitive,
            },
            "WordDetect" => RuleKind::WordDetect {
                text: text("String")?,
                insensitive,
                delimiters: self.delimiters.clone(),
            },
            "keyword" => {
                let list = required(node, "String")?;
                let words = self
                    .lists
                    .get(list)
                    .ok_or_else(|| SyntaxError::UnknownKeywordList(list.to_string()))?;
                let case_sensitive = match bool_attr(node, "insensitive")? {
                    Some(insensitive) => !insensitive,
                    None => self.case_sensitive,
                };
                let words = if case_sensitive {
                    words.clone()
                } else {
                    Arc::new(words.iter().map(|w| w.to_lowercase()).collect())
                };
                RuleKind::Keyword {
                    list: list.to_string(),
                    words,
                    case_sensitive,
                    delimiters: self.delimiters.clone(),
                }
            }
            "RegExpr" => {
                let pattern = required(node, "String")?;
                let minimal = bool_attr(node, "minimal")?.unwrap_or(false);
                RuleKind::RegExpr(RegexRule::new(pattern, insensitive, minimal, dynamic))
            }
            "Int" => RuleKind::Int {
                suffixes: self.build_children(node)?,
            },
            "Float" => RuleKind::Float {
                suffixes: self.build_children(node)?,
            },
            "HlCOct" => RuleKind::HlCOct,
            "HlCHex" => RuleKind::HlCHex,
            "HlCStringChar" => RuleKind::HlCStringChar,
            "HlCChar" => RuleKind::HlCChar,
            "RangeDetect" => RuleKind::RangeDetect(char_attr(node, "char")?, char_attr(node, "char1")?),
            "LineContinue" => {
                let c = if node.has_attribute("char") {
                    char_attr(node, "char")?
                } else {
                    '\\'
                };
                RuleKind::LineContinue(c)
            }
            "IncludeRules" => {
                let operation = required(node, "context")?;
                let target = ContextTarget::parse(operation).ok_or_else(|| {
                    SyntaxError::Malformed(format!("bad IncludeRules target '{operation}'"))
                })?;
                RuleKind::IncludeRules {
                    reference: ContextReference::new(target),
                    include_attrib: bool_attr(node, "includeAttrib")?.unwrap_or(false),
                }
            }
            "DetectSpaces" => RuleKind::DetectSpaces,
            "DetectIdentifier" => RuleKind::DetectIdentifier,
            other => return Err(SyntaxError::UnknownRule(other.to_string())),
        };

        let style = match node.attribute("attribute") {
            Some(name) if !name.is_empty() => Some(self.style(name)?),
            _ => None,
        };

        // IncludeRules reads `context` as the included target.
        let switcher = if matches!(kind, RuleKind::IncludeRules { .. }) {
            None
        } else {
            Self::switcher(node, "context")?
        };

        Ok(Rule {
            kind,
            style,
            switcher,
            lookahead: bool_attr(node, "lookAhead")?.unwrap_or(false),
            first_non_space: bool_attr(node, "firstNonSpace")?.unwrap_or(false),
            column: int_attr(node, "column")?,
            dynamic,
            begin_region: node.attribute("beginRegion").filter(|s| !s.is_empty()).map(Arc::from),
            end_region: node.attribute("endRegion").filter(|s| !s.is_empty()).map(Arc::from),
        })
    }

    fn build_children(&self, node: Node<'_, '_>) -> SyntaxResult<Vec<Rule>> {
        node.children()
            .filter(Node::is_element)
            .map(|rule| self.build_rule(rule))
            .collect()
    }
}

/// Resolves every context reference of `language`.
///
/// `load` is called with the grammar part of cross-grammar references
/// (anything but this language itself) and must return the loaded, linked
/// or in-progress language. Every language reached this way is recorded
/// in [`Language::linked_languages`] so it lives as long as `language`.
pub(crate) fn link_language(
    language: &Arc<Language>,
    load: &mut dyn FnMut(&str) -> SyntaxResult<Arc<Language>>,
) -> SyntaxResult<()> {
    let mut linked = Vec::new();
    for context in &language.contexts {
        let switchers = [
            &context.line_end,
            &context.line_begin,
            &context.line_empty,
            &context.fallthrough,
        ];
        for switcher in switchers.into_iter().flatten() {
            if let Some(reference) = switcher.reference() {
                resolve(language, reference, load, &mut linked)?;
            }
        }
        link_rules(language, &context.rules, load, &mut linked)?;
    }
    language.linked.set(linked);
    Ok(())
}

fn link_rules(
    language: &Arc<Language>,
    rules: &[Rule],
    load: &mut dyn FnMut(&str) -> SyntaxResult<Arc<Language>>,
    linked: &mut Vec<Arc<Language>>,
) -> SyntaxResult<()> {
    for rule in rules {
        if let Some(reference) = rule.switcher.as_ref().and_then(ContextSwitcher::reference) {
            resolve(language, reference, load, linked)?;
        }
        match &rule.kind {
            RuleKind::IncludeRules { reference, .. } => resolve(language, reference, load, linked)?,
            RuleKind::Int { suffixes } | RuleKind::Float { suffixes } => {
                link_rules(language, suffixes, load, linked)?
            }
            _ => {}
        }
    }
    Ok(())
}

fn resolve(
    language: &Arc<Language>,
    reference: &ContextReference,
    load: &mut dyn FnMut(&str) -> SyntaxResult<Arc<Language>>,
    linked: &mut Vec<Arc<Language>>,
) -> SyntaxResult<()> {
    if reference.is_resolved() {
        return Ok(());
    }
    let (owner, context) = match reference.target() {
        ContextTarget::Local(name) => (language.clone(), Some(name.as_str())),
        ContextTarget::External { context, grammar } => {
            let is_self = grammar.eq_ignore_ascii_case(language.id())
                || grammar.eq_ignore_ascii_case(language.name());
            let owner = if is_self { language.clone() } else { load(grammar)? };
            (owner, context.as_deref())
        }
    };
    if !Arc::ptr_eq(&owner, language) && !linked.iter().any(|known| Arc::ptr_eq(known, &owner)) {
        linked.push(owner.clone());
    }

    let index = match context {
        None => 0,
        Some(name) => *owner
            .context_index
            .get(name)
            .ok_or_else(|| SyntaxError::UnknownContext {
                grammar: owner.name().to_string(),
                context: name.to_string(),
            })?,
    };
    tracing::trace!(
        "Resolved '{}' in '{}' to {}::{}",
        reference.target(),
        language.name(),
        owner.name(),
        owner.context_at(index).name()
    );
    reference.resolve_to(ContextRef::new(&owner, index));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::TextType;

    const SAMPLE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE language SYSTEM "language.dtd">
<language name="Sample" section="Test" extensions="*.smp;*.sample" mimetype="text/x-sample"
          priority="3" indenter="cstyle" firstLineGlobs="#!*sample*">
  <highlighting>
    <list name="keywords">
      <item>If</item>
      <item>else</item>
    </list>
    <contexts>
      <context name="Normal" attribute="Normal Text" lineEndContext="#stay">
        <keyword attribute="Keyword" String="keywords"/>
        <DetectChar attribute="String" context="String" char="&quot;"/>
        <Detect2Chars attribute="Comment" context="Comment" char="/" char1="*" beginRegion="comment"/>
        <Float attribute="Float">
          <AnyChar String="fF"/>
        </Float>
        <IncludeRules context="Shared"/>
      </context>
      <context name="String" attribute="String" lineEndContext="#pop">
        <HlCStringChar attribute="String"/>
        <DetectChar attribute="String" context="#pop" char="&quot;"/>
      </context>
      <context name="Comment" attribute="Block Comment">
        <Detect2Chars attribute="Comment" context="#pop" char="*" char1="/" endRegion="comment"/>
      </context>
      <context name="Shared" attribute="Normal Text">
        <DetectChar attribute="Tab" char="\t"/>
      </context>
    </contexts>
    <itemDatas>
      <itemData name="Normal Text" defStyleNum="dsNormal"/>
      <itemData name="Keyword" defStyleNum="dsKeyword" bold="1"/>
      <itemData name="String" defStyleNum="dsString" color="#ff0000"/>
      <itemData name="Block Comment" defStyleNum="dsComment"/>
      <itemData name="Comment" defStyleNum="dsComment" italic="false"/>
      <itemData name="Float" defStyleNum="dsFloat"/>
      <itemData name="Tab" defStyleNum="dsOthers" spellChecking="false"/>
    </itemDatas>
  </highlighting>
  <general>
    <comments>
      <comment name="singleLine" start="//"/>
      <comment name="multiLine" start="/*" end="*/"/>
    </comments>
    <keywords casesensitive="0" weakDeliminator="-" additionalDeliminator="@"/>
    <folding indentationsensitive="true"/>
  </general>
</language>
"##;

    fn wrap(contexts: &str, items: &str) -> String {
        format!(
            r##"<language name="T"><highlighting><list name="kw"><item>a</item></list>
<contexts>{contexts}</contexts><itemDatas>{items}</itemDatas></highlighting></language>"##
        )
    }

    fn build(xml: &str) -> SyntaxResult<Language> {
        build_language("t", xml, Limits::default())
    }

    fn link_local(language: Language) -> SyntaxResult<Arc<Language>> {
        let language = Arc::new(language);
        link_language(&language, &mut |grammar: &str| {
            Err(SyntaxError::UnknownGrammar(grammar.to_string()))
        })?;
        Ok(language)
    }

    #[test]
    fn test_parse_header() {
        let header = parse_header("sample", SAMPLE).unwrap();
        assert_eq!(header.id, "sample");
        assert_eq!(header.name, "Sample");
        assert_eq!(header.section, "Test");
        assert_eq!(header.extensions, vec!["*.smp", "*.sample"]);
        assert_eq!(header.mimetypes, vec!["text/x-sample"]);
        assert_eq!(header.first_line_globs, vec!["#!*sample*"]);
        assert_eq!(header.priority, 3);
        assert!(!header.hidden);
        assert_eq!(header.indenter.as_deref(), Some("cstyle"));
    }

    #[test]
    fn test_build_sample() {
        let language = link_local(build_language("sample", SAMPLE, Limits::default()).unwrap()).unwrap();
        assert_eq!(language.contexts().len(), 4);
        assert_eq!(language.default_context().name(), "Normal");
        assert!(!language.is_case_sensitive());
        assert!(language.keywords().contains("if"));
        assert!(language.indentation_based_folding());
        assert_eq!(language.single_line_comment(), Some("//"));
        assert_eq!(language.multi_line_comment(), Some(("/*", "*/")));
        assert!(!language.delimiters().contains('-'));
        assert!(language.delimiters().contains('@'));

        let comment = language.style("block comment").unwrap();
        assert_eq!(comment.text_type(), TextType::BlockComment);
        assert_eq!(language.style("Keyword").unwrap().overrides().bold, Some(true));
        assert!(!language.style("Tab").unwrap().spell_checking());
    }

    #[test]
    fn test_links_local_references() {
        let language = link_local(build_language("sample", SAMPLE, Limits::default()).unwrap()).unwrap();
        let normal = language.context("Normal").unwrap();
        let switcher = normal.rules()[1].switcher().unwrap();
        let transition = switcher.transition().unwrap();
        assert_eq!(transition.target.unwrap().context().name(), "String");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a\\tb"), "a\tb");
        assert_eq!(unescape("\\\\"), "\\");
        assert_eq!(unescape("\\d+"), "\\d+");
        assert_eq!(unescape("end\\"), "end\\");
    }

    #[test]
    fn test_missing_required_attribute() {
        let xml = wrap(
            r##"<context name="N" attribute="Normal"><DetectChar attribute="Normal"/></context>"##,
            r##"<itemData name="Normal" defStyleNum="dsNormal"/>"##,
        );
        match build(&xml) {
            Err(SyntaxError::MissingAttribute { element, attribute }) => {
                assert_eq!(element, "DetectChar");
                assert_eq!(attribute, "char");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_bool() {
        let xml = wrap(
            r##"<context name="N" attribute="Normal"><DetectSpaces lookAhead="maybe"/></context>"##,
            r##"<itemData name="Normal" defStyleNum="dsNormal"/>"##,
        );
        assert!(matches!(build(&xml), Err(SyntaxError::InvalidBool { .. })));
    }

    #[test]
    fn test_invalid_int() {
        let xml = wrap(
            r##"<context name="N" attribute="Normal"><DetectSpaces column="x"/></context>"##,
            r##"<itemData name="Normal" defStyleNum="dsNormal"/>"##,
        );
        assert!(matches!(build(&xml), Err(SyntaxError::InvalidInt { .. })));
    }

    #[test]
    fn test_unknown_rule_tag() {
        let xml = wrap(
            r##"<context name="N" attribute="Normal"><Bogus/></context>"##,
            r##"<itemData name="Normal" defStyleNum="dsNormal"/>"##,
        );
        assert!(matches!(build(&xml), Err(SyntaxError::UnknownRule(tag)) if tag == "Bogus"));
    }

    #[test]
    fn test_unknown_attribute_and_style() {
        let xml = wrap(r##"<context name="N" attribute="Nope"/>"##, "");
        assert!(matches!(build(&xml), Err(SyntaxError::UnknownAttribute(_))));

        let xml = wrap(
            r##"<context name="N" attribute="Normal"/>"##,
            r##"<itemData name="Normal" defStyleNum="dsPlaid"/>"##,
        );
        assert!(matches!(build(&xml), Err(SyntaxError::UnknownStyle(_))));
    }

    #[test]
    fn test_unknown_keyword_list() {
        let xml = wrap(
            r##"<context name="N" attribute="Normal"><keyword String="nope"/></context>"##,
            r##"<itemData name="Normal" defStyleNum="dsNormal"/>"##,
        );
        assert!(matches!(build(&xml), Err(SyntaxError::UnknownKeywordList(_))));
    }

    #[test]
    fn test_multi_char_literal_rejected() {
        let xml = wrap(
            r##"<context name="N" attribute="Normal"><DetectChar char="ab"/></context>"##,
            r##"<itemData name="Normal" defStyleNum="dsNormal"/>"##,
        );
        assert!(matches!(build(&xml), Err(SyntaxError::InvalidLiteral { .. })));
    }

    #[test]
    fn test_empty_grammar() {
        let xml = wrap("", "");
        assert!(matches!(build(&xml), Err(SyntaxError::EmptyGrammar(_))));
    }

    #[test]
    fn test_not_a_grammar() {
        assert!(matches!(build("<theme/>"), Err(SyntaxError::Malformed(_))));
        assert!(matches!(build("<language"), Err(SyntaxError::Xml(_))));
    }

    #[test]
    fn test_unresolved_context_fails_link() {
        let xml = wrap(
            r##"<context name="N" attribute="Normal"><DetectChar char="x" context="Missing"/></context>"##,
            r##"<itemData name="Normal" defStyleNum="dsNormal"/>"##,
        );
        let result = link_local(build(&xml).unwrap());
        assert!(matches!(
            result,
            Err(SyntaxError::UnknownContext { context, .. }) if context == "Missing"
        ));
    }

    #[test]
    fn test_malformed_context_operation_fails_load() {
        for (element, attribute) in [
            (r##"<DetectChar char="x" context="Str##"/>"##, ""),
            (r##"<DetectChar char="x" context="a##b##c"/>"##, ""),
            ("", r##"lineEndContext="#pop#stay""##),
            ("", r##"lineBeginContext="#bogus""##),
        ] {
            let xml = wrap(
                &format!(r##"<context name="N" attribute="Normal" {attribute}>{element}</context>"##),
                r##"<itemData name="Normal" defStyleNum="dsNormal"/>"##,
            );
            assert!(
                matches!(build(&xml), Err(SyntaxError::Malformed(_))),
                "{element}{attribute} should not load"
            );
        }
    }

    #[test]
    fn test_self_reference_by_name() {
        let xml = wrap(
            r##"<context name="N" attribute="Normal"><DetectChar char="x" context="N##T"/></context>"##,
            r##"<itemData name="Normal" defStyleNum="dsNormal"/>"##,
        );
        let language = link_local(build(&xml).unwrap()).unwrap();
        assert!(language.linked_languages().is_empty());
    }

    #[test]
    fn test_fallthrough_flag() {
        let xml = wrap(
            r##"<context name="N" attribute="Normal"/>
               <context name="A" attribute="Normal" fallthrough="false" fallthroughContext="#pop"/>
               <context name="B" attribute="Normal" fallthroughContext="#pop"/>"##,
            r##"<itemData name="Normal" defStyleNum="dsNormal"/>"##,
        );
        let language = build(&xml).unwrap();
        assert!(language.context("A").unwrap().fallthrough().is_none());
        assert!(language.context("B").unwrap().fallthrough().is_some());
    }
}
