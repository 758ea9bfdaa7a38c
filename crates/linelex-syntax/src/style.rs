//! Styles: the built-in default styles, per-grammar overrides and the
//! one-character text-type classification derived from them.

use serde::{Deserialize, Serialize};

use crate::theme::{Color, TextFormat, Theme};

/// Built-in style categories a grammar attribute maps onto.
///
/// Grammars refer to these by their `ds*` names (`dsKeyword`, `dsString`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DefaultStyle {
    Normal,
    Keyword,
    Function,
    Variable,
    ControlFlow,
    Operator,
    BuiltIn,
    Extension,
    Preprocessor,
    Attribute,
    Char,
    SpecialChar,
    String,
    VerbatimString,
    SpecialString,
    Import,
    DataType,
    DecVal,
    BaseN,
    Float,
    Constant,
    Comment,
    Documentation,
    Annotation,
    CommentVar,
    RegionMarker,
    Information,
    Warning,
    Alert,
    Others,
    Error,
}

impl DefaultStyle {
    pub const ALL: [DefaultStyle; 31] = [
        Self::Normal,
        Self::Keyword,
        Self::Function,
        Self::Variable,
        Self::ControlFlow,
        Self::Operator,
        Self::BuiltIn,
        Self::Extension,
        Self::Preprocessor,
        Self::Attribute,
        Self::Char,
        Self::SpecialChar,
        Self::String,
        Self::VerbatimString,
        Self::SpecialString,
        Self::Import,
        Self::DataType,
        Self::DecVal,
        Self::BaseN,
        Self::Float,
        Self::Constant,
        Self::Comment,
        Self::Documentation,
        Self::Annotation,
        Self::CommentVar,
        Self::RegionMarker,
        Self::Information,
        Self::Warning,
        Self::Alert,
        Self::Others,
        Self::Error,
    ];

    /// The grammar-facing name, e.g. `dsKeyword`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "dsNormal",
            Self::Keyword => "dsKeyword",
            Self::Function => "dsFunction",
            Self::Variable => "dsVariable",
            Self::ControlFlow => "dsControlFlow",
            Self::Operator => "dsOperator",
            Self::BuiltIn => "dsBuiltIn",
            Self::Extension => "dsExtension",
            Self::Preprocessor => "dsPreprocessor",
            Self::Attribute => "dsAttribute",
            Self::Char => "dsChar",
            Self::SpecialChar => "dsSpecialChar",
            Self::String => "dsString",
            Self::VerbatimString => "dsVerbatimString",
            Self::SpecialString => "dsSpecialString",
            Self::Import => "dsImport",
            Self::DataType => "dsDataType",
            Self::DecVal => "dsDecVal",
            Self::BaseN => "dsBaseN",
            Self::Float => "dsFloat",
            Self::Constant => "dsConstant",
            Self::Comment => "dsComment",
            Self::Documentation => "dsDocumentation",
            Self::Annotation => "dsAnnotation",
            Self::CommentVar => "dsCommentVar",
            Self::RegionMarker => "dsRegionMarker",
            Self::Information => "dsInformation",
            Self::Warning => "dsWarning",
            Self::Alert => "dsAlert",
            Self::Others => "dsOthers",
            Self::Error => "dsError",
        }
    }

    /// Parses a `ds*` name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|style| style.name() == name)
    }
}

/// Per-column classification consumed by indenters, bracket matching
/// and other line-aware features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextType {
    #[default]
    Code,
    Comment,
    BlockComment,
    Heredoc,
    StringLike,
}

impl TextType {
    /// The single-character tag: `' '`, `'c'`, `'b'`, `'h'` or `'s'`.
    pub fn as_char(self) -> char {
        match self {
            Self::Code => ' ',
            Self::Comment => 'c',
            Self::BlockComment => 'b',
            Self::Heredoc => 'h',
            Self::StringLike => 's',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            ' ' => Some(Self::Code),
            'c' => Some(Self::Comment),
            'b' => Some(Self::BlockComment),
            'h' => Some(Self::Heredoc),
            's' => Some(Self::StringLike),
            _ => None,
        }
    }

    /// Derives the text type from an item name and its default style.
    pub fn classify(item_name: &str, style: DefaultStyle) -> Self {
        let lower = item_name.to_lowercase();
        match style {
            DefaultStyle::Others if lower.contains("here") => Self::Heredoc,
            DefaultStyle::Comment if lower.contains("block") => Self::BlockComment,
            DefaultStyle::Comment => Self::Comment,
            DefaultStyle::String
            | DefaultStyle::VerbatimString
            | DefaultStyle::SpecialString
            | DefaultStyle::Char
            | DefaultStyle::RegionMarker
            | DefaultStyle::Others => Self::StringLike,
            _ => Self::Code,
        }
    }

    pub fn is_comment(self) -> bool {
        matches!(self, Self::Comment | Self::BlockComment)
    }

    pub fn is_code(self) -> bool {
        self == Self::Code
    }
}

/// Explicit `<itemData>` overrides on top of the default style.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleOverrides {
    pub color: Option<Color>,
    pub selection_color: Option<Color>,
    pub background: Option<Color>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strikeout: Option<bool>,
}

/// A resolved grammar attribute: default style, overrides, text type.
///
/// Styles never hold colors of their own beyond the overrides; the display
/// format is produced against a [`Theme`] on demand, so switching themes
/// leaves the grammar untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    name: String,
    default_style: DefaultStyle,
    overrides: StyleOverrides,
    text_type: TextType,
    spell_checking: bool,
}

impl Style {
    /// A style with no overrides, named after its default style.
    pub fn builtin(default_style: DefaultStyle) -> Self {
        Self::from_item(default_style.name(), default_style, StyleOverrides::default(), true)
    }

    /// A style declared by an `<itemData>` element.
    pub fn from_item(
        name: &str,
        default_style: DefaultStyle,
        overrides: StyleOverrides,
        spell_checking: bool,
    ) -> Self {
        Self {
            name: name.to_string(),
            default_style,
            overrides,
            text_type: TextType::classify(name, default_style),
            spell_checking,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_style(&self) -> DefaultStyle {
        self.default_style
    }

    pub fn overrides(&self) -> &StyleOverrides {
        &self.overrides
    }

    pub fn text_type(&self) -> TextType {
        self.text_type
    }

    pub fn spell_checking(&self) -> bool {
        self.spell_checking
    }

    /// Display format: the theme's entry for the default style, patched
    /// with this item's overrides.
    pub fn format(&self, theme: &Theme) -> TextFormat {
        let mut format = theme.format(self.default_style);
        let o = &self.overrides;
        if let Some(color) = o.color {
            format.foreground = Some(color);
        }
        if let Some(color) = o.background {
            format.background = Some(color);
        }
        if let Some(color) = o.selection_color {
            format.selection = Some(color);
        }
        if let Some(bold) = o.bold {
            format.bold = bold;
        }
        if let Some(italic) = o.italic {
            format.italic = italic;
        }
        if let Some(underline) = o.underline {
            format.underline = underline;
        }
        if let Some(strikeout) = o.strikeout {
            format.strikeout = strikeout;
        }
        format
    }
}
