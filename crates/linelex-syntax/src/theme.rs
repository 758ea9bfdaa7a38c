//! Color themes for resolved styles.
//!
//! ## Learning: Builder Pattern
//!
//! Themes start from a built-in palette and are adjusted per style:
//! ```rust,ignore
//! let theme = Theme::dark()
//!     .with_style(DefaultStyle::Keyword, TextFormat::colored(Color::rgb(1.0, 0.4, 0.4)).bold());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::SyntaxResult;
use crate::style::DefaultStyle;

/// Color representation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rrggbb` or `#aarrggbb`, the notation grammar files use.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().strip_prefix('#')?;
        let channel = |i: usize| -> Option<f32> {
            let byte = u8::from_str_radix(digits.get(i..i + 2)?, 16).ok()?;
            Some(f32::from(byte) / 255.0)
        };
        match digits.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::rgba(channel(2)?, channel(4)?, channel(6)?, channel(0)?)),
            _ => None,
        }
    }

    /// Formats as `#rrggbb` (alpha is dropped).
    pub fn to_hex(&self) -> String {
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }
}

/// Display attributes for a span of text.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextFormat {
    pub foreground: Option<Color>,
    pub background: Option<Color>,
    pub selection: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
}

impl TextFormat {
    pub fn colored(color: Color) -> Self {
        Self {
            foreground: Some(color),
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }
}

/// Maps every default style to a display format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    /// Theme name
    pub name: String,

    /// Is this a dark theme?
    pub is_dark: bool,

    /// Editor background
    pub background: Color,

    /// Text color used when a style has no explicit color
    pub foreground: Color,

    /// Per default-style formats
    #[serde(default)]
    pub styles: BTreeMap<DefaultStyle, TextFormat>,
}

impl Theme {
    /// Creates the default dark theme.
    pub fn dark() -> Self {
        let keyword = Color::rgb(0.8, 0.5, 0.8); // Purple
        let string = Color::rgb(0.6, 0.8, 0.5); // Green
        let number = Color::rgb(0.9, 0.7, 0.5); // Orange
        let comment = Color::rgb(0.5, 0.5, 0.5); // Gray
        let function = Color::rgb(0.5, 0.7, 0.9); // Blue
        let type_name = Color::rgb(0.5, 0.8, 0.8); // Cyan
        let constant = Color::rgb(0.9, 0.6, 0.5); // Red-orange
        let attribute = Color::rgb(0.9, 0.8, 0.5); // Yellow
        let alert = Color::rgb(0.95, 0.35, 0.35);

        Self {
            name: "Linelex Dark".to_string(),
            is_dark: true,
            background: Color::rgb(0.10, 0.10, 0.12),
            foreground: Color::rgb(0.9, 0.9, 0.9),
            styles: Self::palette(
                keyword, string, number, comment, function, type_name, constant, attribute, alert,
            ),
        }
    }

    /// Creates a light theme.
    pub fn light() -> Self {
        let keyword = Color::rgb(0.6, 0.3, 0.6);
        let string = Color::rgb(0.3, 0.6, 0.3);
        let number = Color::rgb(0.7, 0.4, 0.2);
        let comment = Color::rgb(0.45, 0.45, 0.4);
        let function = Color::rgb(0.2, 0.4, 0.7);
        let type_name = Color::rgb(0.2, 0.6, 0.6);
        let constant = Color::rgb(0.7, 0.3, 0.2);
        let attribute = Color::rgb(0.6, 0.5, 0.2);
        let alert = Color::rgb(0.8, 0.1, 0.1);

        Self {
            name: "Linelex Light".to_string(),
            is_dark: false,
            background: Color::rgb(1.0, 1.0, 1.0),
            foreground: Color::rgb(0.1, 0.1, 0.1),
            styles: Self::palette(
                keyword, string, number, comment, function, type_name, constant, attribute, alert,
            ),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn palette(
        keyword: Color,
        string: Color,
        number: Color,
        comment: Color,
        function: Color,
        type_name: Color,
        constant: Color,
        attribute: Color,
        alert: Color,
    ) -> BTreeMap<DefaultStyle, TextFormat> {
        use DefaultStyle::*;
        let plain = TextFormat::colored;
        BTreeMap::from([
            (Keyword, plain(keyword).bold()),
            (ControlFlow, plain(keyword).bold()),
            (Operator, TextFormat::default()),
            (Function, plain(function)),
            (BuiltIn, plain(function)),
            (Extension, plain(type_name)),
            (Variable, plain(constant)),
            (Preprocessor, plain(attribute)),
            (Attribute, plain(attribute)),
            (Annotation, plain(attribute)),
            (Import, plain(keyword)),
            (DataType, plain(type_name)),
            (DecVal, plain(number)),
            (BaseN, plain(number)),
            (Float, plain(number)),
            (Constant, plain(constant)),
            (Char, plain(string)),
            (SpecialChar, plain(constant)),
            (String, plain(string)),
            (VerbatimString, plain(string)),
            (SpecialString, plain(string).italic()),
            (Comment, plain(comment).italic()),
            (Documentation, plain(comment).italic()),
            (CommentVar, plain(attribute).italic()),
            (RegionMarker, plain(function)),
            (Information, plain(function)),
            (Warning, plain(attribute).bold()),
            (Alert, plain(alert).bold()),
            (Others, plain(type_name)),
            (Error, plain(alert).underline()),
        ])
    }

    /// Returns the theme's format for a default style.
    ///
    /// Styles the theme does not list fall back to the plain foreground.
    pub fn format(&self, style: DefaultStyle) -> TextFormat {
        self.styles
            .get(&style)
            .copied()
            .unwrap_or_else(|| TextFormat::colored(self.foreground))
    }

    /// Replaces the format of one default style.
    pub fn with_style(mut self, style: DefaultStyle, format: TextFormat) -> Self {
        self.styles.insert(style, format);
        self
    }

    /// Loads a theme from a JSON file.
    pub fn load(path: &Path) -> SyntaxResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Saves the theme to a JSON file.
    pub fn save(&self, path: &Path) -> SyntaxResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        let c = Color::from_hex("#ff0080").unwrap();
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert!((c.b - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.to_hex(), "#ff0080");
        assert!(Color::from_hex("ff0080").is_none());
        assert!(Color::from_hex("#ff00").is_none());
    }

    #[test]
    fn test_unlisted_style_uses_foreground() {
        let theme = Theme::dark();
        assert_eq!(theme.format(DefaultStyle::Normal).foreground, Some(theme.foreground));
    }

    #[test]
    fn test_dark_and_light_palettes_differ() {
        let dark = Theme::dark();
        let light = Theme::light();
        for (style, format) in &dark.styles {
            if let Some(color) = format.foreground {
                assert_ne!(light.format(*style).foreground, Some(color), "{style:?}");
            }
        }
        assert_ne!(dark.format(DefaultStyle::Comment), light.format(DefaultStyle::Comment));
    }

    #[test]
    fn test_theme_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theme.json");
        let theme = Theme::light().with_style(
            DefaultStyle::Keyword,
            TextFormat::colored(Color::rgb(0.0, 0.0, 1.0)).underline(),
        );
        theme.save(&path).unwrap();

        let loaded = Theme::load(&path).unwrap();
        assert_eq!(loaded.name, "Linelex Light");
        assert!(loaded.format(DefaultStyle::Keyword).underline);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Theme::load(&path), Err(crate::SyntaxError::Theme(_))));
    }
}
