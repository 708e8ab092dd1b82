use anyhow::{bail, Context, Result};
use ratatui::style::Color;
use std::fmt;

use crate::config::ThemeConfig;

/// 24-bit true color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrueColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl TrueColor {
    /// Create a new true color from RGB values
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (the leading `#` is optional)
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            bail!("Invalid hex color: {hex}");
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .with_context(|| format!("Invalid hex color: {hex}"))
        };

        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Convert to hex string
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for TrueColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<TrueColor> for Color {
    fn from(color: TrueColor) -> Self {
        Color::Rgb(color.r, color.g, color.b)
    }
}

/// Resolved colors for the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormPalette {
    pub primary: TrueColor,
    pub foreground: TrueColor,
    pub background: TrueColor,
    pub muted: TrueColor,
    pub success: TrueColor,
    pub error: TrueColor,
}

impl FormPalette {
    /// Cool red on black
    #[must_use]
    pub const fn default_dark() -> Self {
        Self {
            primary: TrueColor::new(0xDD, 0x66, 0x66),    // #DD6666 - Cool red accent
            foreground: TrueColor::new(0xC0, 0xB0, 0xB0), // #C0B0B0 - Reddish gray
            background: TrueColor::new(0x00, 0x00, 0x00),
            muted: TrueColor::new(0x5A, 0x4A, 0x4A),
            success: TrueColor::new(0x6A, 0x9A, 0x7A),    // #6A9A7A - Muted green
            error: TrueColor::new(0xCC, 0x55, 0x55),
        }
    }

    /// Build from theme config
    ///
    /// # Errors
    /// Returns an error naming the first color that fails to parse
    pub fn from_theme(theme: &ThemeConfig) -> Result<Self> {
        let parse = |name: &str, value: &str| {
            TrueColor::from_hex(value).with_context(|| format!("Invalid theme color '{name}'"))
        };

        Ok(Self {
            primary: parse("primary", &theme.primary)?,
            foreground: parse("foreground", &theme.foreground)?,
            background: parse("background", &theme.background)?,
            muted: parse("muted", &theme.muted)?,
            success: parse("success", &theme.success)?,
            error: parse("error", &theme.error)?,
        })
    }
}

impl Default for FormPalette {
    fn default() -> Self {
        Self::default_dark()
    }
}
