//! Deck palette and color parsing

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// An sRGB color with straight (non-premultiplied) alpha.
///
/// Serialized as `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// Same color with the alpha channel forced to 255.
    pub fn opaque(self) -> Self {
        Self { a: 255, ..self }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Components scaled to `0.0..=1.0`, as document backends expect them.
    pub fn to_unit_rgb(&self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }

    /// Linear interpolation between two colors, `t` clamped to `0..=1`.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 {
            (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8
        };
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| Error::DeckError(format!("color '{}' must start with '#'", s)))?;
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            return Err(Error::DeckError(format!("color '{}' must be #rrggbb or #rrggbbaa", s)));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| Error::DeckError(format!("color '{}' has invalid hex digits", s)))
        };
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Color { r: channel(0)?, g: channel(2)?, b: channel(4)?, a })
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

/// Two-stop diagonal (135deg) background gradient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub from: Color,
    pub to: Color,
}

/// Palette shared by every slide of a deck.
///
/// `export_background` must be opaque: it is the fill used behind captured
/// bitmaps and on every exported page, so transparent regions never come out
/// white.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background: Gradient,
    pub export_background: Color,
    pub panel: Color,
    pub border: Color,
    pub primary: Color,
    pub accent: Color,
    pub danger: Color,
    pub text: Color,
    pub muted_text: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Gradient {
                from: Color::rgb(0x0f, 0x17, 0x2a),
                to: Color::rgb(0x1e, 0x29, 0x3b),
            },
            export_background: Color::rgb(0x0f, 0x17, 0x2a),
            panel: Color::rgba(0x1e, 0x29, 0x3b, 0x99),
            border: Color::rgba(0xff, 0xff, 0xff, 0x1a),
            primary: Color::rgb(0x38, 0xbd, 0xf8),
            accent: Color::rgb(0xa7, 0x8b, 0xfa),
            danger: Color::rgb(0xf4, 0x3f, 0x5e),
            text: Color::rgb(0xf8, 0xfa, 0xfc),
            muted_text: Color::rgb(0xcb, 0xd5, 0xe1),
        }
    }
}

impl Theme {
    pub(crate) fn validate(&self) -> Result<()> {
        if !self.export_background.is_opaque() {
            return Err(Error::DeckError(format!(
                "export background {} must be opaque",
                self.export_background
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_alpha_forms() {
        let c: Color = "#0f172a".parse().unwrap();
        assert_eq!(c, Color::rgb(15, 23, 42));
        let c: Color = "#1e293b99".parse().unwrap();
        assert_eq!(c.a, 0x99);
        assert_eq!(c.to_string(), "#1e293b99");
    }

    #[test]
    fn rejects_malformed_colors() {
        assert!("0f172a".parse::<Color>().is_err());
        assert!("#0f17".parse::<Color>().is_err());
        assert!("#zz172a".parse::<Color>().is_err());
    }

    #[test]
    fn theme_deserializes_partial_overrides() {
        let t: Theme = serde_json::from_str(r##"{"primary":"#ff0000"}"##).unwrap();
        assert_eq!(t.primary, Color::rgb(255, 0, 0));
        assert_eq!(t.export_background, Theme::default().export_background);
    }

    #[test]
    fn translucent_export_background_is_rejected() {
        let t = Theme {
            export_background: Color::rgba(0, 0, 0, 10),
            ..Theme::default()
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn lerp_hits_endpoints() {
        let a = Color::rgb(0, 0, 0);
        let b = Color::rgb(200, 100, 50);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Color::rgb(100, 50, 25));
    }
}
