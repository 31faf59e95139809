//! Colors and the drawing theme

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    ACCURACY_CEIL, ACCURACY_FLOOR, DEFAULT_ACCURACY_BEST, DEFAULT_ACCURACY_WORST,
    DEFAULT_BACKGROUND, DEFAULT_GRID_ALPHA, DEFAULT_HIGHLIGHT, DEFAULT_HIGHLIGHT_ALPHA,
    DEFAULT_LINE, DEFAULT_PAINTED_ALPHA, DEFAULT_PAINTED_AREA, DEFAULT_ZONE_ALPHA,
};

#[derive(Debug, Error, PartialEq)]
#[error("invalid color '{0}', expected #rrggbb or #rrggbbaa")]
pub struct ColorParseError(pub String);

/// 8-bit RGBA color, serialized as a hex string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let err = || ColorParseError(hex.to_string());
        let digits = hex.strip_prefix('#').ok_or_else(err)?;
        if !digits.is_ascii() || (digits.len() != 6 && digits.len() != 8) {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| err());

        let alpha = if digits.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, alpha))
    }

    /// Same color with alpha scaled by `alpha` (0.0-1.0), like canvas
    /// `globalAlpha`.
    pub fn with_alpha(self, alpha: f32) -> Self {
        let a = (self.a as f32 * alpha.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    /// Per-channel linear interpolation, rounded
    pub fn lerp(self, other: Color, t: f64) -> Self {
        let mix = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
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

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Colors and opacities used by the court renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background: Color,
    pub line: Color,
    pub painted_area: Color,
    pub highlight: Color,
    /// Cell color at or below 25% accuracy
    pub accuracy_worst: Color,
    /// Cell color at or above 60% accuracy
    pub accuracy_best: Color,
    pub grid_alpha: f32,
    pub painted_alpha: f32,
    pub highlight_alpha: f32,
    pub zone_alpha: f32,
}

impl Default for Theme {
    fn default() -> Self {
        // Defaults are compile-time constants known to parse
        let parse = |hex: &str| Color::from_hex(hex).unwrap_or(Color::rgb(0, 0, 0));
        Self {
            background: parse(DEFAULT_BACKGROUND),
            line: parse(DEFAULT_LINE),
            painted_area: parse(DEFAULT_PAINTED_AREA),
            highlight: parse(DEFAULT_HIGHLIGHT),
            accuracy_worst: parse(DEFAULT_ACCURACY_WORST),
            accuracy_best: parse(DEFAULT_ACCURACY_BEST),
            grid_alpha: DEFAULT_GRID_ALPHA,
            painted_alpha: DEFAULT_PAINTED_ALPHA,
            highlight_alpha: DEFAULT_HIGHLIGHT_ALPHA,
            zone_alpha: DEFAULT_ZONE_ALPHA,
        }
    }
}

impl Theme {
    /// Cell color for an accuracy value. Accuracy is remapped so 25% hits
    /// the worst end and 60% the best end, clamping outside that band.
    /// Non-finite accuracy means "no data" and has no color.
    pub fn accuracy_color(&self, accuracy: f64) -> Option<Color> {
        if !accuracy.is_finite() {
            return None;
        }
        let t = ((accuracy - ACCURACY_FLOOR) / (ACCURACY_CEIL - ACCURACY_FLOOR)).clamp(0.0, 1.0);
        Some(self.accuracy_worst.lerp(self.accuracy_best, t))
    }
}
