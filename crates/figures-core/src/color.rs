//! Color representation and the fixed palettes used by the figures.

use serde::{Deserialize, Serialize};

/// RGBA color with values in the range [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red component [0.0, 1.0]
    pub r: f32,
    /// Green component [0.0, 1.0]
    pub g: f32,
    /// Blue component [0.0, 1.0]
    pub b: f32,
    /// Alpha component [0.0, 1.0]
    pub a: f32,
}

impl Color {
    /// Create a new color, clamping values to [0.0, 1.0].
    #[must_use]
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: a.clamp(0.0, 1.0),
        }
    }

    /// Create an opaque color from RGB values.
    #[must_use]
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Create an opaque color from a packed `0xRRGGBB` value.
    #[must_use]
    pub const fn from_rgb_u32(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as f32 / 255.0,
            g: ((rgb >> 8) & 0xff) as f32 / 255.0,
            b: (rgb & 0xff) as f32 / 255.0,
            a: 1.0,
        }
    }

    /// Parse a hex color string (e.g., "#ff0000" or "ff0000").
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a 6-digit hex color.
    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return Err(ColorParseError::InvalidLength);
        }
        let packed = u32::from_str_radix(hex, 16).map_err(|_| ColorParseError::InvalidHex)?;
        Ok(Self::from_rgb_u32(packed))
    }

    /// Convert to hex string (RGB only).
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!(
            "#{:02x}{:02x}{:02x}",
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8
        )
    }

    /// Linear interpolation between two colors.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self::new(
            (other.r - self.r).mul_add(t, self.r),
            (other.g - self.g).mul_add(t, self.g),
            (other.b - self.b).mul_add(t, self.b),
            (other.a - self.a).mul_add(t, self.a),
        )
    }

    /// Black color
    pub const BLACK: Self = Self::from_rgb_u32(0x00_0000);
    /// Neutral grey used for uncolored links
    pub const GREY: Self = Self::from_rgb_u32(0xaa_aaaa);
    /// Green stop of the value scale
    pub const GREEN: Self = Self::from_rgb_u32(0x00_ff00);
    /// Yellow stop of the value scale
    pub const YELLOW: Self = Self::from_rgb_u32(0xff_ff00);
    /// Red stop of the value scale
    pub const RED: Self = Self::from_rgb_u32(0xff_0000);
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Sampled stops of the Inferno colormap, evenly spaced over [0, 1].
pub const INFERNO: [Color; 6] = [
    Color::from_rgb_u32(0x00_0004),
    Color::from_rgb_u32(0x42_0a68),
    Color::from_rgb_u32(0x93_2667),
    Color::from_rgb_u32(0xdd_513a),
    Color::from_rgb_u32(0xfc_a50a),
    Color::from_rgb_u32(0xfc_ffa4),
];

/// Ten-color categorical palette.
pub const CATEGORY10: [Color; 10] = [
    Color::from_rgb_u32(0x1f_77b4),
    Color::from_rgb_u32(0xff_7f0e),
    Color::from_rgb_u32(0x2c_a02c),
    Color::from_rgb_u32(0xd6_2728),
    Color::from_rgb_u32(0x94_67bd),
    Color::from_rgb_u32(0x8c_564b),
    Color::from_rgb_u32(0xe3_77c2),
    Color::from_rgb_u32(0x7f_7f7f),
    Color::from_rgb_u32(0xbc_bd22),
    Color::from_rgb_u32(0x17_becf),
];

/// Muted palette for pie slices.
pub const PIE_PALETTE: [Color; 7] = [
    Color::from_rgb_u32(0x98_abc5),
    Color::from_rgb_u32(0x8a_89a6),
    Color::from_rgb_u32(0x7b_6888),
    Color::from_rgb_u32(0x6b_486b),
    Color::from_rgb_u32(0xa0_5d56),
    Color::from_rgb_u32(0xd0_743c),
    Color::from_rgb_u32(0xff_8c00),
];

/// Error type for color parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    /// Invalid hex characters
    #[error("invalid hex characters")]
    InvalidHex,
    /// Invalid string length
    #[error("invalid hex string length (expected 6)")]
    InvalidLength,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        let c = Color::from_hex("#ff0000").unwrap();
        assert_eq!(c, Color::RED);
        let c2 = Color::from_hex("00ff00").unwrap();
        assert_eq!(c2, Color::GREEN);
    }

    #[test]
    fn test_color_from_hex_invalid() {
        assert_eq!(Color::from_hex("#gg0000"), Err(ColorParseError::InvalidHex));
        assert_eq!(Color::from_hex("#ff"), Err(ColorParseError::InvalidLength));
    }

    #[test]
    fn test_color_to_hex_roundtrip_of_constants() {
        assert_eq!(Color::YELLOW.to_hex(), "#ffff00");
        assert_eq!(CATEGORY10[0].to_hex(), "#1f77b4");
        assert_eq!(INFERNO[5].to_hex(), "#fcffa4");
    }

    #[test]
    fn test_color_lerp_midpoint() {
        let mid = Color::GREEN.lerp(&Color::RED, 0.5);
        assert!((mid.r - 0.5).abs() < 0.001);
        assert!((mid.g - 0.5).abs() < 0.001);
        assert_eq!(mid.b, 0.0);
    }

    #[test]
    fn test_color_lerp_clamps_t() {
        assert_eq!(Color::GREEN.lerp(&Color::RED, 2.0), Color::RED);
        assert_eq!(Color::GREEN.lerp(&Color::RED, -1.0), Color::GREEN);
    }

    #[test]
    fn test_color_parse_error_display() {
        assert_eq!(ColorParseError::InvalidHex.to_string(), "invalid hex characters");
    }
}
