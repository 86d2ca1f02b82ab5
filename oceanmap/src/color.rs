use serde::{Deserialize, Serialize};

/// RGBA color used by feature styles.
///
/// Serializes as a `#RRGGBBAA` string.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from_hex(&value).ok_or_else(|| format!("invalid color: {value}"))
    }
}

impl From<Color> for String {
    fn from(val: Color) -> Self {
        val.to_hex()
    }
}

impl Color {
    /// Transparent color: `#00000000`
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    /// White color: `#FFFFFFFF`
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    /// Stroke of user drawn geometry.
    pub const DRAWN: Color = Color::rgba(255, 0, 0, 255);
    /// Stroke of selected features.
    pub const SELECTED: Color = Color::rgba(0, 112, 255, 255);
    /// Stroke of the feature under the pointer.
    pub const HOVERED: Color = Color::rgba(255, 170, 0, 255);
    /// Observation platforms and tracks.
    pub const OBSERVATION: Color = Color::rgba(0, 128, 128, 255);

    /// Constructs color from its RGBA channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Converts the color into HEX8 string: `#RRGGBBAA`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }

    /// Parses a color from HEX6 (`#RRGGBB`) or HEX8 (`#RRGGBBAA`) string.
    pub fn try_from_hex(hex_string: &str) -> Option<Self> {
        if !hex_string.is_ascii()
            || hex_string.len() != 7 && hex_string.len() != 9
            || !hex_string.starts_with('#')
        {
            return None;
        }

        let channel = |from: usize| u8::from_str_radix(&hex_string[from..from + 2], 16).ok();
        let a = if hex_string.len() == 9 {
            channel(7)?
        } else {
            255
        };

        Some(Self::rgba(channel(1)?, channel(3)?, channel(5)?, a))
    }

    /// Returns a copy of the color with the given alpha channel.
    pub fn with_alpha(&self, a: u8) -> Self {
        Self { a, ..*self }
    }

    /// Linear interpolation between `self` (`t = 0`) and `other` (`t = 1`). `t` is clamped into `[0, 1]`.
    pub fn lerp(&self, other: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |from: u8, to: u8| (from as f64 + (to as f64 - from as f64) * t).round() as u8;

        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        let color = Color::try_from_hex("#FF1000AA").expect("valid hex");
        assert_eq!(color, Color::rgba(255, 16, 0, 170));
        assert_eq!(color.to_hex(), "#FF1000AA");

        assert_eq!(Color::try_from_hex("#00FF00"), Some(Color::rgba(0, 255, 0, 255)));
        assert_eq!(Color::try_from_hex("00FF00"), None);
        assert_eq!(Color::try_from_hex("#00FG00"), None);
    }

    #[test]
    fn lerp_clamps() {
        let from = Color::rgba(0, 0, 0, 255);
        let to = Color::rgba(200, 100, 50, 255);
        assert_eq!(from.lerp(to, 0.5), Color::rgba(100, 50, 25, 255));
        assert_eq!(from.lerp(to, 2.0), to);
        assert_eq!(from.lerp(to, -1.0), from);
    }

    #[test]
    fn serde_as_hex_string() {
        let json = serde_json::to_string(&Color::SELECTED).expect("serializable");
        assert_eq!(json, "\"#0070FFFF\"");
        let back: Color = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(back, Color::SELECTED);
    }
}
