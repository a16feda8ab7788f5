//! Caption styling.
//!
//! A [`CaptionStyle`] is chosen once per job and never changes while the job
//! runs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ModelError;

/// 24-bit color, written as `#RRGGBB` in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const WHITE: RgbColor = RgbColor::new(0xFF, 0xFF, 0xFF);
    pub const BLACK: RgbColor = RgbColor::new(0x00, 0x00, 0x00);
    pub const YELLOW: RgbColor = RgbColor::new(0xFF, 0xE0, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// ASS color literal. ASS stores channels as `&HAABBGGRR`.
    pub fn to_ass(self) -> String {
        format!("&H00{:02X}{:02X}{:02X}", self.b, self.g, self.r)
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for RgbColor {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ModelError::new("color", format!("expected #RRGGBB, got {s:?}")));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|e| ModelError::new("color", e.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl Serialize for RgbColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RgbColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Entrance animation applied to each caption event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionAnimation {
    #[default]
    None,
    /// Highlighted word scales up briefly.
    Pop,
    /// Phrase fades in on its first word.
    Fade,
}

/// Immutable caption style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    pub font_name: String,
    pub font_size: u32,
    pub primary_color: RgbColor,
    pub highlight_color: RgbColor,
    pub outline_color: RgbColor,
    /// Outline thickness in pixels.
    pub outline: u32,
    /// Drop-shadow depth in pixels.
    pub shadow: u32,
    /// Bottom margin in pixels.
    pub margin_v: u32,
    pub animation: CaptionAnimation,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self::bold()
    }
}

impl CaptionStyle {
    pub const PRESETS: [&'static str; 3] = ["bold", "minimal", "neon"];

    /// Large white text with a yellow highlight and heavy outline.
    pub fn bold() -> Self {
        Self {
            font_name: "Arial".to_string(),
            font_size: 72,
            primary_color: RgbColor::WHITE,
            highlight_color: RgbColor::YELLOW,
            outline_color: RgbColor::BLACK,
            outline: 4,
            shadow: 2,
            margin_v: 320,
            animation: CaptionAnimation::Pop,
        }
    }

    pub fn minimal() -> Self {
        Self {
            font_name: "Helvetica".to_string(),
            font_size: 56,
            primary_color: RgbColor::WHITE,
            highlight_color: RgbColor::new(0x7F, 0xD6, 0xFF),
            outline_color: RgbColor::BLACK,
            outline: 2,
            shadow: 0,
            margin_v: 260,
            animation: CaptionAnimation::None,
        }
    }

    pub fn neon() -> Self {
        Self {
            font_name: "Impact".to_string(),
            font_size: 68,
            primary_color: RgbColor::new(0xF0, 0xF0, 0xFF),
            highlight_color: RgbColor::new(0x39, 0xFF, 0x14),
            outline_color: RgbColor::new(0xFF, 0x00, 0xC8),
            outline: 3,
            shadow: 3,
            margin_v: 300,
            animation: CaptionAnimation::Fade,
        }
    }

    /// Look up a preset by name (case-insensitive).
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "bold" => Some(Self::bold()),
            "minimal" => Some(Self::minimal()),
            "neon" => Some(Self::neon()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse_and_display() {
        let color: RgbColor = "#39ff14".parse().unwrap();
        assert_eq!(color, RgbColor::new(0x39, 0xFF, 0x14));
        assert_eq!(color.to_string(), "#39FF14");
        assert!("#12345".parse::<RgbColor>().is_err());
        assert!("zzzzzz".parse::<RgbColor>().is_err());
    }

    #[test]
    fn test_ass_color_is_bgr() {
        assert_eq!(RgbColor::new(0x11, 0x22, 0x33).to_ass(), "&H00332211");
    }

    #[test]
    fn test_presets_by_name() {
        for name in CaptionStyle::PRESETS {
            assert!(CaptionStyle::preset(name).is_some(), "{name}");
        }
        assert_eq!(CaptionStyle::preset("NEON"), Some(CaptionStyle::neon()));
        assert!(CaptionStyle::preset("comic").is_none());
    }

    #[test]
    fn test_partial_style_json_uses_defaults() {
        let style: CaptionStyle =
            serde_json::from_str(r##"{ "font_size": 40, "highlight_color": "#FF0000" }"##)
                .unwrap();
        assert_eq!(style.font_size, 40);
        assert_eq!(style.highlight_color, RgbColor::new(0xFF, 0, 0));
        assert_eq!(style.font_name, CaptionStyle::bold().font_name);
    }
}
