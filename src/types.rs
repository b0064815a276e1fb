use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[serde(alias = "left")]
    Start,
    Center,
    #[serde(alias = "right")]
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };

    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.strip_prefix('#').unwrap_or(value);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        match hex.len() {
            6 => Some(Self {
                r: byte(0..2)?,
                g: byte(2..4)?,
                b: byte(4..6)?,
                a: 255,
            }),
            8 => Some(Self {
                r: byte(0..2)?,
                g: byte(2..4)?,
                b: byte(4..6)?,
                a: byte(6..8)?,
            }),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Color::from_hex(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid hex color {value:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_parses_six_digit_hex() {
        assert_eq!(Color::from_hex("#1f2f3f"), Some(Color::rgb(0x1f, 0x2f, 0x3f)));
        assert_eq!(Color::from_hex("FFFFFF"), Some(Color::WHITE));
    }

    #[test]
    fn color_parses_eight_digit_hex() {
        let color = Color::from_hex("#00ff0080").unwrap();
        assert_eq!((color.r, color.g, color.b, color.a), (0, 255, 0, 128));
    }

    #[test]
    fn color_rejects_malformed_hex() {
        assert_eq!(Color::from_hex(""), None);
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn color_round_trips_through_json() {
        let color = Color::rgb(0x10, 0x20, 0x30);
        let json = serde_json::to_string(&color).unwrap();
        assert_eq!(json, "\"#102030\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, color);
    }

    #[test]
    fn alignment_accepts_legacy_names() {
        let start: Alignment = serde_json::from_str("\"left\"").unwrap();
        let end: Alignment = serde_json::from_str("\"right\"").unwrap();
        let center: Alignment = serde_json::from_str("\"center\"").unwrap();
        assert_eq!(start, Alignment::Start);
        assert_eq!(end, Alignment::End);
        assert_eq!(center, Alignment::Center);
        assert_eq!(serde_json::to_string(&Alignment::Start).unwrap(), "\"start\"");
    }
}
