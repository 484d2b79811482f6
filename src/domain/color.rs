// Product color resolution
use std::fmt;

/// Vivid fallback used when nothing better is known, and in place of colors
/// too light to read on the dark gauge background.
pub const DEFAULT_COLOR: &str = "#2AA8FF";

const LIGHTNESS_LIMIT: u8 = 220;

/// Hex values the backend emits when a product has no real color.
const PLACEHOLDERS: &[&str] = &["#FFFFFF", "#000000", "#2E8B57"];

/// Checked before shorter prefixes, so "GASOLEO A" does not swallow "GASOLEO AGRICOLA".
const NAME_TABLE: &[(&str, &str)] = &[
    ("GASOLEO AGRICOLA", "#EF4444"),
    ("GASOLEO A", "#F59E0B"),
    ("GASOLEO B", "#EF4444"),
    ("GASOLEO C", "#3B82F6"),
    ("GASOLINA 95", "#22C55E"),
    ("GASOLINA 98", "#15803D"),
    ("ADBLUE", "#0EA5E9"),
    ("BIODIESEL", "#84CC16"),
    ("FUEL", "#A16207"),
];

/// Color candidates found on a record. Both are kept so a placeholder hex
/// does not hide a usable packed value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorSource {
    pub hex: Option<String>,
    pub packed: Option<i64>,
}

impl ColorSource {
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self {
            hex: Some(hex.into()),
            packed: None,
        }
    }

    pub fn from_packed(packed: i64) -> Self {
        Self {
            hex: None,
            packed: Some(packed),
        }
    }
}

/// A syntactically valid `#RRGGBB` color.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HexColor(String);

impl HexColor {
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(format!("#{:02X}{:02X}{:02X}", r, g, b))
    }

    /// Accepts `#RGB` and `#RRGGBB`, with or without the leading `#`.
    pub fn parse(input: &str) -> Option<Self> {
        let digits = input.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let expanded = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => digits.to_string(),
            _ => return None,
        };
        Some(Self(format!("#{}", expanded.to_ascii_uppercase())))
    }

    pub fn channels(&self) -> (u8, u8, u8) {
        let channel = |i: usize| u8::from_str_radix(&self.0[i..i + 2], 16).unwrap_or(0);
        (channel(1), channel(3), channel(5))
    }

    pub fn is_too_light(&self) -> bool {
        let (r, g, b) = self.channels();
        r > LIGHTNESS_LIMIT && g > LIGHTNESS_LIMIT && b > LIGHTNESS_LIMIT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn default_color() -> Self {
        Self(DEFAULT_COLOR.to_string())
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decode a packed integer color laid out as 0x00BBGGRR (low byte is red).
pub fn decode_packed(packed: i64) -> Option<HexColor> {
    if packed <= 0 {
        return None;
    }
    let n = packed & 0xFF_FFFF;
    let r = (n & 0xFF) as u8;
    let g = ((n >> 8) & 0xFF) as u8;
    let b = ((n >> 16) & 0xFF) as u8;
    Some(HexColor::from_rgb(r, g, b))
}

fn from_name(product_name: &str) -> Option<HexColor> {
    let upper = product_name.to_uppercase();
    NAME_TABLE
        .iter()
        .find(|(needle, _)| upper.contains(needle))
        .and_then(|(_, hex)| HexColor::parse(hex))
}

fn from_hex(raw: &str) -> Option<HexColor> {
    HexColor::parse(raw).filter(|c| !PLACEHOLDERS.contains(&c.as_str()))
}

/// Resolve the gauge color for a tank. Always yields a legible color.
pub fn color_for(source: &ColorSource, product_name: Option<&str>) -> HexColor {
    let resolved = source
        .hex
        .as_deref()
        .and_then(from_hex)
        .or_else(|| source.packed.and_then(decode_packed))
        .or_else(|| product_name.and_then(from_name))
        .unwrap_or_else(HexColor::default_color);

    if resolved.is_too_light() {
        HexColor::default_color()
    } else {
        resolved
    }
}
