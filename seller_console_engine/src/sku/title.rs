//! Best-effort attribute extraction from free-text listing titles.
//!
//! All three parsers are pure and total; a title that matches nothing yields the `"Unknown"` / empty sentinel and
//! never an error. They do not need to agree with each other — each is consulted independently as a fallback when the
//! cost table has no variant data for an MPN.
use regex::Regex;

/// Ordered (pattern, canonical name) pairs. Order encodes specificity: `rose gold` must be tested before the generic
/// `gold`, `blush pink` before `pink`, and both `space gray` spellings normalize to one canonical name.
const COLORS: [(&str, &str); 18] = [
    ("rose gold", "Rose Gold"),
    ("jet black", "Jet Black"),
    ("space gray", "Space Gray"),
    ("space grey", "Space Gray"),
    ("blush pink", "Pink"),
    ("midnight", "Midnight"),
    ("starlight", "Starlight"),
    ("silver", "Silver"),
    ("pink", "Pink"),
    ("gold", "Gold"),
    ("blue", "Blue"),
    ("red", "Red"),
    ("green", "Green"),
    ("graphite", "Graphite"),
    ("black", "Black"),
    ("white", "White"),
    ("titanium", "Titanium"),
    ("natural", "Natural"),
];

/// Tokens that indicate a cellular-capable radio. Checked before the GPS token because cellular variants always also
/// mention GPS in marketing copy and must not be misclassified.
const CELLULAR_TOKENS: [&str; 4] = ["cellular", "cell", "gps + cel", "lte"];

pub fn parse_color(title: &str) -> String {
    let lower = title.to_lowercase();
    for (pattern, canonical) in COLORS {
        if lower.contains(pattern) {
            return canonical.to_string();
        }
    }
    "Unknown".to_string()
}

/// Case sizes look like `44mm`, possibly with whitespace before the unit. Empty string when absent.
pub fn parse_size(title: &str) -> String {
    Regex::new(r"(?i)(\d{2})\s*mm")
        .expect("valid regex")
        .captures(title)
        .and_then(|c| c.get(1).map(|m| format!("{}mm", m.as_str())))
        .unwrap_or_default()
}

pub fn parse_connectivity(title: &str) -> String {
    let lower = title.to_lowercase();
    if CELLULAR_TOKENS.iter().any(|t| lower.contains(t)) {
        return "Cell".to_string();
    }
    if lower.contains("gps") {
        return "GPS".to_string();
    }
    String::new()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn specific_colors_beat_generic_ones() {
        assert_eq!(parse_color("Apple Watch Rose Gold 42mm GPS"), "Rose Gold");
        assert_eq!(parse_color("iPhone 13 Blush Pink"), "Pink");
        assert_eq!(parse_color("Space Grey 46mm"), "Space Gray");
        assert_eq!(parse_color("Gold aluminum case"), "Gold");
        assert_eq!(parse_color("Boring beige thing"), "Unknown");
    }

    #[test]
    fn sizes_match_with_or_without_whitespace() {
        assert_eq!(parse_size("Apple Watch SE 44mm GPS"), "44mm");
        assert_eq!(parse_size("Apple Watch SE 42 mm Silver"), "42mm");
        assert_eq!(parse_size("no size here"), "");
    }

    #[test]
    fn cellular_is_detected_before_gps() {
        assert_eq!(parse_connectivity("iPhone 13 Cellular"), "Cell");
        assert_eq!(parse_connectivity("Watch 44mm GPS + Cel LTE"), "Cell");
        assert_eq!(parse_connectivity("GPS only model"), "GPS");
        assert_eq!(parse_connectivity("no radio info"), "");
    }
}
