//! Length-unit detection from STEP text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A document length unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LengthUnit {
    Millimetre,
    Centimetre,
    Decimetre,
    Metre,
    Kilometre,
    Inch,
    Foot,
    Yard,
    Mile,
    /// A conversion-based length unit with an unrecognised name (lowercased).
    Other(String),
}

impl LengthUnit {
    pub fn symbol(&self) -> &str {
        match self {
            LengthUnit::Millimetre => "mm",
            LengthUnit::Centimetre => "cm",
            LengthUnit::Decimetre => "dm",
            LengthUnit::Metre => "m",
            LengthUnit::Kilometre => "km",
            LengthUnit::Inch => "in",
            LengthUnit::Foot => "ft",
            LengthUnit::Yard => "yd",
            LengthUnit::Mile => "mi",
            LengthUnit::Other(name) => name,
        }
    }

    /// Size of one unit in millimetres, unknown for `Other`.
    pub fn millimetres(&self) -> Option<f64> {
        Some(match self {
            LengthUnit::Millimetre => 1.0,
            LengthUnit::Centimetre => 10.0,
            LengthUnit::Decimetre => 100.0,
            LengthUnit::Metre => 1000.0,
            LengthUnit::Kilometre => 1_000_000.0,
            LengthUnit::Inch => 25.4,
            LengthUnit::Foot => 304.8,
            LengthUnit::Yard => 914.4,
            LengthUnit::Mile => 1_609_344.0,
            LengthUnit::Other(_) => return None,
        })
    }

    fn from_conversion_name(name: &str) -> Self {
        match name {
            "INCH" => LengthUnit::Inch,
            "FOOT" => LengthUnit::Foot,
            "YARD" => LengthUnit::Yard,
            "MILE" => LengthUnit::Mile,
            other => LengthUnit::Other(other.to_ascii_lowercase()),
        }
    }

    fn from_si_prefix(prefix: &str) -> Self {
        match prefix {
            "MILLI" => LengthUnit::Millimetre,
            "CENTI" => LengthUnit::Centimetre,
            "DECI" => LengthUnit::Decimetre,
            "KILO" => LengthUnit::Kilometre,
            _ => LengthUnit::Metre,
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for LengthUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "mm" | "millimetre" | "millimeter" => LengthUnit::Millimetre,
            "cm" | "centimetre" | "centimeter" => LengthUnit::Centimetre,
            "dm" | "decimetre" | "decimeter" => LengthUnit::Decimetre,
            "m" | "metre" | "meter" => LengthUnit::Metre,
            "km" | "kilometre" | "kilometer" => LengthUnit::Kilometre,
            "in" | "inch" => LengthUnit::Inch,
            "ft" | "foot" => LengthUnit::Foot,
            "yd" | "yard" => LengthUnit::Yard,
            "mi" | "mile" => LengthUnit::Mile,
            other => return Err(format!("unknown length unit {other:?}")),
        })
    }
}

// Units travel as their symbol.
impl Serialize for LengthUnit {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.symbol().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LengthUnit {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        Ok(symbol
            .parse()
            .unwrap_or_else(|_| LengthUnit::Other(symbol.to_ascii_lowercase())))
    }
}

/// Detected document unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitInfo {
    pub unit: LengthUnit,
    /// Millimetres per document unit (1 when unknown).
    pub scale: f64,
}

impl UnitInfo {
    pub fn new(unit: LengthUnit) -> Self {
        let scale = unit.millimetres().unwrap_or(1.0);
        Self { unit, scale }
    }

    /// Factor turning a length in document units into `display` units.
    pub fn scale_to(&self, display: &LengthUnit) -> f64 {
        self.scale / display.millimetres().unwrap_or(1.0)
    }
}

impl Default for UnitInfo {
    fn default() -> Self {
        Self::new(LengthUnit::Millimetre)
    }
}

/// Detect the document length unit.
///
/// In order of precedence: a conversion-based length unit (`INCH`, `FOOT`,
/// ...), a prefixed SI metre, a bare SI metre. Files declaring none are
/// taken to be in millimetres.
pub fn detect_length_unit(step_text: &str) -> UnitInfo {
    let upper = step_text.to_ascii_uppercase();
    let unit = conversion_based_length(&upper)
        .or_else(|| si_metre(&upper))
        .unwrap_or(LengthUnit::Millimetre);
    UnitInfo::new(unit)
}

/// `CONVERSION_BASED_UNIT('NAME', ...)` inside an entity that is also a
/// `LENGTH_UNIT`. Angle units such as `'DEGREE'` are skipped.
fn conversion_based_length(upper: &str) -> Option<LengthUnit> {
    const KEY: &str = "CONVERSION_BASED_UNIT";
    for (at, _) in upper.match_indices(KEY) {
        let mut cursor = Cursor::new(upper, at + KEY.len());
        if !cursor.eat('(') || !cursor.eat('\'') {
            continue;
        }
        let Some(name) = cursor.word() else { continue };
        if !cursor.eat_tight('\'') {
            continue;
        }
        if entity_around(upper, at).contains("LENGTH_UNIT") {
            return Some(LengthUnit::from_conversion_name(name));
        }
    }
    None
}

/// `SI_UNIT(.PREFIX., .METRE.)` first, then `SI_UNIT($, .METRE.)`.
fn si_metre(upper: &str) -> Option<LengthUnit> {
    const KEY: &str = "SI_UNIT";
    let mut bare = false;
    for (at, _) in upper.match_indices(KEY) {
        let mut cursor = Cursor::new(upper, at + KEY.len());
        if !cursor.eat('(') {
            continue;
        }
        if cursor.eat('$') {
            if cursor.eat(',') && cursor.enum_value() == Some("METRE") && cursor.eat(')') {
                bare = true;
            }
            continue;
        }
        let Some(prefix) = cursor.enum_value() else { continue };
        if cursor.eat(',') && cursor.enum_value() == Some("METRE") && cursor.eat(')') {
            return Some(LengthUnit::from_si_prefix(prefix));
        }
    }
    bare.then_some(LengthUnit::Metre)
}

/// The entity text containing `at`, between the surrounding semicolons.
fn entity_around(text: &str, at: usize) -> &str {
    let start = text[..at].rfind(';').map_or(0, |i| i + 1);
    let end = text[at..].find(';').map_or(text.len(), |i| at + i);
    &text[start..end]
}

/// Token reader over ASCII STEP text.
struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str, pos: usize) -> Self {
        Self { text, pos }
    }

    fn skip_ws(&mut self) {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Skip whitespace, then consume `c` if it is next.
    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        self.eat_tight(c)
    }

    fn eat_tight(&mut self, c: char) -> bool {
        if self.text[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// A run of `[A-Z0-9_]`.
    fn word(&mut self) -> Option<&'a str> {
        let rest = &self.text[self.pos..];
        let len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    /// `.NAME.`
    fn enum_value(&mut self) -> Option<&'a str> {
        if !self.eat('.') {
            return None;
        }
        let word = self.word()?;
        self.eat_tight('.').then_some(word)
    }
}
