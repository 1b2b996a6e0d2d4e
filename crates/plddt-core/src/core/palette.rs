use super::confidence::ConfidenceBin;
use phf::{Map, phf_map};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Color names every host is expected to know, with their RGB components.
pub static BUILTIN_COLORS: Map<&'static str, [f64; 3]> = phf_map! {
    "red" => [1.0, 0.0, 0.0],
    "yellow" => [1.0, 1.0, 0.0],
    "cyan" => [0.0, 1.0, 1.0],
    "blue" => [0.0, 0.0, 1.0],
    "white" => [1.0, 1.0, 1.0],
    "grey" => [0.5, 0.5, 0.5],
    "green" => [0.0, 1.0, 0.0],
    "magenta" => [1.0, 0.0, 1.0],
    "orange" => [1.0, 0.5, 0.0],
    "black" => [0.0, 0.0, 0.0],
};

/// Net side-chain charge at neutral pH, used as the surface electrostatics proxy.
static RESIDUE_CHARGE: Map<&'static str, i8> = phf_map! {
    "ASP" => -1,
    "GLU" => -1,
    "LYS" => 1,
    "ARG" => 1,
    "HIP" => 1,
    "HSP" => 1,
};

/// Coarse charge class of a residue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChargeClass {
    Acidic,
    Basic,
    Neutral,
}

impl ChargeClass {
    pub const ALL: [ChargeClass; 3] = [ChargeClass::Acidic, ChargeClass::Basic, ChargeClass::Neutral];

    pub fn of_residue(residue_name: &str) -> Self {
        match RESIDUE_CHARGE.get(residue_name.to_ascii_uppercase().as_str()) {
            Some(q) if *q < 0 => ChargeClass::Acidic,
            Some(q) if *q > 0 => ChargeClass::Basic,
            _ => ChargeClass::Neutral,
        }
    }

    /// Residue names belonging to this class; empty for the neutral remainder.
    pub fn residue_names(self) -> Vec<&'static str> {
        let mut names: Vec<_> = RESIDUE_CHARGE
            .entries()
            .filter(|(name, _)| ChargeClass::of_residue(name) == self && self != ChargeClass::Neutral)
            .map(|(name, _)| *name)
            .collect();
        names.sort_unstable();
        names
    }
}

#[derive(Debug, Error, PartialEq, Clone)]
#[error("RGB components must lie in [0, 1], got {0:?}")]
pub struct InvalidRgb(pub [f64; 3]);

/// An RGB triple with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 3]", into = "[f64; 3]")]
pub struct Rgb([f64; 3]);

impl Rgb {
    pub fn new(components: [f64; 3]) -> Result<Self, InvalidRgb> {
        if components
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
        {
            Ok(Self(components))
        } else {
            Err(InvalidRgb(components))
        }
    }

    pub fn components(&self) -> [f64; 3] {
        self.0
    }

    /// Host hex notation, e.g. `0xff8000`.
    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.0.map(|c| (c * 255.0).round() as u8);
        format!("0x{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl TryFrom<[f64; 3]> for Rgb {
    type Error = InvalidRgb;

    fn try_from(value: [f64; 3]) -> Result<Self, Self::Error> {
        Rgb::new(value)
    }
}

impl From<Rgb> for [f64; 3] {
    fn from(value: Rgb) -> Self {
        value.0
    }
}

/// A color as understood by the host: a registered name or a literal RGB value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    Named(String),
    Rgb(Rgb),
}

impl Color {
    pub fn named(name: &str) -> Self {
        Color::Named(name.to_string())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Named(name) => f.write_str(name),
            Color::Rgb(rgb) => f.write_str(&rgb.to_hex()),
        }
    }
}

/// Colors applied by a coloring pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub low: Color,
    pub mid: Color,
    pub high: Color,
    pub very_high: Color,
    /// Registered under a custom name and used for catalytic spheres.
    pub catalytic: Rgb,
    /// Registered under a custom name and used for the opaque catalytic surface patch.
    pub patch: Rgb,
    pub acidic: Color,
    pub basic: Color,
    pub neutral: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            low: Color::named("red"),
            mid: Color::named("yellow"),
            high: Color::named("cyan"),
            very_high: Color::named("blue"),
            catalytic: Rgb([1.0, 0.0, 1.0]),
            patch: Rgb([1.0, 0.5, 0.0]),
            acidic: Color::named("red"),
            basic: Color::named("blue"),
            neutral: Color::named("white"),
        }
    }
}

impl Palette {
    pub fn for_bin(&self, bin: ConfidenceBin) -> &Color {
        match bin {
            ConfidenceBin::Low => &self.low,
            ConfidenceBin::Mid => &self.mid,
            ConfidenceBin::High => &self.high,
            ConfidenceBin::VeryHigh => &self.very_high,
        }
    }

    pub fn for_charge(&self, class: ChargeClass) -> &Color {
        match class {
            ChargeClass::Acidic => &self.acidic,
            ChargeClass::Basic => &self.basic,
            ChargeClass::Neutral => &self.neutral,
        }
    }
}
