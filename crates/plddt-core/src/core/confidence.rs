use super::counts::BinCounts;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default pLDDT boundaries separating the four confidence bins.
pub const DEFAULT_THRESHOLDS: [f64; 3] = [50.0, 70.0, 90.0];

/// Default occupancy cutoff above which an atom is considered catalytic.
pub const DEFAULT_CATALYTIC_CUTOFF: f64 = 9.0;

/// One of the four confidence categories over the pLDDT domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfidenceBin {
    Low,
    Mid,
    High,
    VeryHigh,
}

impl ConfidenceBin {
    /// All bins in ascending score order.
    pub const ALL: [ConfidenceBin; 4] = [
        ConfidenceBin::Low,
        ConfidenceBin::Mid,
        ConfidenceBin::High,
        ConfidenceBin::VeryHigh,
    ];

    /// Short identifier used in temporary selection names and config keys.
    pub fn key(self) -> &'static str {
        match self {
            ConfidenceBin::Low => "low",
            ConfidenceBin::Mid => "mid",
            ConfidenceBin::High => "high",
            ConfidenceBin::VeryHigh => "veryhigh",
        }
    }

    /// Human-readable range label, e.g. `<50` or `50-70`.
    ///
    /// The open ends carry the inclusivity of the active rule so the summary
    /// line states which side a boundary value was counted on.
    pub fn label(self, thresholds: &BinThresholds, rule: BoundaryRule) -> String {
        let [t1, t2, t3] = thresholds.values();
        match (self, rule) {
            (ConfidenceBin::Low, BoundaryRule::UpperInclusive) => format!("<{}", t1),
            (ConfidenceBin::Low, BoundaryRule::LowerInclusive) => format!("<={}", t1),
            (ConfidenceBin::Mid, _) => format!("{}-{}", t1, t2),
            (ConfidenceBin::High, _) => format!("{}-{}", t2, t3),
            (ConfidenceBin::VeryHigh, BoundaryRule::UpperInclusive) => format!(">={}", t3),
            (ConfidenceBin::VeryHigh, BoundaryRule::LowerInclusive) => format!(">{}", t3),
        }
    }
}

impl fmt::Display for ConfidenceBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfidenceBin::Low => "low",
            ConfidenceBin::Mid => "mid",
            ConfidenceBin::High => "high",
            ConfidenceBin::VeryHigh => "very_high",
        };
        f.write_str(name)
    }
}

/// Which side of a threshold a score exactly equal to it is assigned to.
///
/// The two variants are distinct products: a pass always runs under exactly
/// one of them and the summary labels say which.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryRule {
    /// `b < 50`, `50 <= b < 70`, `70 <= b < 90`, `b >= 90`.
    #[default]
    UpperInclusive,
    /// `b <= 50`, `50 < b <= 70`, `70 < b <= 90`, `b > 90`.
    LowerInclusive,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("Unknown boundary rule '{0}'. Expected 'upper-inclusive' or 'lower-inclusive'.")]
pub struct ParseBoundaryRuleError(pub String);

impl FromStr for BoundaryRule {
    type Err = ParseBoundaryRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upper-inclusive" | "upper" => Ok(BoundaryRule::UpperInclusive),
            "lower-inclusive" | "lower" => Ok(BoundaryRule::LowerInclusive),
            _ => Err(ParseBoundaryRuleError(s.to_string())),
        }
    }
}

impl fmt::Display for BoundaryRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryRule::UpperInclusive => f.write_str("upper-inclusive"),
            BoundaryRule::LowerInclusive => f.write_str("lower-inclusive"),
        }
    }
}

/// A single edge of a bin interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub value: f64,
    pub inclusive: bool,
}

impl Bound {
    fn admits_above(&self, b: f64) -> bool {
        if self.inclusive {
            b >= self.value
        } else {
            b > self.value
        }
    }

    fn admits_below(&self, b: f64) -> bool {
        if self.inclusive {
            b <= self.value
        } else {
            b < self.value
        }
    }
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ThresholdError {
    #[error("Bin thresholds must be finite, got {0:?}")]
    NotFinite([f64; 3]),
    #[error("Bin thresholds must be strictly ascending, got {0:?}")]
    NotAscending([f64; 3]),
}

/// The three boundaries that split the score domain into four bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinThresholds([f64; 3]);

impl Default for BinThresholds {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLDS)
    }
}

impl BinThresholds {
    pub fn new(values: [f64; 3]) -> Result<Self, ThresholdError> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ThresholdError::NotFinite(values));
        }
        if !(values[0] < values[1] && values[1] < values[2]) {
            return Err(ThresholdError::NotAscending(values));
        }
        Ok(Self(values))
    }

    pub fn values(&self) -> [f64; 3] {
        self.0
    }

    /// Lower and upper edges of `bin`; `None` marks an unbounded side.
    pub fn bounds(&self, bin: ConfidenceBin, rule: BoundaryRule) -> (Option<Bound>, Option<Bound>) {
        let [t1, t2, t3] = self.0;
        // Under the upper-inclusive rule a bin owns its lower edge, otherwise its upper edge.
        let upper_owned = rule == BoundaryRule::UpperInclusive;
        let lower = |value| Bound {
            value,
            inclusive: upper_owned,
        };
        let upper = |value| Bound {
            value,
            inclusive: !upper_owned,
        };
        match bin {
            ConfidenceBin::Low => (None, Some(upper(t1))),
            ConfidenceBin::Mid => (Some(lower(t1)), Some(upper(t2))),
            ConfidenceBin::High => (Some(lower(t2)), Some(upper(t3))),
            ConfidenceBin::VeryHigh => (Some(lower(t3)), None),
        }
    }

    /// Whether `b` falls inside `bin` under `rule`.
    pub fn contains(&self, bin: ConfidenceBin, rule: BoundaryRule, b: f64) -> bool {
        let (lower, upper) = self.bounds(bin, rule);
        lower.is_none_or(|l| l.admits_above(b)) && upper.is_none_or(|u| u.admits_below(b))
    }

    /// Maps a confidence score to its bin. Returns `None` only for NaN.
    pub fn classify(&self, b: f64, rule: BoundaryRule) -> Option<ConfidenceBin> {
        if b.is_nan() {
            return None;
        }
        let [t1, t2, t3] = self.0;
        let bin = match rule {
            BoundaryRule::UpperInclusive => {
                if b < t1 {
                    ConfidenceBin::Low
                } else if b < t2 {
                    ConfidenceBin::Mid
                } else if b < t3 {
                    ConfidenceBin::High
                } else {
                    ConfidenceBin::VeryHigh
                }
            }
            BoundaryRule::LowerInclusive => {
                if b <= t1 {
                    ConfidenceBin::Low
                } else if b <= t2 {
                    ConfidenceBin::Mid
                } else if b <= t3 {
                    ConfidenceBin::High
                } else {
                    ConfidenceBin::VeryHigh
                }
            }
        };
        Some(bin)
    }
}

/// `true` when the marker score strictly exceeds the cutoff.
#[inline]
pub fn is_catalytic(marker: f64, cutoff: f64) -> bool {
    marker > cutoff
}

/// Aggregates `(confidence, marker)` pairs into bin and catalytic counts.
///
/// Records whose confidence is NaN are not binned but still contribute to the
/// catalytic count.
pub fn tally<I>(records: I, thresholds: &BinThresholds, rule: BoundaryRule, cutoff: f64) -> BinCounts
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut counts = BinCounts::default();
    for (confidence, marker) in records {
        if let Some(bin) = thresholds.classify(confidence, rule) {
            *counts.get_mut(bin) += 1;
        }
        if is_catalytic(marker, cutoff) {
            counts.catalytic += 1;
        }
    }
    counts
}
