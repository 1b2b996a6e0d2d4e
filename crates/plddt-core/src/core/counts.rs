use super::confidence::{BinThresholds, BoundaryRule, ConfidenceBin};
use std::fmt;

/// Per-bin marker atom counts plus the number of catalytic marker atoms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinCounts {
    pub low: usize,
    pub mid: usize,
    pub high: usize,
    pub very_high: usize,
    pub catalytic: usize,
}

impl BinCounts {
    pub fn get(&self, bin: ConfidenceBin) -> usize {
        match bin {
            ConfidenceBin::Low => self.low,
            ConfidenceBin::Mid => self.mid,
            ConfidenceBin::High => self.high,
            ConfidenceBin::VeryHigh => self.very_high,
        }
    }

    pub fn get_mut(&mut self, bin: ConfidenceBin) -> &mut usize {
        match bin {
            ConfidenceBin::Low => &mut self.low,
            ConfidenceBin::Mid => &mut self.mid,
            ConfidenceBin::High => &mut self.high,
            ConfidenceBin::VeryHigh => &mut self.very_high,
        }
    }

    /// Number of binned atoms; the catalytic count overlaps the bins and is excluded.
    pub fn total(&self) -> usize {
        self.low + self.mid + self.high + self.very_high
    }
}

/// The one-line report printed after a coloring pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub scope: String,
    pub marker_atom: String,
    pub thresholds: BinThresholds,
    pub rule: BoundaryRule,
    pub cutoff: f64,
    pub counts: BinCounts,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[pLDDT] {} counts in '{}': ",
            self.marker_atom, self.scope
        )?;
        for bin in ConfidenceBin::ALL {
            write!(
                f,
                "{}={}, ",
                bin.label(&self.thresholds, self.rule),
                self.counts.get(bin)
            )?;
        }
        write!(
            f,
            "catalytic (q > {:?})={}",
            self.cutoff, self.counts.catalytic
        )
    }
}
