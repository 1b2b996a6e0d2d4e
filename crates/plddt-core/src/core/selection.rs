//! Typed atom selection predicates.
//!
//! Predicates are built as a small expression tree and rendered to the host's
//! selection language through [`std::fmt::Display`], so the coloring pass never
//! concatenates selection strings by hand.

use super::confidence::Bound;
use std::fmt;

/// A numeric per-atom field a predicate can compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomField {
    /// Temperature factor column, carrying the pLDDT confidence.
    BFactor,
    /// Occupancy column, carrying the catalytic marker score.
    Occupancy,
}

impl AtomField {
    pub fn keyword(self) -> &'static str {
        match self {
            AtomField::BFactor => "b",
            AtomField::Occupancy => "q",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Equal,
}

impl Comparison {
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Less => lhs < rhs,
            Comparison::LessOrEqual => lhs <= rhs,
            Comparison::Greater => lhs > rhs,
            Comparison::GreaterOrEqual => lhs >= rhs,
            Comparison::Equal => lhs == rhs,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// A scope expression handed over verbatim by the caller (`all`, `chain A`, an object name).
    Scope(String),
    /// A selection or object previously created in the host by name.
    Named(String),
    AtomName(String),
    ResidueNames(Vec<String>),
    Compare {
        field: AtomField,
        op: Comparison,
        value: f64,
    },
    And(Box<Selection>, Box<Selection>),
    Or(Box<Selection>, Box<Selection>),
    Not(Box<Selection>),
    /// Expands the inner selection to every atom of any residue it touches.
    ByResidue(Box<Selection>),
}

impl Selection {
    pub fn scope(expr: &str) -> Self {
        Selection::Scope(expr.trim().to_string())
    }

    pub fn named(name: &str) -> Self {
        Selection::Named(name.to_string())
    }

    pub fn atom_name(name: &str) -> Self {
        Selection::AtomName(name.to_string())
    }

    pub fn residue_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::ResidueNames(names.into_iter().map(Into::into).collect())
    }

    pub fn compare(field: AtomField, op: Comparison, value: f64) -> Self {
        Selection::Compare { field, op, value }
    }

    pub fn and(self, other: Selection) -> Self {
        Selection::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Selection) -> Self {
        Selection::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Selection::Not(Box::new(self))
    }

    pub fn by_residue(self) -> Self {
        Selection::ByResidue(Box::new(self))
    }

    /// Predicate admitting values of `field` that lie between the given edges.
    ///
    /// Both edges absent yields a comparison that every finite value passes.
    pub fn within(field: AtomField, lower: Option<Bound>, upper: Option<Bound>) -> Self {
        let lower = lower.map(|b| {
            let op = if b.inclusive {
                Comparison::GreaterOrEqual
            } else {
                Comparison::Greater
            };
            Selection::compare(field, op, b.value)
        });
        let upper = upper.map(|b| {
            let op = if b.inclusive {
                Comparison::LessOrEqual
            } else {
                Comparison::Less
            };
            Selection::compare(field, op, b.value)
        });
        match (lower, upper) {
            (Some(l), Some(u)) => l.and(u),
            (Some(l), None) => l,
            (None, Some(u)) => u,
            (None, None) => Selection::compare(field, Comparison::Greater, f64::NEG_INFINITY),
        }
    }
}

fn write_compare(f: &mut fmt::Formatter<'_>, field: AtomField, op: Comparison, value: f64) -> fmt::Result {
    let kw = field.keyword();
    // The host grammar has no compound operators.
    match op {
        Comparison::Less => write!(f, "{} < {:?}", kw, value),
        Comparison::Greater => write!(f, "{} > {:?}", kw, value),
        Comparison::Equal => write!(f, "{} = {:?}", kw, value),
        Comparison::GreaterOrEqual => write!(f, "({kw} > {value:?} or {kw} = {value:?})"),
        Comparison::LessOrEqual => write!(f, "({kw} < {value:?} or {kw} = {value:?})"),
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Scope(expr) => write!(f, "({})", expr),
            Selection::Named(name) => f.write_str(name),
            Selection::AtomName(name) => write!(f, "name {}", name),
            Selection::ResidueNames(names) => write!(f, "resn {}", names.join("+")),
            Selection::Compare { field, op, value } => write_compare(f, *field, *op, *value),
            Selection::And(a, b) => write!(f, "{} and {}", a, b),
            Selection::Or(a, b) => write!(f, "({} or {})", a, b),
            Selection::Not(inner) => write!(f, "not ({})", inner),
            Selection::ByResidue(inner) => write!(f, "byres ({})", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bin_predicate_renders_in_host_syntax() {
        let sel = Selection::scope("all")
            .and(Selection::atom_name("CA"))
            .and(Selection::within(
                AtomField::BFactor,
                Some(Bound {
                    value: 50.0,
                    inclusive: true,
                }),
                Some(Bound {
                    value: 70.0,
                    inclusive: false,
                }),
            ));
        assert_eq!(
            sel.to_string(),
            "(all) and name CA and (b > 50.0 or b = 50.0) and b < 70.0"
        );
    }

    #[test]
    fn by_residue_and_residue_names_render() {
        let sel = Selection::named("plddt_low_ca").by_residue();
        assert_eq!(sel.to_string(), "byres (plddt_low_ca)");
        let sel = Selection::scope("chain A").and(Selection::residue_names(["ASP", "GLU"]));
        assert_eq!(sel.to_string(), "(chain A) and resn ASP+GLU");
    }

    #[test]
    fn negation_and_disjunction_are_parenthesized() {
        let sel = Selection::residue_names(["LYS"])
            .or(Selection::residue_names(["ASP"]))
            .negate();
        assert_eq!(sel.to_string(), "not ((resn LYS or resn ASP))");
    }

    #[test]
    fn occupancy_comparison_uses_q_keyword() {
        let sel = Selection::compare(AtomField::Occupancy, Comparison::Greater, 9.0);
        assert_eq!(sel.to_string(), "q > 9.0");
        assert!(Comparison::Greater.holds(9.1, 9.0));
        assert!(!Comparison::Greater.holds(9.0, 9.0));
    }
}
