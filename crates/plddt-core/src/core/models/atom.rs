use super::ids::ResidueId;

/// An atom as seen by the coloring logic: identity plus the two scalar
/// columns the classifier reads.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Serial number from the source record, unique within its object.
    pub serial: usize,
    /// The name of the atom (e.g., "CA", "N", "O").
    pub name: String,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// Temperature factor column; holds the pLDDT confidence for predicted models.
    pub b_factor: f64,
    /// Occupancy column; reused as the catalytic marker score.
    pub occupancy: f64,
}

impl Atom {
    pub fn new(serial: usize, name: &str, residue_id: ResidueId, b_factor: f64, occupancy: f64) -> Self {
        Self {
            serial,
            name: name.to_string(),
            residue_id,
            b_factor,
            occupancy,
        }
    }
}
