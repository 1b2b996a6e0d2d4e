use super::atom::Atom;
use super::ids::{ChainId, ObjectId, ResidueId};
use super::structure::Structure;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Must start an object before starting a chain")]
    NoObject,
    #[error("Must start a chain before starting a residue")]
    NoChain,
    #[error("Cannot add atom '{0}' without a current residue")]
    NoResidue(String),
}

/// Incrementally assembles a [`Structure`] from records arriving in file order.
#[derive(Default)]
pub struct StructureBuilder {
    structure: Structure,
    current_object: Option<ObjectId>,
    current_chain: Option<ChainId>,
    current_residue: Option<ResidueId>,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_object(&mut self, name: &str) -> &mut Self {
        self.current_object = Some(self.structure.add_object(name));
        self.current_chain = None;
        self.current_residue = None;
        self
    }

    pub fn start_chain(&mut self, id: char) -> Result<&mut Self, BuildError> {
        let object_id = self.current_object.ok_or(BuildError::NoObject)?;
        self.current_chain = self.structure.add_chain(object_id, id);
        self.current_residue = None;
        Ok(self)
    }

    pub fn start_residue(&mut self, number: isize, name: &str) -> Result<&mut Self, BuildError> {
        let chain_id = self.current_chain.ok_or(BuildError::NoChain)?;
        self.current_residue = self.structure.add_residue(chain_id, number, name);
        Ok(self)
    }

    pub fn add_atom(
        &mut self,
        serial: usize,
        name: &str,
        b_factor: f64,
        occupancy: f64,
    ) -> Result<&mut Self, BuildError> {
        let residue_id = self
            .current_residue
            .ok_or_else(|| BuildError::NoResidue(name.to_string()))?;
        self.structure
            .add_atom_to_residue(residue_id, Atom::new(serial, name, residue_id, b_factor, occupancy));
        Ok(self)
    }

    pub fn build(self) -> Structure {
        self.structure
    }
}
