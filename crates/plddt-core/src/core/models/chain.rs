use super::ids::{ObjectId, ResidueId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub id: char,                        // Chain identifier (e.g., 'A', 'B')
    pub object_id: ObjectId,             // Object the chain belongs to
    pub(crate) residues: Vec<ResidueId>, // Ordered list of residue IDs belonging to this chain
}

impl Chain {
    pub(crate) fn new(id: char, object_id: ObjectId) -> Self {
        Self {
            id,
            object_id,
            residues: Vec::new(),
        }
    }

    pub fn residues(&self) -> &[ResidueId] {
        &self.residues
    }
}

/// A named molecular object loaded into the scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MolObject {
    pub name: String,
    pub(crate) chains: Vec<super::ids::ChainId>,
}

impl MolObject {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            chains: Vec::new(),
        }
    }

    pub fn chains(&self) -> &[super::ids::ChainId] {
        &self.chains
    }
}
