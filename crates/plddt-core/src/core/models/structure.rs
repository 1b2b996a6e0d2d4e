use super::atom::Atom;
use super::chain::{Chain, MolObject};
use super::ids::{AtomId, ChainId, ObjectId, ResidueId};
use super::residue::Residue;
use slotmap::SlotMap;
use std::collections::HashMap;

/// Every object, chain, residue and atom known to a scene.
///
/// Storage is slot-map based so IDs stay stable while objects are created
/// or removed between coloring passes.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    atoms: SlotMap<AtomId, Atom>,
    residues: SlotMap<ResidueId, Residue>,
    chains: SlotMap<ChainId, Chain>,
    objects: SlotMap<ObjectId, MolObject>,
    /// Lookup map for finding objects by name.
    object_name_map: HashMap<String, ObjectId>,
    /// Lookup map for finding chains by object and single-character identifier.
    chain_id_map: HashMap<(ObjectId, char), ChainId>,
    /// Lookup map for finding residues by chain and residue number.
    residue_id_map: HashMap<(ChainId, isize), ResidueId>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atoms.iter()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    pub fn residues_iter(&self) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.residues.iter()
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&MolObject> {
        self.objects.get(id)
    }

    pub fn objects_iter(&self) -> impl Iterator<Item = (ObjectId, &MolObject)> {
        self.objects.iter()
    }

    pub fn find_object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.object_name_map.get(name).copied()
    }

    pub fn find_chain(&self, object_id: ObjectId, id: char) -> Option<ChainId> {
        self.chain_id_map.get(&(object_id, id)).copied()
    }

    pub fn find_residue(&self, chain_id: ChainId, number: isize) -> Option<ResidueId> {
        self.residue_id_map.get(&(chain_id, number)).copied()
    }

    /// Adds an object, or returns the existing one with the same name.
    pub fn add_object(&mut self, name: &str) -> ObjectId {
        if let Some(id) = self.find_object_by_name(name) {
            return id;
        }
        let id = self.objects.insert(MolObject::new(name));
        self.object_name_map.insert(name.to_string(), id);
        id
    }

    pub fn add_chain(&mut self, object_id: ObjectId, id: char) -> Option<ChainId> {
        if let Some(existing) = self.find_chain(object_id, id) {
            return Some(existing);
        }
        let object = self.objects.get_mut(object_id)?;
        let chain_id = self.chains.insert(Chain::new(id, object_id));
        object.chains.push(chain_id);
        self.chain_id_map.insert((object_id, id), chain_id);
        Some(chain_id)
    }

    pub fn add_residue(&mut self, chain_id: ChainId, number: isize, name: &str) -> Option<ResidueId> {
        if let Some(existing) = self.find_residue(chain_id, number) {
            return Some(existing);
        }
        let chain = self.chains.get_mut(chain_id)?;
        let residue_id = self.residues.insert(Residue::new(number, name, chain_id));
        chain.residues.push(residue_id);
        self.residue_id_map.insert((chain_id, number), residue_id);
        Some(residue_id)
    }

    pub fn add_atom_to_residue(&mut self, residue_id: ResidueId, mut atom: Atom) -> Option<AtomId> {
        atom.residue_id = residue_id;
        let name = atom.name.clone();
        let residue = self.residues.get_mut(residue_id)?;
        let atom_id = self.atoms.insert(atom);
        residue.add_atom(&name, atom_id);
        Some(atom_id)
    }

    /// Removes an object together with all of its chains, residues and atoms.
    pub fn remove_object(&mut self, object_id: ObjectId) -> Option<MolObject> {
        let object = self.objects.remove(object_id)?;
        self.object_name_map.remove(&object.name);
        for &chain_id in &object.chains {
            let Some(chain) = self.chains.remove(chain_id) else {
                continue;
            };
            self.chain_id_map.remove(&(object_id, chain.id));
            for residue_id in chain.residues {
                if let Some(residue) = self.residues.remove(residue_id) {
                    self.residue_id_map.remove(&(chain_id, residue.number));
                    for atom_id in residue.atoms {
                        self.atoms.remove(atom_id);
                    }
                }
            }
        }
        Some(object)
    }

    /// Copies the given atoms, with their chain and residue hierarchy, into a
    /// new object named `name`, replacing any object of that name.
    ///
    /// Returns the IDs of the new atoms paired with the IDs they were copied from.
    pub fn copy_atoms_into(&mut self, name: &str, atoms: &[AtomId]) -> Vec<(AtomId, AtomId)> {
        if let Some(existing) = self.find_object_by_name(name) {
            self.remove_object(existing);
        }
        let object_id = self.add_object(name);
        let mut copied = Vec::with_capacity(atoms.len());
        for &source_id in atoms {
            let Some(source) = self.atoms.get(source_id).cloned() else {
                continue;
            };
            let Some((chain, residue)) = self.residue_context(source.residue_id) else {
                continue;
            };
            let (chain_char, res_number, res_name) = (chain.id, residue.number, residue.name.clone());
            let new_atom = self
                .add_chain(object_id, chain_char)
                .and_then(|c| self.add_residue(c, res_number, &res_name))
                .and_then(|r| self.add_atom_to_residue(r, source));
            if let Some(new_id) = new_atom {
                copied.push((new_id, source_id));
            }
        }
        copied
    }

    /// Chain and residue owning the given residue ID.
    pub fn residue_context(&self, residue_id: ResidueId) -> Option<(&Chain, &Residue)> {
        let residue = self.residues.get(residue_id)?;
        let chain = self.chains.get(residue.chain_id)?;
        Some((chain, residue))
    }

    /// Object, chain and residue owning the given atom.
    pub fn atom_context(&self, atom_id: AtomId) -> Option<(&MolObject, &Chain, &Residue)> {
        let atom = self.atoms.get(atom_id)?;
        let (chain, residue) = self.residue_context(atom.residue_id)?;
        let object = self.objects.get(chain.object_id)?;
        Some((object, chain, residue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn residue_with_atoms(structure: &mut Structure, object: &str) -> (ObjectId, ResidueId) {
        let object_id = structure.add_object(object);
        let chain_id = structure.add_chain(object_id, 'A').unwrap();
        let residue_id = structure.add_residue(chain_id, 1, "ALA").unwrap();
        let placeholder = residue_id;
        structure
            .add_atom_to_residue(residue_id, Atom::new(1, "N", placeholder, 80.0, 1.0))
            .unwrap();
        structure
            .add_atom_to_residue(residue_id, Atom::new(2, "CA", placeholder, 81.0, 1.0))
            .unwrap();
        (object_id, residue_id)
    }

    #[test]
    fn add_object_is_idempotent_by_name() {
        let mut s = Structure::new();
        let a = s.add_object("model");
        let b = s.add_object("model");
        assert_eq!(a, b);
        assert_eq!(s.objects_iter().count(), 1);
    }

    #[test]
    fn hierarchy_lookups_resolve() {
        let mut s = Structure::new();
        let (object_id, residue_id) = residue_with_atoms(&mut s, "model");
        let chain_id = s.find_chain(object_id, 'A').unwrap();
        assert_eq!(s.find_residue(chain_id, 1), Some(residue_id));
        let ca = s.residue(residue_id).unwrap().get_atom_id_by_name("CA").unwrap();
        let (object, chain, residue) = s.atom_context(ca).unwrap();
        assert_eq!(object.name, "model");
        assert_eq!(chain.id, 'A');
        assert_eq!(residue.name, "ALA");
    }

    #[test]
    fn add_chain_to_missing_object_returns_none() {
        let mut s = Structure::new();
        let object_id = s.add_object("tmp");
        s.remove_object(object_id);
        assert!(s.add_chain(object_id, 'A').is_none());
    }

    #[test]
    fn remove_object_drops_all_atoms() {
        let mut s = Structure::new();
        let (object_id, _) = residue_with_atoms(&mut s, "model");
        assert_eq!(s.atom_count(), 2);
        let removed = s.remove_object(object_id).unwrap();
        assert_eq!(removed.name, "model");
        assert_eq!(s.atom_count(), 0);
        assert!(s.find_object_by_name("model").is_none());
    }

    #[test]
    fn copy_atoms_into_replaces_existing_object() {
        let mut s = Structure::new();
        let (_, residue_id) = residue_with_atoms(&mut s, "model");
        let sources = s.residue(residue_id).unwrap().atoms().to_vec();

        let first = s.copy_atoms_into("patch", &sources);
        assert_eq!(first.len(), 2);
        assert_eq!(s.atom_count(), 4);

        let second = s.copy_atoms_into("patch", &sources[..1]);
        assert_eq!(second.len(), 1);
        assert_eq!(s.atom_count(), 3);
        let (new_id, source_id) = second[0];
        assert_eq!(s.atom(new_id).unwrap().name, s.atom(source_id).unwrap().name);
        let (object, _, _) = s.atom_context(new_id).unwrap();
        assert_eq!(object.name, "patch");
    }
}
