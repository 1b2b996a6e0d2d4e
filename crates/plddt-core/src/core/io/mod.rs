//! Loading scene structures from host exports.
//!
//! Structure file formats (PDB, mmCIF) are parsed by the host; this module only
//! reads the flat per-atom attribute table a host can export alongside them.

pub mod atom_table;
pub mod traits;
