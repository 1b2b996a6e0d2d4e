//! # Core Models Module
//!
//! Scene-side data structures for the atoms a coloring pass reads: named
//! objects, their chains, residues and atoms, each atom carrying the
//! B-factor (pLDDT) and occupancy (catalytic marker) columns.
//!
//! - [`structure`] - Slot-map backed storage with name and number lookups
//! - [`builder`] - Incremental construction in record order
//! - [`atom`], [`residue`], [`chain`] - The individual records
//! - [`ids`] - Stable identifier types

pub mod atom;
pub mod builder;
pub mod chain;
pub mod ids;
pub mod residue;
pub mod structure;
