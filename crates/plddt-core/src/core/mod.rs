//! # Core Module
//!
//! Stateless building blocks of a confidence coloring pass.
//!
//! - **Classification** ([`confidence`]) - Score to bin mapping, boundary rules, catalytic test
//! - **Reporting** ([`counts`]) - Per-bin counts and the one-line summary
//! - **Colors** ([`palette`]) - Host color values, default scheme, residue charge classes
//! - **Predicates** ([`selection`]) - Typed selection expressions rendered in host syntax
//! - **Scene data** ([`models`], [`io`]) - Atom hierarchy and the exported atom table reader

pub mod confidence;
pub mod counts;
pub mod io;
pub mod models;
pub mod palette;
pub mod selection;
