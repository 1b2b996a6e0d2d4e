//! # pLDDT Paint Core Library
//!
//! Bins protein residues into confidence categories from a per-atom score
//! (pLDDT, stored in the B-factor column), recolors them through a molecular
//! graphics host, and highlights "catalytic" residues flagged by a second
//! per-atom score (stored in the occupancy column).
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Stateless classification, counting and
//!   summary formatting, colors, typed selection predicates and scene models.
//!
//! - **[`engine`]: The Host Boundary.** The [`engine::host::Host`] trait every
//!   graphics host adapter implements, the pass context that owns temporary
//!   names, configuration, and an in-memory [`engine::scene::Scene`].
//!
//! - **[`workflows`]: The Public API.** The coloring pass with aggregated
//!   failure reporting, and the plugin initialization hook.

pub mod core;
pub mod engine;
pub mod workflows;
