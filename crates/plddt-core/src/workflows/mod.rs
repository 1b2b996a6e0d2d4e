//! # Workflows Module
//!
//! Top-level entry points tying the classifier and the host boundary
//! together.
//!
//! - **Coloring Pass** ([`color`]) - Bins marker atoms, recolors residues, highlights
//!   catalytic residues, optionally draws surfaces, and reports one summary line.
//! - **Plugin Lifecycle** ([`plugin`]) - Load-time hook that applies the default
//!   coloring and registers a reapply menu entry when the host supports menus.

pub mod color;
pub mod plugin;
