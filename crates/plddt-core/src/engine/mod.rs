//! # Engine Module
//!
//! The stateful side of a coloring pass: the host command surface, the
//! names a pass owns inside the host, configuration, progress reporting and
//! error types, plus an in-memory scene that implements the host surface.
//!
//! - **Host interface** ([`host`]) - Commands a molecular graphics host must provide
//! - **Pass context** ([`context`]) - Temporary selection, object and color names
//! - **Configuration** ([`config`]) - Scope, thresholds, boundary rule, cutoff, palette
//! - **Scene** ([`scene`]) - Reference host evaluating predicates over a structure
//! - **Progress Monitoring** ([`progress`]) - Step-level progress callbacks
//! - **Error Handling** ([`error`]) - Aggregated step failures

pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod progress;
pub mod scene;
