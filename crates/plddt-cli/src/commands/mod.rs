pub mod classify;
pub mod color;
