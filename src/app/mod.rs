//! Binary-local application wiring.
//!
//! `main.rs` stays small; startup, agent construction and shutdown live here.

pub(crate) mod entry;
