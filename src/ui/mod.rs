//! Terminal-facing UI: rendering contract and line input.
//!
//! Orchestration layers depend on the [`render::RenderSink`] and
//! [`input::LineReader`] traits rather than on stdin/stdout directly.

pub mod input;
pub mod render;
