//! Artifact rendering and the all-or-nothing commit to disk.

pub mod console;
pub mod labels;
mod writer;

pub use writer::*;
