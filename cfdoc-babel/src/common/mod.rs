//! Helpers shared by the format implementations.

pub mod codec;
pub mod escape;
pub mod style;
