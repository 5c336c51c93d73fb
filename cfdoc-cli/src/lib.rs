//! Library half of the `cfdoc` binary, split out so the inspect views can be tested
//! without spawning the executable.

pub mod transforms;
