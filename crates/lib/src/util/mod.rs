//! Shared utilities.
//!
//! Content hashing for graph ops and definitions.

pub mod hash;
