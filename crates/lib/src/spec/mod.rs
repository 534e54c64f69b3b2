//! Package spec model.
//!
//! A [`PackageSpec`] is the single source of truth for a package: metadata,
//! default dependency sets and per-target overrides. The compiler only reads
//! it; nothing in the crate mutates a spec after loading.

mod base;
mod load;
mod platform;
mod types;

pub use base::{base_packages, builder_packages};
pub use load::SpecError;
pub use platform::*;
pub use types::*;
