//! RPM toolkit backend.
//!
//! Builds packages with the CBL-Mariner toolkit (`make build-packages`) inside
//! a toolchain image. The toolkit normally bind-mounts its package cache into
//! each worker chroot itself; the graph runs without the privilege for that,
//! so the mounts are staged here instead.
//!
//! # Submodules
//!
//! - [`toolchain`] - picks the base builder state
//! - [`deps`] - sorted build dependency names for a target
//! - [`cache`] - persistent cache regions
//! - [`chroot`] - per-slot cache mounts and the container marker
//! - [`recipe`] - the recipe tree mounted at `SPECS_DIR`
//! - [`assemble`] - wires the above into one graph
//! - [`compiler`] - the compile/solve entry points

pub mod assemble;
pub mod cache;
pub mod chroot;
pub mod compiler;
pub mod deps;
pub mod recipe;
pub mod toolchain;

pub use assemble::{Assembler, BuildGraph};
pub use cache::CachePlanner;
pub use chroot::ChrootMounts;
pub use compiler::{CompiledGraph, RpmCompiler};
pub use deps::collect_build_deps;
pub use recipe::{ContextRecipeTree, RecipeTree};
pub use toolchain::ToolchainResolver;
