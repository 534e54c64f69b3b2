//! rpmgraph-lib: compile package specs into content-addressed build graphs.
//!
//! The crate turns a declarative [`spec::PackageSpec`] plus a target key into a
//! DAG of filesystem states, cache mounts and exec steps:
//! - `graph`: the node types, the state builder API and the marshaller
//! - `spec`: the package spec model, loaders and per-distro constants
//! - `toolkit`: the RPM toolkit backend (toolchain, deps, caches, chroots, assembly)
//! - `client`: the capability set the compiler needs from its caller
//!
//! Nothing here executes a build. The marshalled [`graph::Definition`] is handed
//! to a solver through [`client::BuildClient::solve`].

pub mod client;
pub mod config;
pub mod consts;
pub mod error;
pub mod graph;
pub mod spec;
pub mod toolkit;
pub mod util;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{CompileError, Phase};
