//! Build graph model.
//!
//! A graph is a DAG of [`State`] values. Each state points at the [`Op`] that
//! produces it; ops reference their inputs by holding other states. States are
//! cheap to clone and never mutated: every builder method returns a new state
//! that shares the unchanged parts of the graph.
//!
//! # Submodules
//!
//! - [`image`] - OCI image configuration carried alongside a state
//! - [`marshal`] - flattening a state into a content-addressed [`Definition`]

pub mod image;
pub mod marshal;
mod state;
mod types;

pub use image::{ContainerConfig, ImageConfig};
pub use marshal::{CacheDef, Definition, ExecMeta, FileActionDef, MarshalError, MountDef, OpDef, OpEntry, OpKind};
pub use state::*;
pub use types::*;
