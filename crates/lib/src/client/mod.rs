//! The capability set the compiler needs from whoever drives it.
//!
//! The compiler never talks to a registry, a build context or a solver
//! directly. It asks a [`BuildClient`] for named contexts, the main context,
//! image digests and build options, and hands the finished definition back to
//! the same client to solve. Any frontend that can answer these calls can
//! drive a compile.

mod static_client;

pub use static_client::{SolveBehavior, StaticClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{Definition, ImageConfig, State};
use crate::util::hash::ObjectHash;

/// Solver features available in the current execution environment.
///
/// Unknown features default to off, which selects the most conservative
/// strategy for each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
  /// The solver can merge independent filesystem states. When off, states
  /// are composed by layering one on top of the other.
  pub merge_op: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOpts {
  pub features: FeatureFlags,
  /// Execution units a single step can use concurrently, if known.
  pub parallelism: Option<usize>,
}

/// A filesystem state supplied by the caller under a name.
#[derive(Debug, Clone)]
pub struct NamedContext {
  pub state: State,
  pub config: Option<ImageConfig>,
}

/// Opaque handle to a solved filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference(pub String);

impl std::fmt::Display for Reference {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, Clone, Default)]
pub struct SolveResult {
  pub reference: Option<Reference>,
}

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("named context {name}: {message}")]
  NamedContext { name: String, message: String },

  #[error("main context: {0}")]
  MainContext(String),

  #[error("cannot resolve {reference}: {message}")]
  Resolve { reference: String, message: String },
}

/// A failed solve. `op` names the op that failed when the solver knows it.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SolveError {
  pub op: Option<ObjectHash>,
  pub message: String,
}

#[async_trait]
pub trait BuildClient: Send + Sync {
  fn build_opts(&self) -> BuildOpts;

  /// Look up a caller-supplied context. `Ok(None)` means no context by that name.
  async fn named_context(&self, name: &str) -> Result<Option<NamedContext>, ClientError>;

  /// The caller's main build context.
  async fn main_context(&self) -> Result<State, ClientError>;

  /// Resolve an image reference to a content digest.
  async fn resolve_image_digest(&self, reference: &str) -> Result<String, ClientError>;

  async fn solve(&self, definition: &Definition) -> Result<SolveResult, SolveError>;
}
