//! Errors surfaced by a compile.

use thiserror::Error;

use crate::graph::MarshalError;

/// The phase of a compile an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Resolution,
  Recipe,
  Marshal,
  Download,
  Build,
  Extraction,
  Solve,
}

impl std::fmt::Display for Phase {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Phase::Resolution => "resolution",
      Phase::Recipe => "recipe",
      Phase::Marshal => "marshal",
      Phase::Download => "download",
      Phase::Build => "build",
      Phase::Extraction => "extraction",
      Phase::Solve => "solve",
    };
    f.write_str(name)
  }
}

/// Errors that abort a compile. None of them are retried here.
#[derive(Debug, Error)]
pub enum CompileError {
  /// Looking up a toolchain context, or applying its image config, failed.
  #[error("resolution: toolchain context {context}: {message}")]
  ToolchainResolution { context: String, message: String },

  /// Pinning the default base image to a digest failed.
  #[error("resolution: failed to resolve digest for {reference}: {message}")]
  DigestResolution { reference: String, message: String },

  #[error("recipe: {0}")]
  RecipeTree(String),

  #[error("marshal: {0}")]
  GraphMarshal(#[from] MarshalError),

  /// A step inside the graph exited non-zero. `message` carries whatever the
  /// step printed, including the build tool's logs for the build step.
  #[error("{phase} step failed: {message}")]
  BuildExecution { phase: Phase, message: String },

  #[error("solve: {0}")]
  Solve(String),

  #[error("solve: solver succeeded but returned no reference")]
  EmptySolveResult,

  #[error("compile cancelled")]
  Cancelled,

  #[error("invalid configuration: {0}")]
  InvalidConfig(String),
}

impl CompileError {
  pub fn phase(&self) -> Option<Phase> {
    match self {
      CompileError::ToolchainResolution { .. } | CompileError::DigestResolution { .. } => Some(Phase::Resolution),
      CompileError::RecipeTree(_) => Some(Phase::Recipe),
      CompileError::GraphMarshal(_) => Some(Phase::Marshal),
      CompileError::BuildExecution { phase, .. } => Some(*phase),
      CompileError::Solve(_) | CompileError::EmptySolveResult => Some(Phase::Solve),
      CompileError::Cancelled | CompileError::InvalidConfig(_) => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_names_the_phase() {
    let err = CompileError::BuildExecution {
      phase: Phase::Download,
      message: "No match for argument: libfoo".to_string(),
    };
    assert_eq!(err.to_string(), "download step failed: No match for argument: libfoo");
    assert_eq!(err.phase(), Some(Phase::Download));

    let err = CompileError::ToolchainResolution {
      context: "mariner2-toolchain".to_string(),
      message: "boom".to_string(),
    };
    assert!(err.to_string().starts_with("resolution:"));
  }

  #[test]
  fn marshal_errors_convert() {
    let err: CompileError = MarshalError::CycleDetected.into();
    assert_eq!(err.phase(), Some(Phase::Marshal));
  }
}
