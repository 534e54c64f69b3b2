//! Toolchain resolution.
//!
//! The base builder state is picked in order:
//! 1. a named context called after the target's toolchain alias
//! 2. a named context called after the canonical toolchain image reference
//! 3. the target's base image, pinned to a digest at construction time
//!
//! A matching context wins outright. If its image config cannot be applied the
//! compile fails; it never falls through to the next tier.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{BuildClient, NamedContext};
use crate::config::TargetConfig;
use crate::error::CompileError;
use crate::graph::State;

pub struct ToolchainResolver<'a> {
  config: &'a TargetConfig,
}

impl<'a> ToolchainResolver<'a> {
  pub fn new(config: &'a TargetConfig) -> Self {
    Self { config }
  }

  pub async fn resolve(&self, client: &dyn BuildClient, cancel: &CancellationToken) -> Result<State, CompileError> {
    for name in [&self.config.toolchain_context, &self.config.toolchain_image] {
      let context = client
        .named_context(name)
        .await
        .map_err(|e| CompileError::ToolchainResolution {
          context: name.clone(),
          message: e.to_string(),
        })?;

      if let Some(context) = context {
        debug!(context = %name, has_config = context.config.is_some(), "using toolchain from named context");
        return apply_image_config(name, context);
      }
    }

    if cancel.is_cancelled() {
      return Err(CompileError::Cancelled);
    }

    let reference = &self.config.base_image;
    debug!(image = %reference, "no toolchain context supplied, pinning base image");
    let resolved = tokio::select! {
      biased;
      _ = cancel.cancelled() => return Err(CompileError::Cancelled),
      digest = client.resolve_image_digest(reference) => digest,
    };
    let digest = resolved.map_err(|e| CompileError::DigestResolution {
      reference: reference.clone(),
      message: e.to_string(),
    })?;

    Ok(State::image(reference.clone(), Some(digest)))
  }
}

fn apply_image_config(name: &str, context: NamedContext) -> Result<State, CompileError> {
  let Some(config) = context.config else {
    return Ok(context.state);
  };

  let err = |message: String| CompileError::ToolchainResolution {
    context: name.to_string(),
    message,
  };
  let raw = serde_json::to_vec(&config).map_err(|e| err(format!("failed to serialize image config: {}", e)))?;
  context
    .state
    .with_image_config(&raw)
    .map_err(|e| err(format!("failed to apply image config: {}", e)))
}
