mod base_spec;
mod plan;
mod targets;

pub use base_spec::{BaseSpecArgs, cmd_base_spec};
pub use plan::{PlanArgs, cmd_plan};
pub use targets::cmd_targets;

use std::path::Path;

use anyhow::{Context, Result};
use rpmgraph_lib::config::CompilerConfig;

/// Load the compiler configuration, or the built-in defaults when no file is given.
fn load_config(path: Option<&Path>) -> Result<CompilerConfig> {
  match path {
    Some(path) => {
      CompilerConfig::load(path).with_context(|| format!("Failed to load config: {}", path.display()))
    }
    None => Ok(CompilerConfig::default()),
  }
}
