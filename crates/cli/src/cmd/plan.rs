//! Implementation of the `rpmgraph plan` command.
//!
//! Compiles a spec against an offline client: toolchain contexts and base
//! image digests come from the command line, nothing is pulled or solved.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use rpmgraph_lib::CompileError;
use rpmgraph_lib::client::{BuildOpts, FeatureFlags, NamedContext, StaticClient};
use rpmgraph_lib::config::MARINER2_TARGET;
use rpmgraph_lib::graph::State;
use rpmgraph_lib::spec::PackageSpec;
use rpmgraph_lib::toolkit::RpmCompiler;

use crate::output::{OutputFormat, print_info, print_json, print_stat, print_success, truncate_hash};

#[derive(Args, Debug)]
pub struct PlanArgs {
  /// Package spec (YAML or JSON)
  pub spec: PathBuf,

  /// Target to compile for
  #[arg(short, long, default_value = MARINER2_TARGET)]
  pub target: String,

  /// Worker slots for the build step (defaults to the local CPU count)
  #[arg(short = 'j', long)]
  pub parallelism: Option<usize>,

  /// Assume the solver can merge filesystem states
  #[arg(long)]
  pub merge: bool,

  /// Supply a named context as an image, e.g. mariner2-toolchain=registry/toolchain:dev
  #[arg(long = "context", value_name = "NAME=IMAGE", value_parser = parse_key_val)]
  pub contexts: Vec<(String, String)>,

  /// Pin an image reference to a digest, e.g. mcr.microsoft.com/cbl-mariner/base/core:2.0=sha256:...
  #[arg(long = "pin", value_name = "IMAGE=DIGEST", value_parser = parse_key_val)]
  pub pins: Vec<(String, String)>,

  /// Write the definition JSON to this file
  #[arg(short, long)]
  pub output: Option<PathBuf>,
}

/// Split `KEY=VALUE` on the first `=`.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
  let (key, value) = s
    .split_once('=')
    .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
  if key.is_empty() || value.is_empty() {
    return Err(format!("expected KEY=VALUE, got '{}'", s));
  }
  Ok((key.to_string(), value.to_string()))
}

fn offline_client(args: &PlanArgs) -> StaticClient {
  let mut client = StaticClient::new().with_opts(BuildOpts {
    features: FeatureFlags { merge_op: args.merge },
    parallelism: args.parallelism,
  });
  for (name, image) in &args.contexts {
    client = client.with_context(
      name,
      NamedContext {
        state: State::image(image, None),
        config: None,
      },
    );
  }
  for (image, digest) in &args.pins {
    client = client.with_digest(image, digest);
  }
  client
}

pub fn cmd_plan(args: PlanArgs, config: Option<&Path>, format: OutputFormat) -> Result<()> {
  if args.parallelism == Some(0) {
    bail!("--parallelism must be at least 1");
  }

  let config = super::load_config(config)?;
  let target = config.target(&args.target)?.clone();
  let spec = PackageSpec::load(&args.spec).with_context(|| format!("Failed to load spec: {}", args.spec.display()))?;

  debug!(spec = %spec.name, path = %args.spec.display(), target = %args.target, "loaded spec");

  let client = offline_client(&args);
  let compiler = RpmCompiler::new(&args.target, target.clone());

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let compiled = rt
    .block_on(compiler.compile(&client, &spec, &CancellationToken::new()))
    .map_err(|err| {
      let message = match &err {
        CompileError::DigestResolution { .. } => format!(
          "Failed to compile {} for {} (pin the base image with --pin {}=DIGEST or supply a toolchain with --context)",
          spec.name, args.target, target.base_image
        ),
        _ => format!("Failed to compile {} for {}", spec.name, args.target),
      };
      anyhow::Error::new(err).context(message)
    })?;

  if let Some(path) = &args.output {
    debug!(path = %path.display(), "writing definition");
    let json = serde_json::to_string_pretty(&compiled.definition).context("Failed to serialize definition")?;
    fs::write(path, json).with_context(|| format!("Failed to write definition: {}", path.display()))?;
  }

  if format.is_json() {
    return print_json(&compiled.definition);
  }

  print_success(&format!("Compiled {} for {}", spec.name, args.target));
  print_stat("Root", truncate_hash(&compiled.definition.root.0));
  print_stat("Ops", &compiled.definition.ops.len().to_string());
  print_stat("Parallelism", &compiled.parallelism.to_string());
  if compiled.graph.deps.is_empty() {
    print_stat("Build deps", "none (download step skipped)");
  } else {
    print_stat("Build deps", &compiled.graph.deps.join(" "));
  }
  if let Some(path) = &args.output {
    print_info(&format!("Definition written to {}", path.display()));
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_key_val_splits_on_first_equals() {
    assert_eq!(
      parse_key_val("mariner2-toolchain=registry/toolchain:dev").unwrap(),
      ("mariner2-toolchain".to_string(), "registry/toolchain:dev".to_string())
    );
    assert!(parse_key_val("no-equals").is_err());
    assert!(parse_key_val("=value").is_err());
  }
}
