//! Implementation of the `rpmgraph base-spec` command.

use anyhow::{Context, Result};
use clap::Args;

use rpmgraph_lib::spec::base_packages;

use crate::output::{OutputFormat, print_json};

#[derive(Args, Debug)]
pub struct BaseSpecArgs {
  /// Distro name, e.g. mariner2 or azlinux3
  pub distro: String,
}

pub fn cmd_base_spec(args: BaseSpecArgs, format: OutputFormat) -> Result<()> {
  let specs = base_packages(&args.distro);

  if format.is_json() {
    return print_json(&specs);
  }

  for spec in &specs {
    let yaml = serde_yaml::to_string(spec).context("Failed to serialize spec")?;
    print!("{}", yaml);
  }
  Ok(())
}
