//! Implementation of the `rpmgraph targets` command.

use std::path::Path;

use anyhow::Result;

use crate::output::{OutputFormat, print_info, print_json, print_stat};

pub fn cmd_targets(config: Option<&Path>, format: OutputFormat) -> Result<()> {
  let config = super::load_config(config)?;

  if format.is_json() {
    return print_json(&config.targets);
  }

  for (key, target) in &config.targets {
    print_info(key);
    print_stat("Toolchain context", &target.toolchain_context);
    print_stat("Toolchain image", &target.toolchain_image);
    print_stat("Base image", &target.base_image);
    print_stat("Release", &target.release_version);
    print_stat("Builder packages", &target.builder_packages.join(" "));
    print_stat("Metadata cache", &target.cache.metadata_cache_id);
    print_stat("Package cache", &target.cache.package_cache_id);
    print_stat("Repo config", &target.repo_platform.repo_config_path("<name>"));
  }

  Ok(())
}
