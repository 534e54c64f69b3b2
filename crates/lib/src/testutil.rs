//! Test utilities for rpmgraph-lib.

use std::collections::HashMap;

use crate::client::StaticClient;
use crate::config::TargetConfig;
use crate::graph::State;
use crate::spec::{PackageConstraints, PackageDependencies, PackageSpec};

/// Digest the [`pinned_client`] reports for the base image.
pub const BASE_DIGEST: &str = "sha256:4f53cda18c2baa0c0354bb5f9a3ecbe5ed12ab4d8e11ba873c2f11161202b945";

/// Dependency set with `build` populated from `names`.
pub fn deps(names: &[&str]) -> PackageDependencies {
  PackageDependencies {
    build: names
      .iter()
      .map(|n| (n.to_string(), PackageConstraints::default()))
      .collect::<HashMap<_, _>>(),
    ..Default::default()
  }
}

/// `foo-1.0-1` with a spec-level build dependency set.
pub fn spec_with_build_deps(names: &[&str]) -> PackageSpec {
  let mut spec = PackageSpec::new("foo", "1.0");
  spec.dependencies = Some(deps(names));
  spec
}

/// A client that can pin `config.base_image`.
pub fn pinned_client(config: &TargetConfig) -> StaticClient {
  StaticClient::new().with_digest(&config.base_image, BASE_DIGEST)
}

/// A pinned toolchain image state.
pub fn toolchain() -> State {
  State::image(TargetConfig::mariner2().base_image, Some(BASE_DIGEST.to_string()))
}
