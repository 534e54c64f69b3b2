//! Compiler configuration.
//!
//! Every value that used to be a process-wide constant in a target backend
//! (toolchain names, base image, cache region ids) lives in a [`TargetConfig`]
//! so several compilers with different cache namespaces can coexist.
//!
//! Configuration is TOML:
//!
//! ```toml
//! [targets.mariner2]
//! base_image = "mcr.microsoft.com/cbl-mariner/base/core:2.0"
//! release_version = "2.0"
//!
//! [targets.mariner2.cache]
//! package_cache_id = "team-a-cached-rpms"
//! ```
//!
//! Targets named in the file are layered over the built-in defaults; fields a
//! target leaves out fall back to the `mariner2` values.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::{RepoPlatformConfig, builder_packages};

/// Target key of the built-in toolkit target.
pub const MARINER2_TARGET: &str = "mariner2";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid config: {0}")]
  Parse(#[from] toml::de::Error),

  #[error("unknown target: {0}")]
  UnknownTarget(String),
}

/// Ids of the persistent cache regions a target mounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Package manager metadata cache, shared by every build of the distro.
  pub metadata_cache_id: String,
  /// Downloaded packages, addressed by file name.
  pub package_cache_id: String,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      metadata_cache_id: "mariner2-tdnf-cache".to_string(),
      package_cache_id: "mariner2-toolkit-cached-rpms".to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
  /// Named context a caller can supply to replace the toolchain.
  pub toolchain_context: String,
  /// Canonical toolchain image reference, also accepted as a context name.
  pub toolchain_image: String,
  /// Image used when no toolchain context is supplied.
  pub base_image: String,
  /// `--releasever` passed to the package manager when downloading deps.
  pub release_version: String,
  /// Worker slots to use when the client reports none.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parallelism: Option<usize>,
  /// Packages the builder image must carry to run `rpmbuild`.
  pub builder_packages: Vec<String>,
  pub cache: CacheConfig,
  pub repo_platform: RepoPlatformConfig,
}

impl TargetConfig {
  pub fn mariner2() -> Self {
    Self {
      toolchain_context: "mariner2-toolchain".to_string(),
      toolchain_image: "ghcr.io/azure/dalec/mariner2/toolchain:latest".to_string(),
      base_image: "mcr.microsoft.com/cbl-mariner/base/core:2.0".to_string(),
      release_version: "2.0".to_string(),
      parallelism: None,
      builder_packages: builder_packages(MARINER2_TARGET),
      cache: CacheConfig::default(),
      repo_platform: RepoPlatformConfig::rpm(),
    }
  }
}

impl Default for TargetConfig {
  fn default() -> Self {
    Self::mariner2()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
  #[serde(default)]
  pub targets: BTreeMap<String, TargetConfig>,
}

impl Default for CompilerConfig {
  fn default() -> Self {
    Self {
      targets: BTreeMap::from([(MARINER2_TARGET.to_string(), TargetConfig::mariner2())]),
    }
  }
}

impl CompilerConfig {
  pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
    let parsed: CompilerConfig = toml::from_str(content)?;
    let mut config = Self::default();
    config.targets.extend(parsed.targets);
    Ok(config)
  }

  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_toml_str(&content)
  }

  pub fn target(&self, key: &str) -> Result<&TargetConfig, ConfigError> {
    self
      .targets
      .get(key)
      .ok_or_else(|| ConfigError::UnknownTarget(key.to_string()))
  }
}
