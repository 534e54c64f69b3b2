use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Version and architecture constraints on one dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageConstraints {
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub version: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub arch: Vec<String>,
}

/// Dependency sets keyed by package name.
///
/// Map order carries no meaning. Anything derived from the keys (cache keys,
/// command lines) must sort them first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDependencies {
  #[serde(default, skip_serializing_if = "HashMap::is_empty")]
  pub build: HashMap<String, PackageConstraints>,
  #[serde(default, skip_serializing_if = "HashMap::is_empty")]
  pub runtime: HashMap<String, PackageConstraints>,
  #[serde(default, skip_serializing_if = "HashMap::is_empty")]
  pub recommends: HashMap<String, PackageConstraints>,
}

/// Per-target overrides.
///
/// When `dependencies` is set it replaces the spec-level set for this target
/// entirely; the two are never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dependencies: Option<PackageDependencies>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub version: String,
  #[serde(default = "default_revision")]
  pub revision: String,
  #[serde(default)]
  pub license: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dependencies: Option<PackageDependencies>,
  #[serde(default, skip_serializing_if = "HashMap::is_empty")]
  pub targets: HashMap<String, Target>,
}

fn default_revision() -> String {
  "1".to_string()
}

impl PackageSpec {
  pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      description: String::new(),
      version: version.into(),
      revision: default_revision(),
      license: String::new(),
      dependencies: None,
      targets: HashMap::new(),
    }
  }

  /// The dependency set that applies to `target`: the target's override when
  /// it has one, otherwise the spec-level default.
  pub fn dependencies_for(&self, target: &str) -> Option<&PackageDependencies> {
    self
      .targets
      .get(target)
      .and_then(|t| t.dependencies.as_ref())
      .or(self.dependencies.as_ref())
  }
}
