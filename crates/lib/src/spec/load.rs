use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::PackageSpec;

#[derive(Debug, Error)]
pub enum SpecError {
  #[error("failed to read spec {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid YAML spec: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("invalid JSON spec: {0}")]
  Json(#[from] serde_json::Error),

  #[error("invalid spec: {0}")]
  Invalid(String),
}

impl PackageSpec {
  pub fn from_yaml_str(content: &str) -> Result<Self, SpecError> {
    let spec: PackageSpec = serde_yaml::from_str(content)?;
    spec.validate()?;
    Ok(spec)
  }

  pub fn from_json_str(content: &str) -> Result<Self, SpecError> {
    let spec: PackageSpec = serde_json::from_str(content)?;
    spec.validate()?;
    Ok(spec)
  }

  /// Load a spec file. `.json` files are parsed as JSON, everything else as YAML.
  pub fn load(path: &Path) -> Result<Self, SpecError> {
    let content = fs::read_to_string(path).map_err(|source| SpecError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    match path.extension().and_then(|e| e.to_str()) {
      Some("json") => Self::from_json_str(&content),
      _ => Self::from_yaml_str(&content),
    }
  }

  fn validate(&self) -> Result<(), SpecError> {
    if self.name.trim().is_empty() {
      return Err(SpecError::Invalid("name must not be empty".to_string()));
    }
    if self.version.trim().is_empty() {
      return Err(SpecError::Invalid("version must not be empty".to_string()));
    }

    // Build dependency names end up on a shell command line.
    let build_sets = self
      .dependencies
      .iter()
      .chain(self.targets.values().filter_map(|t| t.dependencies.as_ref()))
      .map(|deps| &deps.build);
    for build in build_sets {
      if let Some(name) = build.keys().find(|name| !is_package_name(name)) {
        return Err(SpecError::Invalid(format!("invalid build dependency name: {:?}", name)));
      }
    }
    Ok(())
  }
}

/// Letters, digits and `._+-:/@`, starting with a letter, digit or `/`.
fn is_package_name(name: &str) -> bool {
  let mut chars = name.chars();
  let Some(first) = chars.next() else {
    return false;
  };
  (first.is_ascii_alphanumeric() || first == '/')
    && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-' | ':' | '/' | '@'))
}
