//! OCI image configuration.
//!
//! Only the fields the compiler reads or forwards are modelled. The JSON field
//! names follow the OCI image spec so a config produced elsewhere round-trips.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub architecture: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub os: Option<String>,
  #[serde(default)]
  pub config: ContainerConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub env: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub working_dir: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub entrypoint: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cmd: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user: Option<String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub labels: BTreeMap<String, String>,
}

impl ImageConfig {
  /// `Env` entries split into key/value pairs. Entries without `=` map to an empty value.
  pub fn env_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .config
      .env
      .iter()
      .map(|entry| entry.split_once('=').unwrap_or((entry.as_str(), "")))
  }
}
