//! Per-distro-family repository layout.

use serde::{Deserialize, Serialize};

/// Where a distro family keeps repository configuration and signing keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoPlatformConfig {
  /// Directory holding repository definitions.
  pub config_root: String,
  /// Directory holding repository GPG keys.
  pub gpg_key_root: String,
  /// File extension of a repository definition, including the dot.
  pub config_ext: String,
}

impl RepoPlatformConfig {
  /// RPM family (Azure Linux, CBL-Mariner, AlmaLinux).
  pub fn rpm() -> Self {
    Self {
      config_root: "/etc/yum.repos.d".to_string(),
      gpg_key_root: "/etc/pki/rpm-gpg".to_string(),
      config_ext: ".repo".to_string(),
    }
  }

  /// APT family (Debian, Ubuntu).
  pub fn apt() -> Self {
    Self {
      config_root: "/etc/apt/sources.list.d".to_string(),
      gpg_key_root: "/usr/share/keyrings".to_string(),
      config_ext: ".list".to_string(),
    }
  }

  /// Path of the repository definition called `name`.
  pub fn repo_config_path(&self, name: &str) -> String {
    format!("{}/{}{}", self.config_root.trim_end_matches('/'), name, self.config_ext)
  }

  /// Path of the signing key file called `name`.
  pub fn gpg_key_path(&self, name: &str) -> String {
    format!("{}/{}", self.gpg_key_root.trim_end_matches('/'), name)
  }
}

impl Default for RepoPlatformConfig {
  fn default() -> Self {
    Self::rpm()
  }
}
