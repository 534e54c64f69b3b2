//! Persistent cache regions.
//!
//! Two regions survive across compiles: the package manager's metadata cache
//! and the downloaded-package cache. Both are locked on write. The package
//! cache is shared by builds with unrelated dependency sets because its
//! entries are addressed by file name.

use crate::config::CacheConfig;
use crate::consts::{CACHED_RPMS_DIR, TDNF_CACHE_DIR};
use crate::graph::{CacheSharing, Mount};

#[derive(Debug, Clone)]
pub struct CachePlanner {
  config: CacheConfig,
}

impl CachePlanner {
  pub fn new(config: CacheConfig) -> Self {
    Self { config }
  }

  /// Package manager metadata cache at its standard location.
  pub fn metadata_cache(&self) -> Mount {
    Mount::cache(TDNF_CACHE_DIR, &self.config.metadata_cache_id, CacheSharing::Locked)
  }

  /// Downloaded-package cache where the toolkit looks for it.
  pub fn package_cache(&self) -> Mount {
    self.package_cache_at(format!("{}/cache", CACHED_RPMS_DIR))
  }

  /// Downloaded-package cache mounted at `target`.
  pub fn package_cache_at(&self, target: impl Into<String>) -> Mount {
    Mount::cache(target, &self.config.package_cache_id, CacheSharing::Locked)
  }
}
