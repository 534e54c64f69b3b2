//! Chroot staging.
//!
//! The toolkit builds each package in one of several worker chroots and
//! expects the package cache at `upstream-cached-rpms` inside each. Without
//! `CAP_SYS_ADMIN` it cannot mount that itself, so one cache mount per worker
//! slot is added to the build step. The toolkit only takes the no-mount path
//! when it finds [`CONTAINER_MARKER`] in its root.

use crate::consts::{CHROOT_CACHE_DIR, CHROOT_ROOT, CHROOT_SLOT_PREFIX, CONTAINER_MARKER};
use crate::graph::{ExecBuilder, ExecOption, FileAction, Mount, State};

use super::CachePlanner;

/// One package-cache mount per worker chroot slot.
#[derive(Debug, Clone)]
pub struct ChrootMounts {
  mounts: Vec<Mount>,
}

impl ChrootMounts {
  /// Plan mounts for `parallelism` slots. Must match the number of workers
  /// the toolkit will start, or slots go without a warm cache.
  pub fn plan(cache: &CachePlanner, parallelism: usize) -> Self {
    let mounts = (0..parallelism)
      .map(|i| cache.package_cache_at(slot_path(i)))
      .collect();
    Self { mounts }
  }

  pub fn mounts(&self) -> &[Mount] {
    &self.mounts
  }

  pub fn len(&self) -> usize {
    self.mounts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.mounts.is_empty()
  }

  pub fn into_mounts(self) -> Vec<Mount> {
    self.mounts
  }
}

impl ExecOption for ChrootMounts {
  fn apply(&self, exec: &mut ExecBuilder) {
    for mount in &self.mounts {
      exec.add_mount(mount.clone());
    }
  }
}

/// Cache location inside worker chroot `slot`.
pub fn slot_path(slot: usize) -> String {
  format!("{}/{}{}/{}", CHROOT_ROOT, CHROOT_SLOT_PREFIX, slot, CHROOT_CACHE_DIR)
}

/// Add the empty container marker file to `state`.
pub fn stage_container_marker(state: &State) -> State {
  state.file(FileAction::mkfile(CONTAINER_MARKER, 0o600, Vec::new()))
}
