//! Fixed paths and names the toolkit build expects inside the graph.

/// Where the recipe tree is mounted for the toolkit.
pub const SPECS_DIR: &str = "/build/SPECS";

/// Path inside the recipe-tree state that holds the spec directories.
pub const SPECS_SELECTOR: &str = "/SPECS";

/// Working directory of the toolkit checkout in the toolchain image.
pub const TOOLKIT_DIR: &str = "/build/toolkit";

/// Toolkit output directory. Only [`ARTIFACT_DIRS`] are extracted from it.
pub const OUT_DIR: &str = "/build/out";

/// Root of the downloaded-package cache as seen by the toolkit.
pub const CACHED_RPMS_DIR: &str = "/root/.cache/mariner2-toolkit-rpm-cache";

/// Package manager metadata cache.
pub const TDNF_CACHE_DIR: &str = "/var/tdnf/cache";

/// Parent directory of the toolkit's worker chroots.
pub const CHROOT_ROOT: &str = "/tmp/chroot";

/// Worker chroot directory name prefix, followed by the slot index.
pub const CHROOT_SLOT_PREFIX: &str = "dalec";

/// Directory inside each chroot the toolkit's repo files point at.
pub const CHROOT_CACHE_DIR: &str = "upstream-cached-rpms";

/// Marker the toolkit probes to pick the no-mount chroot strategy.
pub const CONTAINER_MARKER: &str = "/.dockerenv";

/// Logs written by the toolkit for each package build.
pub const BUILD_LOGS_GLOB: &str = "/build/build/logs/pkggen/rpmbuilding/*";

/// Subdirectories of [`OUT_DIR`] that make up the artifact layout.
pub const ARTIFACT_DIRS: [&str; 2] = ["RPMS", "SRPMS"];
