//! Graph assembly.
//!
//! The graph has up to four stages, each consuming the previous one:
//!
//! 1. the toolchain with the container marker and toolkit environment
//! 2. `dnf download` of the build dependencies into the package cache,
//!    only when there are any
//! 3. `make build-packages` with the recipe tree, caches and chroot mounts
//! 4. a copy of `RPMS/` and `SRPMS/` from the output directory onto scratch

use tracing::debug;

use crate::config::TargetConfig;
use crate::consts::{
  ARTIFACT_DIRS, BUILD_LOGS_GLOB, CACHED_RPMS_DIR, OUT_DIR, SPECS_DIR, SPECS_SELECTOR, TOOLKIT_DIR,
};
use crate::graph::{CopyOpts, FileAction, Mount, State, sh_args};
use crate::spec::PackageSpec;

use super::chroot::stage_container_marker;
use super::{CachePlanner, ChrootMounts, collect_build_deps};

/// The assembled graph plus handles on its intermediate steps.
#[derive(Debug, Clone)]
pub struct BuildGraph {
  /// Artifact filesystem: `/RPMS` and `/SRPMS` only.
  pub output: State,
  /// Dependency download step. `None` when there are no build dependencies.
  pub download: Option<State>,
  /// The toolkit build step.
  pub build: State,
  /// Sorted build dependencies the graph was assembled with.
  pub deps: Vec<String>,
}

pub struct Assembler<'a> {
  spec: &'a PackageSpec,
  target: &'a str,
  config: &'a TargetConfig,
  cache: &'a CachePlanner,
  chroots: &'a ChrootMounts,
}

impl<'a> Assembler<'a> {
  pub fn new(
    spec: &'a PackageSpec,
    target: &'a str,
    config: &'a TargetConfig,
    cache: &'a CachePlanner,
    chroots: &'a ChrootMounts,
  ) -> Self {
    Self {
      spec,
      target,
      config,
      cache,
      chroots,
    }
  }

  /// Assemble the graph on top of the resolved toolchain `base`, building
  /// the recipes found under `/SPECS` in `recipes`.
  pub fn assemble(&self, base: State, recipes: State) -> BuildGraph {
    let work = stage_container_marker(&base)
      .dir(TOOLKIT_DIR)
      .add_env("SPECS_DIR", SPECS_DIR)
      // Only meaningful for VM images, and the default points at a file we don't ship.
      .add_env("CONFIG_FILE", "")
      .add_env("OUT_DIR", OUT_DIR)
      .add_env("LOG_LEVEL", "debug")
      .add_env("CACHED_RPMS_DIR", CACHED_RPMS_DIR);

    let package_cache = self.cache.package_cache();

    let deps = collect_build_deps(self.spec, self.target);
    let download = if deps.is_empty() {
      debug!(spec = %self.spec.name, target = %self.target, "no build dependencies, skipping download step");
      None
    } else {
      debug!(spec = %self.spec.name, count = deps.len(), "adding dependency download step");
      Some(
        work
          .run(sh_args(download_cmd(&self.config.release_version, &deps)))
          .with(&package_cache)
          .root(),
      )
    };

    let build = download
      .as_ref()
      .unwrap_or(&work)
      .run(sh_args(build_cmd(self.chroots.len())))
      .with(self.chroots)
      .with(&package_cache)
      .with(
        &Mount::state(SPECS_DIR, recipes)
          .with_selector(SPECS_SELECTOR)
          .readonly(),
      )
      .with(&self.cache.metadata_cache())
      .env("VERSION", &self.spec.version)
      .env("BUILD_NUMBER", &self.spec.revision)
      .env("REFRESH_WORKER_CHROOT", "n")
      .root();

    let output = State::scratch().file(FileAction::copy(
      &build,
      OUT_DIR,
      "/",
      CopyOpts {
        contents_only: true,
        include_patterns: ARTIFACT_DIRS.iter().map(|d| d.to_string()).collect(),
        ..Default::default()
      },
    ));

    BuildGraph {
      output,
      download,
      build,
      deps,
    }
  }
}

/// Download `deps` and everything they pull in into the package cache.
pub fn download_cmd(release_version: &str, deps: &[String]) -> String {
  format!(
    "dnf download -y --releasever={} --resolve --alldeps --downloaddir \"${{CACHED_RPMS_DIR}}/cache\" {}",
    release_version,
    deps.join(" ")
  )
}

/// Run the toolkit with `jobs` workers. On failure the per-package build logs
/// are dumped before exiting, since the toolkit's own exit line never carries
/// the cause.
pub fn build_cmd(jobs: usize) -> String {
  format!(
    "make -j{} build-packages || (cat {}; exit 1)",
    jobs, BUILD_LOGS_GLOB
  )
}
