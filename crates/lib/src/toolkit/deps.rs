//! Build dependency collection.

use crate::spec::PackageSpec;

/// Build dependency names for `target`, sorted.
///
/// The target's override is authoritative when present; otherwise the
/// spec-level set applies; with neither the result is empty. Sorting keeps
/// command lines and cache keys byte-identical across compiles of the same
/// set, whatever order the map yields.
pub fn collect_build_deps(spec: &PackageSpec, target: &str) -> Vec<String> {
  let Some(deps) = spec.dependencies_for(target) else {
    return Vec::new();
  };

  let mut out: Vec<String> = deps.build.keys().cloned().collect();
  out.sort();
  out
}
