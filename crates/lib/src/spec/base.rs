use std::collections::HashMap;

use super::{PackageConstraints, PackageDependencies, PackageSpec};

const BASE_PREFIX: &str = "dalec-base-";
const DISTROLESS_MINIMAL: &str = "distroless-packages-minimal";
const PREBUILT_CA_CERTS: &str = "prebuilt-ca-certificates";

const AZLINUX_BUILDER: &[&str] = &["rpm-build", "mariner-rpm-macros", "build-essential", "ca-certificates"];
const ALMALINUX_BUILDER: &[&str] = &["binutils", "rpm-build", "ca-certificates"];

/// Packages a builder image for `distro` needs to run `rpmbuild`.
///
/// `mariner2` and `azlinux*` share one list, `almalinux*` has its own. Unknown
/// distros get an empty list.
pub fn builder_packages(distro: &str) -> Vec<String> {
  let packages = if distro == "mariner2" || distro.starts_with("azlinux") {
    AZLINUX_BUILDER
  } else if distro.starts_with("almalinux") {
    ALMALINUX_BUILDER
  } else {
    &[]
  };
  packages.iter().map(|p| p.to_string()).collect()
}

/// Meta-packages every image built for `distro` starts from.
pub fn base_packages(distro: &str) -> Vec<PackageSpec> {
  let mut spec = PackageSpec::new(format!("{}{}", BASE_PREFIX, distro), "0.0.1");
  spec.revision = "1".to_string();
  spec.license = "Apache-2.0".to_string();
  spec.description = format!("DALEC base packages for {}", distro);
  spec.dependencies = Some(PackageDependencies {
    build: HashMap::new(),
    runtime: HashMap::from([(DISTROLESS_MINIMAL.to_string(), PackageConstraints::default())]),
    recommends: HashMap::from([(PREBUILT_CA_CERTS.to_string(), PackageConstraints::default())]),
  });
  vec![spec]
}
