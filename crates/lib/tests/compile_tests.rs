//! End-to-end compiles through the public API.
//!
//! Every test drives `RpmCompiler` against a `StaticClient`, then inspects the
//! marshalled definition the way a solver would see it.

use tokio_util::sync::CancellationToken;

use rpmgraph_lib::client::{BuildOpts, FeatureFlags, NamedContext, SolveBehavior, StaticClient};
use rpmgraph_lib::config::{CompilerConfig, MARINER2_TARGET, TargetConfig};
use rpmgraph_lib::graph::{Definition, ExecMeta, FileActionDef, MountDef, OpKind, State};
use rpmgraph_lib::spec::PackageSpec;
use rpmgraph_lib::toolkit::RpmCompiler;
use rpmgraph_lib::{CompileError, Phase};

const BASE_DIGEST: &str = "sha256:4f53cda18c2baa0c0354bb5f9a3ecbe5ed12ab4d8e11ba873c2f11161202b945";

const FOO_WITH_DEPS: &str = r#"
name: foo
version: "1.0"
revision: "1"
dependencies:
  build:
    libbaz-devel: {}
    libbar-devel: {}
"#;

const FOO_WITHOUT_DEPS: &str = r#"
name: foo
version: "1.0"
"#;

fn spec(yaml: &str) -> PackageSpec {
  PackageSpec::from_yaml_str(yaml).unwrap()
}

fn target() -> TargetConfig {
  CompilerConfig::default().target(MARINER2_TARGET).unwrap().clone()
}

fn compiler() -> RpmCompiler {
  RpmCompiler::new(MARINER2_TARGET, target())
}

fn client(parallelism: usize) -> StaticClient {
  StaticClient::new()
    .with_digest(target().base_image, BASE_DIGEST)
    .with_opts(BuildOpts {
      features: FeatureFlags::default(),
      parallelism: Some(parallelism),
    })
}

async fn definition(client: &StaticClient, spec: &PackageSpec) -> Definition {
  compiler()
    .compile(client, spec, &CancellationToken::new())
    .await
    .unwrap()
    .definition
}

fn execs(def: &Definition) -> Vec<(ExecMeta, Vec<MountDef>)> {
  def
    .execs()
    .map(|(_, meta, mounts)| (meta.clone(), mounts.to_vec()))
    .collect()
}

mod graph_shape {
  use super::*;

  #[tokio::test]
  async fn deps_add_a_sorted_download_step_before_the_build() {
    let client = client(2);
    let def = definition(&client, &spec(FOO_WITH_DEPS)).await;

    let execs = execs(&def);
    assert_eq!(execs.len(), 2);

    let download = &execs[0].0.args;
    assert_eq!(download[0], "sh");
    assert!(download[2].starts_with("dnf download -y --releasever=2.0 --resolve --alldeps"));
    assert!(download[2].ends_with(" libbar-devel libbaz-devel"));

    let build = &execs[1].0.args;
    assert!(build[2].starts_with("make -j2 build-packages || (cat "));
    assert!(build[2].ends_with("; exit 1)"));
  }

  #[tokio::test]
  async fn no_deps_means_no_download_step() {
    let client = client(2);
    let def = definition(&client, &spec(FOO_WITHOUT_DEPS)).await;

    let execs = execs(&def);
    assert_eq!(execs.len(), 1);
    assert!(execs[0].0.args[2].starts_with("make -j2 build-packages"));
  }

  #[tokio::test]
  async fn target_deps_replace_spec_deps() {
    let yaml = format!(
      "{}targets:\n  mariner2:\n    dependencies:\n      build:\n        libqux-devel: {{}}\n",
      FOO_WITH_DEPS
    );
    let client = client(1);
    let def = definition(&client, &spec(&yaml)).await;

    let execs = execs(&def);
    assert_eq!(execs.len(), 2);
    assert!(execs[0].0.args[2].ends_with(" libqux-devel"));
    assert!(!execs[0].0.args[2].contains("libbar-devel"));
  }

  #[tokio::test]
  async fn build_step_mounts_one_slot_per_worker() {
    let client = client(4);
    let def = definition(&client, &spec(FOO_WITH_DEPS)).await;

    let execs = execs(&def);
    let (meta, mounts) = execs.last().unwrap();
    // Chroot slots, then the package cache, recipes and metadata cache.
    assert_eq!(mounts.len(), 4 + 3);
    assert!(mounts[..4].iter().all(|m| m.target.starts_with("/tmp/chroot/dalec")));

    let recipes = mounts.iter().find(|m| m.target == "/build/SPECS").unwrap();
    assert!(recipes.readonly);
    assert_eq!(recipes.selector.as_deref(), Some("/SPECS"));

    assert_eq!(meta.env.get("VERSION").map(String::as_str), Some("1.0"));
    assert_eq!(meta.env.get("BUILD_NUMBER").map(String::as_str), Some("1"));
    assert_eq!(meta.env.get("REFRESH_WORKER_CHROOT").map(String::as_str), Some("n"));
    assert_eq!(meta.env.get("CONFIG_FILE").map(String::as_str), Some(""));
    assert_eq!(meta.cwd, "/build/toolkit");
  }

  #[tokio::test]
  async fn container_marker_precedes_the_build() {
    let client = client(1);
    let def = definition(&client, &spec(FOO_WITHOUT_DEPS)).await;

    let marker = def
      .ops
      .iter()
      .position(|e| matches!(&e.op.op, OpKind::File { action: FileActionDef::Mkfile { path, .. } } if path == "/.dockerenv"))
      .unwrap();
    let build = def
      .ops
      .iter()
      .position(|e| matches!(e.op.op, OpKind::Exec { .. }))
      .unwrap();
    assert!(marker < build);
  }

  #[tokio::test]
  async fn output_holds_only_artifact_dirs() {
    let client = client(1);
    let def = definition(&client, &spec(FOO_WITH_DEPS)).await;

    let root = def.root_op().unwrap();
    let OpKind::File {
      action: FileActionDef::Copy { src_path, dest, opts, .. },
    } = &root.op
    else {
      panic!("root is not a copy: {:?}", root.op);
    };
    assert_eq!(src_path, "/build/out");
    assert_eq!(dest, "/");
    assert!(opts.contents_only);
    assert_eq!(opts.include_patterns, vec!["RPMS".to_string(), "SRPMS".to_string()]);
    assert_eq!(def.ops.last().map(|e| &e.digest), Some(&def.root));
  }
}

mod determinism {
  use super::*;

  #[tokio::test]
  async fn dependency_order_does_not_change_the_definition() {
    let reordered = r#"
name: foo
version: "1.0"
revision: "1"
dependencies:
  build:
    libbar-devel: {}
    libbaz-devel: {}
"#;
    let client = client(2);
    let a = definition(&client, &spec(FOO_WITH_DEPS)).await;
    let b = definition(&client, &spec(reordered)).await;

    assert_eq!(a.root, b.root);
    assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
  }

  #[tokio::test]
  async fn merge_feature_changes_only_the_recipe_layering() {
    let sequential = client(2);
    let merged = client(2).with_opts(BuildOpts {
      features: FeatureFlags { merge_op: true },
      parallelism: Some(2),
    });

    let a = definition(&sequential, &spec(FOO_WITHOUT_DEPS)).await;
    let b = definition(&merged, &spec(FOO_WITHOUT_DEPS)).await;

    assert_ne!(a.root, b.root);
    assert!(!a.ops.iter().any(|e| matches!(e.op.op, OpKind::Merge)));
    assert!(b.ops.iter().any(|e| matches!(e.op.op, OpKind::Merge)));
  }
}

mod toolchain {
  use super::*;

  #[tokio::test]
  async fn pinned_base_image_is_the_default() {
    let client = client(1);
    let def = definition(&client, &spec(FOO_WITHOUT_DEPS)).await;

    let identifier = format!("docker-image://{}@{}", target().base_image, BASE_DIGEST);
    assert!(def.ops.iter().any(|e| e.op.op == OpKind::Source { identifier: identifier.clone() }));
    assert_eq!(client.resolve_calls(), 1);
  }

  #[tokio::test]
  async fn named_context_skips_digest_resolution() {
    let client = StaticClient::new()
      .with_opts(BuildOpts {
        features: FeatureFlags::default(),
        parallelism: Some(1),
      })
      .with_context(
        target().toolchain_context,
        NamedContext {
          state: State::image("registry.example/toolchain:dev", None),
          config: None,
        },
      );
    let def = definition(&client, &spec(FOO_WITHOUT_DEPS)).await;

    let identifier = "docker-image://registry.example/toolchain:dev".to_string();
    assert!(def.ops.iter().any(|e| e.op.op == OpKind::Source { identifier: identifier.clone() }));
    assert_eq!(client.resolve_calls(), 0);
  }

  #[tokio::test]
  async fn failing_context_lookup_aborts() {
    let client = client(1).with_failing_context(target().toolchain_context, "boom");
    let err = compiler()
      .compile(&client, &spec(FOO_WITHOUT_DEPS), &CancellationToken::new())
      .await
      .unwrap_err();

    assert!(matches!(err, CompileError::ToolchainResolution { .. }));
    assert_eq!(err.phase(), Some(Phase::Resolution));
    assert_eq!(client.resolve_calls(), 0);
  }
}

mod handle {
  use super::*;

  #[tokio::test]
  async fn solve_returns_reference_and_image_config() {
    let client = client(2);
    let (reference, config) = compiler()
      .handle(&client, &spec(FOO_WITH_DEPS), &CancellationToken::new())
      .await
      .unwrap();

    let solved = client.solved();
    assert_eq!(solved.len(), 1);
    assert_eq!(reference.to_string(), solved[0].root.to_string());
    assert!(config.config.env.is_empty());
  }

  #[tokio::test]
  async fn missing_reference_is_an_error() {
    let client = client(1).with_solve(SolveBehavior::NoReference);
    let err = compiler()
      .handle(&client, &spec(FOO_WITHOUT_DEPS), &CancellationToken::new())
      .await
      .unwrap_err();

    assert!(matches!(err, CompileError::EmptySolveResult));
  }

  #[tokio::test]
  async fn cancelled_before_start_never_resolves() {
    let client = client(1);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = compiler()
      .handle(&client, &spec(FOO_WITHOUT_DEPS), &cancel)
      .await
      .unwrap_err();

    assert!(matches!(err, CompileError::Cancelled));
    assert_eq!(client.resolve_calls(), 0);
    assert!(client.solved().is_empty());
  }

  #[tokio::test]
  async fn failures_name_the_failing_step() {
    for (matching, phase) in [("dnf download", Phase::Download), ("make -j", Phase::Build)] {
      let client = client(1).with_solve(SolveBehavior::FailExec {
        matching: matching.to_string(),
        message: "exit status 2".to_string(),
      });
      let err = compiler()
        .handle(&client, &spec(FOO_WITH_DEPS), &CancellationToken::new())
        .await
        .unwrap_err();

      assert_eq!(err.phase(), Some(phase));
      assert!(err.to_string().contains("exit status 2"));
    }
  }
}
