//! The recipe tree mounted at `SPECS_DIR`.
//!
//! Producing the RPM spec files is the job of whoever owns the spec grammar;
//! the compiler only needs a state with a `/SPECS/<name>` directory in it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::client::{BuildClient, FeatureFlags};
use crate::error::CompileError;
use crate::graph::{CopyOpts, FileAction, State};
use crate::spec::PackageSpec;

#[async_trait]
pub trait RecipeTree: Send + Sync {
  async fn recipe_tree(
    &self,
    client: &dyn BuildClient,
    spec: &PackageSpec,
    features: FeatureFlags,
  ) -> Result<State, CompileError>;
}

/// The toolkit refuses to build a spec without a signatures file next to it.
#[derive(Serialize)]
struct Signatures {
  #[serde(rename = "Signatures")]
  signatures: BTreeMap<String, String>,
}

/// Takes `SPECS/<name>` from the caller's main context and adds an empty
/// `<name>.signatures.json` beside it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextRecipeTree;

#[async_trait]
impl RecipeTree for ContextRecipeTree {
  async fn recipe_tree(
    &self,
    client: &dyn BuildClient,
    spec: &PackageSpec,
    features: FeatureFlags,
  ) -> Result<State, CompileError> {
    let main = client
      .main_context()
      .await
      .map_err(|e| CompileError::RecipeTree(e.to_string()))?;

    let dir = format!("/SPECS/{}", spec.name);
    let sources = State::scratch().file(FileAction::copy(
      &main,
      format!("SPECS/{}", spec.name),
      dir.clone(),
      CopyOpts {
        contents_only: true,
        create_dest_path: true,
        ..Default::default()
      },
    ));

    let data = serde_json::to_vec(&Signatures {
      signatures: BTreeMap::new(),
    })
    .map_err(|e| CompileError::RecipeTree(format!("failed to encode signatures: {}", e)))?;
    let signatures = FileAction::mkfile(format!("{}/{}.signatures.json", dir, spec.name), 0o644, data);

    if features.merge_op {
      let layer = State::scratch().file(FileAction::mkdir(dir, 0o755)).file(signatures);
      Ok(State::merge(vec![sources, layer]))
    } else {
      Ok(sources.file(signatures))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::client::StaticClient;
  use crate::graph::Op;

  #[tokio::test]
  async fn layers_without_merge_support() {
    let client = StaticClient::new();
    let spec = PackageSpec::new("foo", "1.0");

    let st = ContextRecipeTree
      .recipe_tree(&client, &spec, FeatureFlags::default())
      .await
      .unwrap();

    match st.op() {
      Op::File {
        base,
        action: FileAction::Mkfile { path, data, .. },
      } => {
        assert_eq!(path, "/SPECS/foo/foo.signatures.json");
        assert_eq!(data.as_slice(), br#"{"Signatures":{}}"#);
        assert!(matches!(
          base.op(),
          Op::File {
            action: FileAction::Copy { .. },
            ..
          }
        ));
      }
      other => panic!("expected layered mkfile, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn merges_when_supported() {
    let client = StaticClient::new();
    let spec = PackageSpec::new("foo", "1.0");

    let st = ContextRecipeTree
      .recipe_tree(&client, &spec, FeatureFlags { merge_op: true })
      .await
      .unwrap();

    match st.op() {
      Op::Merge(layers) => assert_eq!(layers.len(), 2),
      other => panic!("expected merge, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn copies_package_dir_from_main_context() {
    let client = StaticClient::new().with_main_context(State::context("sources"));
    let spec = PackageSpec::new("foo", "1.0");

    let st = ContextRecipeTree
      .recipe_tree(&client, &spec, FeatureFlags::default())
      .await
      .unwrap();
    let def = st.marshal().unwrap();

    assert!(def.ops.iter().any(|e| matches!(
      &e.op.op,
      crate::graph::OpKind::Source { identifier } if identifier == "context://sources"
    )));
  }
}
