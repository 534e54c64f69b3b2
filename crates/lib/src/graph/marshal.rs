//! Flattening a state DAG into a content-addressed definition.
//!
//! Every op is serialized with its inputs replaced by the digests of the ops
//! producing them, then hashed. Identical sub-graphs therefore collapse to a
//! single entry no matter how many states reference them, and two compiles
//! that build the same graph produce byte-identical definitions.
//!
//! Ops are emitted in topological order: an op's inputs always appear before
//! it, and the last entry is the root.

use std::collections::{BTreeMap, HashMap};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::State;
use super::types::{CacheSharing, CopyOpts, FileAction, MountSource, Op};
use crate::util::hash::{Hashable, ObjectHash};

#[derive(Debug, Error)]
pub enum MarshalError {
  #[error("failed to serialize op: {0}")]
  Serialize(#[from] serde_json::Error),

  #[error("cycle detected in build graph")]
  CycleDetected,
}

/// A marshalled op. Inputs are referenced by digest; variant fields that
/// point at an input do so by index into `inputs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpDef {
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub inputs: Vec<ObjectHash>,
  pub op: OpKind,
}

impl Hashable for OpDef {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OpKind {
  Scratch,
  /// `docker-image://<ref>[@<digest>]` or `context://<name>`.
  Source { identifier: String },
  /// Input 0 is the base filesystem.
  File { action: FileActionDef },
  /// Input 0 is the root filesystem.
  Exec { meta: ExecMeta, mounts: Vec<MountDef> },
  /// Inputs are the layers, bottom first.
  Merge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FileActionDef {
  Mkfile { path: String, mode: u32, data: Vec<u8> },
  Mkdir { path: String, mode: u32, parents: bool },
  Copy {
    src_input: usize,
    src_path: String,
    dest: String,
    opts: CopyOpts,
  },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecMeta {
  pub args: Vec<String>,
  pub env: BTreeMap<String, String>,
  pub cwd: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountDef {
  pub target: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub input: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub selector: Option<String>,
  pub readonly: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cache: Option<CacheDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDef {
  pub id: String,
  pub sharing: CacheSharing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpEntry {
  pub digest: ObjectHash,
  pub op: OpDef,
}

/// A marshalled build graph, ready to hand to a solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
  /// Unique ops in dependency order.
  pub ops: Vec<OpEntry>,
  /// Digest of the op producing the requested state.
  pub root: ObjectHash,
}

impl Hashable for Definition {}

impl Definition {
  pub fn from_state(state: &State) -> Result<Self, MarshalError> {
    let mut marshaller = Marshaller::default();
    let root = marshaller.visit(state)?;
    marshaller.finish(root)
  }

  pub fn get(&self, digest: &ObjectHash) -> Option<&OpDef> {
    self.ops.iter().find(|e| &e.digest == digest).map(|e| &e.op)
  }

  /// Index of `digest` in the emitted order.
  pub fn position(&self, digest: &ObjectHash) -> Option<usize> {
    self.ops.iter().position(|e| &e.digest == digest)
  }

  pub fn root_op(&self) -> Option<&OpDef> {
    self.get(&self.root)
  }

  /// All exec ops, in dependency order.
  pub fn execs(&self) -> impl Iterator<Item = (&ObjectHash, &ExecMeta, &[MountDef])> {
    self.ops.iter().filter_map(|e| match &e.op.op {
      OpKind::Exec { meta, mounts } => Some((&e.digest, meta, mounts.as_slice())),
      _ => None,
    })
  }

  pub fn to_json(&self) -> Result<Vec<u8>, MarshalError> {
    Ok(serde_json::to_vec(self)?)
  }
}

/// Walks a state DAG once, memoizing by op identity.
#[derive(Default)]
struct Marshaller {
  memo: HashMap<usize, ObjectHash>,
  defs: HashMap<ObjectHash, OpDef>,
  graph: DiGraph<ObjectHash, ()>,
  nodes: HashMap<ObjectHash, NodeIndex>,
}

impl Marshaller {
  fn visit(&mut self, state: &State) -> Result<ObjectHash, MarshalError> {
    if let Some(digest) = self.memo.get(&state.op_ptr()) {
      return Ok(digest.clone());
    }

    let (input_states, op) = Self::lower(state.op());
    let mut inputs = Vec::with_capacity(input_states.len());
    for input in &input_states {
      inputs.push(self.visit(input)?);
    }

    let def = OpDef { inputs, op };
    let digest = def.compute_hash()?;

    let idx = self.node(&digest);
    for input in &def.inputs {
      let input_idx = self.node(input);
      self.graph.update_edge(input_idx, idx, ());
    }
    self.defs.entry(digest.clone()).or_insert(def);
    self.memo.insert(state.op_ptr(), digest.clone());

    Ok(digest)
  }

  fn node(&mut self, digest: &ObjectHash) -> NodeIndex {
    if let Some(&idx) = self.nodes.get(digest) {
      return idx;
    }
    let idx = self.graph.add_node(digest.clone());
    self.nodes.insert(digest.clone(), idx);
    idx
  }

  /// Split an op into the states it reads and its marshalled form.
  fn lower(op: &Op) -> (Vec<State>, OpKind) {
    match op {
      Op::Scratch => (Vec::new(), OpKind::Scratch),
      Op::Image { reference, digest } => {
        let identifier = match digest {
          Some(digest) => format!("docker-image://{}@{}", reference, digest),
          None => format!("docker-image://{}", reference),
        };
        (Vec::new(), OpKind::Source { identifier })
      }
      Op::Context { name } => (
        Vec::new(),
        OpKind::Source {
          identifier: format!("context://{}", name),
        },
      ),
      Op::File { base, action } => {
        let mut inputs = vec![base.clone()];
        let action = match action {
          FileAction::Mkfile { path, mode, data } => FileActionDef::Mkfile {
            path: path.clone(),
            mode: *mode,
            data: data.clone(),
          },
          FileAction::Mkdir { path, mode, parents } => FileActionDef::Mkdir {
            path: path.clone(),
            mode: *mode,
            parents: *parents,
          },
          FileAction::Copy {
            src,
            src_path,
            dest,
            opts,
          } => {
            inputs.push(src.clone());
            FileActionDef::Copy {
              src_input: 1,
              src_path: src_path.clone(),
              dest: dest.clone(),
              opts: opts.clone(),
            }
          }
        };
        (inputs, OpKind::File { action })
      }
      Op::Exec(exec) => {
        let mut inputs = vec![exec.root.clone()];
        let mounts = exec
          .mounts
          .iter()
          .map(|m| {
            let (input, selector, cache) = match &m.source {
              MountSource::Cache { id, sharing } => (
                None,
                None,
                Some(CacheDef {
                  id: id.clone(),
                  sharing: *sharing,
                }),
              ),
              MountSource::State { state, selector } => {
                inputs.push(state.clone());
                (Some(inputs.len() - 1), selector.clone(), None)
              }
            };
            MountDef {
              target: m.target.clone(),
              input,
              selector,
              readonly: m.readonly,
              cache,
            }
          })
          .collect();
        let meta = ExecMeta {
          args: exec.args.clone(),
          env: exec.env.clone(),
          cwd: exec.cwd.clone(),
        };
        (inputs, OpKind::Exec { meta, mounts })
      }
      Op::Merge(layers) => (layers.clone(), OpKind::Merge),
    }
  }

  fn finish(mut self, root: ObjectHash) -> Result<Definition, MarshalError> {
    let order = toposort(&self.graph, None).map_err(|_| MarshalError::CycleDetected)?;
    let mut ops = Vec::with_capacity(order.len());
    for idx in order {
      let digest = self.graph[idx].clone();
      if let Some(op) = self.defs.remove(&digest) {
        ops.push(OpEntry { digest, op });
      }
    }
    Ok(Definition { ops, root })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graph::{CopyOpts, FileAction, Mount, sh_args};

  fn base() -> State {
    State::image("registry.example/base:1", Some("sha256:abc".to_string()))
  }

  #[test]
  fn root_is_last_and_inputs_come_first() {
    let out = base().run(sh_args("make")).root();
    let def = out.marshal().unwrap();

    assert_eq!(def.ops.len(), 2);
    assert_eq!(def.ops.last().unwrap().digest, def.root);
    let exec = def.root_op().unwrap();
    assert!(def.position(&exec.inputs[0]).unwrap() < def.position(&def.root).unwrap());
  }

  #[test]
  fn image_identifier_includes_pinned_digest() {
    let def = base().marshal().unwrap();
    assert_eq!(
      def.root_op().unwrap().op,
      OpKind::Source {
        identifier: "docker-image://registry.example/base:1@sha256:abc".to_string()
      }
    );
  }

  #[test]
  fn shared_subgraphs_are_emitted_once() {
    let shared = base().file(FileAction::mkfile("/marker", 0o600, Vec::new()));
    let a = shared.run(sh_args("a")).root();
    let b = shared.run(sh_args("b")).root();
    let merged = State::merge(vec![a, b]);

    let def = merged.marshal().unwrap();
    // base, marker, a, b, merge
    assert_eq!(def.ops.len(), 5);
  }

  #[test]
  fn structurally_equal_graphs_share_digests() {
    let one = base().run(sh_args("make")).root().marshal().unwrap();
    let two = base().run(sh_args("make")).root().marshal().unwrap();

    assert_eq!(one, two);
    assert_eq!(one.compute_hash().unwrap(), two.compute_hash().unwrap());
  }

  #[test]
  fn env_changes_the_digest() {
    let one = base().run(sh_args("make")).root().digest().unwrap();
    let two = base().run(sh_args("make")).env("A", "1").root().digest().unwrap();
    assert_ne!(one, two);
  }

  #[test]
  fn state_mounts_become_inputs() {
    let recipes = State::context("recipes");
    let out = base()
      .run(sh_args("ls /src"))
      .with(&Mount::state("/src", recipes).with_selector("/SPECS").readonly())
      .root();
    let def = out.marshal().unwrap();

    let (_, _, mounts) = def.execs().next().unwrap();
    assert_eq!(mounts[0].input, Some(1));
    assert_eq!(mounts[0].selector.as_deref(), Some("/SPECS"));
    assert!(mounts[0].readonly);
    assert_eq!(def.root_op().unwrap().inputs.len(), 2);
  }

  #[test]
  fn copy_source_is_second_input() {
    let src = base().run(sh_args("build")).root();
    let out = State::scratch().file(FileAction::copy(&src, "/out", "/", CopyOpts::default()));
    let def = out.marshal().unwrap();

    let root = def.root_op().unwrap();
    assert_eq!(root.inputs.len(), 2);
    assert_eq!(def.get(&root.inputs[0]).unwrap().op, OpKind::Scratch);
    assert!(matches!(
      def.get(&root.inputs[1]).unwrap().op,
      OpKind::Exec { .. }
    ));
  }
}
