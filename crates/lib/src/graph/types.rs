use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::State;

/// Access discipline for a persistent cache mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSharing {
  /// Any number of concurrent readers and writers.
  Shared,
  /// Each concurrent user gets its own copy.
  Private,
  /// One writer at a time; other users block until it releases the region.
  Locked,
}

/// What backs a mount inside an exec step.
#[derive(Debug, Clone)]
pub enum MountSource {
  /// A persistent cache region that survives across compiles.
  Cache { id: String, sharing: CacheSharing },
  /// The output of another node, optionally narrowed to a sub-path.
  State { state: State, selector: Option<String> },
}

/// A mount attached to an exec step.
#[derive(Debug, Clone)]
pub struct Mount {
  pub target: String,
  pub source: MountSource,
  pub readonly: bool,
}

impl Mount {
  pub fn cache(target: impl Into<String>, id: impl Into<String>, sharing: CacheSharing) -> Self {
    Self {
      target: target.into(),
      source: MountSource::Cache { id: id.into(), sharing },
      readonly: false,
    }
  }

  pub fn state(target: impl Into<String>, state: State) -> Self {
    Self {
      target: target.into(),
      source: MountSource::State { state, selector: None },
      readonly: false,
    }
  }

  /// Mount only `path` of the source state. Ignored for non-state sources.
  pub fn with_selector(mut self, path: impl Into<String>) -> Self {
    if let MountSource::State { selector, .. } = &mut self.source {
      *selector = Some(path.into());
    }
    self
  }

  pub fn readonly(mut self) -> Self {
    self.readonly = true;
    self
  }

  /// The cache region id, if this is a cache mount.
  pub fn cache_id(&self) -> Option<&str> {
    match &self.source {
      MountSource::Cache { id, .. } => Some(id),
      _ => None,
    }
  }
}

/// An exec step: run `args` on top of `root` with the given mounts.
///
/// The output of the op is the modified root filesystem.
#[derive(Debug, Clone)]
pub struct ExecOp {
  pub root: State,
  pub args: Vec<String>,
  pub env: BTreeMap<String, String>,
  pub cwd: String,
  pub mounts: Vec<Mount>,
}

/// Options for a copy between states.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CopyOpts {
  /// Copy the contents of the source directory rather than the directory itself.
  pub contents_only: bool,
  /// Only entries matching one of these patterns are copied. Empty means all.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub include_patterns: Vec<String>,
  pub create_dest_path: bool,
}

/// A filesystem mutation applied on top of a base state.
#[derive(Debug, Clone)]
pub enum FileAction {
  Mkfile { path: String, mode: u32, data: Vec<u8> },
  Mkdir { path: String, mode: u32, parents: bool },
  Copy {
    src: State,
    src_path: String,
    dest: String,
    opts: CopyOpts,
  },
}

impl FileAction {
  pub fn mkfile(path: impl Into<String>, mode: u32, data: impl Into<Vec<u8>>) -> Self {
    FileAction::Mkfile {
      path: path.into(),
      mode,
      data: data.into(),
    }
  }

  pub fn mkdir(path: impl Into<String>, mode: u32) -> Self {
    FileAction::Mkdir {
      path: path.into(),
      mode,
      parents: true,
    }
  }

  pub fn copy(src: &State, src_path: impl Into<String>, dest: impl Into<String>, opts: CopyOpts) -> Self {
    FileAction::Copy {
      src: src.clone(),
      src_path: src_path.into(),
      dest: dest.into(),
      opts,
    }
  }
}

/// The operation producing a [`State`].
#[derive(Debug, Clone)]
pub enum Op {
  /// The empty filesystem.
  Scratch,
  /// A pullable image, pinned to `digest` when one was resolved.
  Image { reference: String, digest: Option<String> },
  /// A filesystem supplied by the caller under `name`.
  Context { name: String },
  File { base: State, action: FileAction },
  Exec(ExecOp),
  /// Layers stacked in order; later layers win on conflicts.
  Merge(Vec<State>),
}
