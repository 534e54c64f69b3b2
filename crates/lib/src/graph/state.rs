use std::collections::BTreeMap;
use std::sync::Arc;

use super::image::ImageConfig;
use super::marshal::{Definition, MarshalError};
use super::types::{ExecOp, FileAction, Mount, Op};
use crate::util::hash::ObjectHash;

/// Metadata that follows a state through the builder API but is not part of
/// the filesystem: default env and working directory for later exec steps,
/// and the raw image config the state was created with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateMeta {
  pub env: BTreeMap<String, String>,
  pub cwd: Option<String>,
  pub image_config: Option<Vec<u8>>,
}

/// A handle to a node in the build graph.
///
/// Cloning a state is cheap: the op is shared. Builder methods consume or
/// borrow a state and return a new one.
#[derive(Debug, Clone)]
pub struct State {
  op: Arc<Op>,
  meta: StateMeta,
}

impl State {
  fn from_op(op: Op, meta: StateMeta) -> Self {
    Self { op: Arc::new(op), meta }
  }

  pub fn scratch() -> Self {
    Self::from_op(Op::Scratch, StateMeta::default())
  }

  pub fn image(reference: impl Into<String>, digest: Option<String>) -> Self {
    Self::from_op(
      Op::Image {
        reference: reference.into(),
        digest,
      },
      StateMeta::default(),
    )
  }

  pub fn context(name: impl Into<String>) -> Self {
    Self::from_op(Op::Context { name: name.into() }, StateMeta::default())
  }

  /// Stack `layers` into one filesystem. Metadata is taken from the first layer.
  pub fn merge(layers: Vec<State>) -> Self {
    let meta = layers.first().map(|s| s.meta.clone()).unwrap_or_default();
    Self::from_op(Op::Merge(layers), meta)
  }

  pub fn op(&self) -> &Op {
    &self.op
  }

  pub fn meta(&self) -> &StateMeta {
    &self.meta
  }

  pub(crate) fn op_ptr(&self) -> usize {
    Arc::as_ptr(&self.op) as usize
  }

  pub fn get_env(&self, key: &str) -> Option<&str> {
    self.meta.env.get(key).map(String::as_str)
  }

  pub fn get_dir(&self) -> &str {
    self.meta.cwd.as_deref().unwrap_or("/")
  }

  pub fn add_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.meta.env.insert(key.into(), value.into());
    self
  }

  pub fn dir(mut self, path: impl Into<String>) -> Self {
    self.meta.cwd = Some(path.into());
    self
  }

  /// Attach a serialized image config and adopt its `Env` and `WorkingDir`.
  pub fn with_image_config(mut self, raw: &[u8]) -> Result<Self, serde_json::Error> {
    let config: ImageConfig = serde_json::from_slice(raw)?;
    for (key, value) in config.env_pairs() {
      self.meta.env.insert(key.to_string(), value.to_string());
    }
    if let Some(dir) = config.config.working_dir.filter(|d| !d.is_empty()) {
      self.meta.cwd = Some(dir);
    }
    self.meta.image_config = Some(raw.to_vec());
    Ok(self)
  }

  pub fn file(&self, action: FileAction) -> State {
    Self::from_op(
      Op::File {
        base: self.clone(),
        action,
      },
      self.meta.clone(),
    )
  }

  /// Start an exec step rooted at this state.
  ///
  /// The step inherits this state's env and working directory.
  pub fn run<I, S>(&self, args: I) -> ExecBuilder
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    ExecBuilder {
      root: self.clone(),
      args: args.into_iter().map(Into::into).collect(),
      env: self.meta.env.clone(),
      cwd: self.get_dir().to_string(),
      mounts: Vec::new(),
    }
  }

  pub fn marshal(&self) -> Result<Definition, MarshalError> {
    Definition::from_state(self)
  }

  /// Digest of the op producing this state.
  pub fn digest(&self) -> Result<ObjectHash, MarshalError> {
    Ok(self.marshal()?.root)
  }
}

/// Something that configures an exec step under construction.
///
/// Implemented by single mounts and by planners that contribute a whole set
/// of mounts at once.
pub trait ExecOption {
  fn apply(&self, exec: &mut ExecBuilder);
}

impl ExecOption for Mount {
  fn apply(&self, exec: &mut ExecBuilder) {
    exec.add_mount(self.clone());
  }
}

/// Builder for an [`ExecOp`]. Finish with [`ExecBuilder::root`].
#[derive(Debug, Clone)]
pub struct ExecBuilder {
  root: State,
  args: Vec<String>,
  env: BTreeMap<String, String>,
  cwd: String,
  mounts: Vec<Mount>,
}

impl ExecBuilder {
  pub fn with(mut self, option: &dyn ExecOption) -> Self {
    option.apply(&mut self);
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  pub fn add_mount(&mut self, mount: Mount) {
    self.mounts.push(mount);
  }

  pub fn mounts(&self) -> &[Mount] {
    &self.mounts
  }

  /// The root filesystem after the step has run.
  pub fn root(self) -> State {
    let meta = self.root.meta.clone();
    State::from_op(
      Op::Exec(ExecOp {
        root: self.root,
        args: self.args,
        env: self.env,
        cwd: self.cwd,
        mounts: self.mounts,
      }),
      meta,
    )
  }
}

/// Wrap a shell command line as exec args.
pub fn sh_args(cmd: impl Into<String>) -> Vec<String> {
  vec!["sh".to_string(), "-c".to_string(), cmd.into()]
}
