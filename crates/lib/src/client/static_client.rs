use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::debug;

use super::{BuildClient, BuildOpts, ClientError, NamedContext, Reference, SolveError, SolveResult};
use crate::graph::{Definition, State};

/// Outcome the [`StaticClient`] reports for a solve.
#[derive(Debug, Clone, Default)]
pub enum SolveBehavior {
  /// Succeed with a reference named after the definition's root digest.
  #[default]
  RootDigest,
  /// Succeed without producing a reference.
  NoReference,
  /// Fail, attributing the failure to the exec op whose first argument
  /// line contains the given text.
  FailExec { matching: String, message: String },
}

/// A [`BuildClient`] answering from in-memory tables.
///
/// Contexts and digests are registered up front; nothing touches the network.
/// Solving does not execute anything: it records the definition and reports
/// the configured [`SolveBehavior`]. Used by the CLI to inspect graphs offline.
#[derive(Debug, Default)]
pub struct StaticClient {
  opts: BuildOpts,
  contexts: HashMap<String, NamedContext>,
  failing_contexts: HashMap<String, String>,
  digests: HashMap<String, String>,
  main: Option<State>,
  solve: SolveBehavior,
  resolve_calls: AtomicUsize,
  solved: Mutex<Vec<Definition>>,
}

impl StaticClient {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_opts(mut self, opts: BuildOpts) -> Self {
    self.opts = opts;
    self
  }

  pub fn with_context(mut self, name: impl Into<String>, context: NamedContext) -> Self {
    self.contexts.insert(name.into(), context);
    self
  }

  /// Make lookups of `name` fail with `message`.
  pub fn with_failing_context(mut self, name: impl Into<String>, message: impl Into<String>) -> Self {
    self.failing_contexts.insert(name.into(), message.into());
    self
  }

  pub fn with_digest(mut self, reference: impl Into<String>, digest: impl Into<String>) -> Self {
    self.digests.insert(reference.into(), digest.into());
    self
  }

  pub fn with_main_context(mut self, state: State) -> Self {
    self.main = Some(state);
    self
  }

  pub fn with_solve(mut self, behavior: SolveBehavior) -> Self {
    self.solve = behavior;
    self
  }

  /// How many times a digest was requested.
  pub fn resolve_calls(&self) -> usize {
    self.resolve_calls.load(Ordering::SeqCst)
  }

  /// Definitions passed to `solve`, in call order.
  pub fn solved(&self) -> Vec<Definition> {
    self.solved.lock().map(|s| s.clone()).unwrap_or_default()
  }
}

#[async_trait]
impl BuildClient for StaticClient {
  fn build_opts(&self) -> BuildOpts {
    self.opts.clone()
  }

  async fn named_context(&self, name: &str) -> Result<Option<NamedContext>, ClientError> {
    if let Some(message) = self.failing_contexts.get(name) {
      return Err(ClientError::NamedContext {
        name: name.to_string(),
        message: message.clone(),
      });
    }
    Ok(self.contexts.get(name).cloned())
  }

  async fn main_context(&self) -> Result<State, ClientError> {
    Ok(self.main.clone().unwrap_or_else(|| State::context("context")))
  }

  async fn resolve_image_digest(&self, reference: &str) -> Result<String, ClientError> {
    self.resolve_calls.fetch_add(1, Ordering::SeqCst);
    self.digests.get(reference).cloned().ok_or_else(|| ClientError::Resolve {
      reference: reference.to_string(),
      message: "no digest pinned".to_string(),
    })
  }

  async fn solve(&self, definition: &Definition) -> Result<SolveResult, SolveError> {
    debug!(root = %definition.root, ops = definition.ops.len(), "solve requested");
    if let Ok(mut solved) = self.solved.lock() {
      solved.push(definition.clone());
    }

    match &self.solve {
      SolveBehavior::RootDigest => Ok(SolveResult {
        reference: Some(Reference(definition.root.to_string())),
      }),
      SolveBehavior::NoReference => Ok(SolveResult { reference: None }),
      SolveBehavior::FailExec { matching, message } => {
        let op = definition
          .execs()
          .find(|(_, meta, _)| meta.args.iter().any(|a| a.contains(matching.as_str())))
          .map(|(digest, _, _)| digest.clone());
        Err(SolveError {
          op,
          message: message.clone(),
        })
      }
    }
  }
}
