//! Compile and solve entry points for the toolkit backend.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::{BuildClient, BuildOpts, Reference, SolveError};
use crate::config::TargetConfig;
use crate::error::{CompileError, Phase};
use crate::graph::{Definition, ImageConfig, State};
use crate::spec::PackageSpec;

use super::{Assembler, BuildGraph, CachePlanner, ChrootMounts, ContextRecipeTree, RecipeTree, ToolchainResolver};

/// A compiled graph and its marshalled form.
#[derive(Debug, Clone)]
pub struct CompiledGraph {
  pub graph: BuildGraph,
  pub definition: Definition,
  pub parallelism: usize,
}

impl CompiledGraph {
  /// Attribute a solve failure to the step that caused it.
  fn classify(&self, err: SolveError) -> CompileError {
    let Some(op) = err.op.as_ref() else {
      return CompileError::Solve(err.message);
    };

    let is = |state: Option<&State>| state.and_then(|s| s.digest().ok()).is_some_and(|digest| &digest == op);

    let phase = if is(self.graph.download.as_ref()) {
      Phase::Download
    } else if is(Some(&self.graph.build)) {
      Phase::Build
    } else if op == &self.definition.root {
      Phase::Extraction
    } else {
      return CompileError::Solve(err.message);
    };

    CompileError::BuildExecution {
      phase,
      message: err.message,
    }
  }
}

/// Compiles package specs for one toolkit target.
pub struct RpmCompiler {
  target: String,
  config: TargetConfig,
  recipes: Box<dyn RecipeTree>,
}

impl RpmCompiler {
  pub fn new(target: impl Into<String>, config: TargetConfig) -> Self {
    Self {
      target: target.into(),
      config,
      recipes: Box::new(ContextRecipeTree),
    }
  }

  /// Replace the default recipe tree provider.
  pub fn with_recipes(mut self, recipes: Box<dyn RecipeTree>) -> Self {
    self.recipes = recipes;
    self
  }

  pub fn target(&self) -> &str {
    &self.target
  }

  /// Worker slots for the build step: what the client reports, else the
  /// configured fallback, else the local CPU count.
  fn parallelism(&self, opts: &BuildOpts) -> Result<usize, CompileError> {
    let parallelism = opts
      .parallelism
      .or(self.config.parallelism)
      .unwrap_or_else(|| std::thread::available_parallelism().map(|p| p.get()).unwrap_or(1));

    if parallelism == 0 {
      return Err(CompileError::InvalidConfig("parallelism must be at least 1".to_string()));
    }
    Ok(parallelism)
  }

  /// Build and marshal the graph for `spec` without solving it.
  pub async fn compile(
    &self,
    client: &dyn BuildClient,
    spec: &PackageSpec,
    cancel: &CancellationToken,
  ) -> Result<CompiledGraph, CompileError> {
    if cancel.is_cancelled() {
      return Err(CompileError::Cancelled);
    }

    let opts = client.build_opts();
    let parallelism = self.parallelism(&opts)?;
    info!(
      spec = %spec.name,
      target = %self.target,
      parallelism,
      merge_op = opts.features.merge_op,
      "compiling build graph"
    );

    let base = ToolchainResolver::new(&self.config).resolve(client, cancel).await?;
    let recipes = self.recipes.recipe_tree(client, spec, opts.features).await?;

    let cache = CachePlanner::new(self.config.cache.clone());
    let chroots = ChrootMounts::plan(&cache, parallelism);
    let graph = Assembler::new(spec, &self.target, &self.config, &cache, &chroots).assemble(base, recipes);

    let definition = graph.output.marshal()?;
    debug!(root = %definition.root, ops = definition.ops.len(), "marshalled build graph");

    Ok(CompiledGraph {
      graph,
      definition,
      parallelism,
    })
  }

  /// Compile `spec` and solve it. The returned image config is always
  /// present, even though package builds carry no image metadata.
  pub async fn handle(
    &self,
    client: &dyn BuildClient,
    spec: &PackageSpec,
    cancel: &CancellationToken,
  ) -> Result<(Reference, ImageConfig), CompileError> {
    let compiled = self.compile(client, spec, cancel).await?;

    let solved = tokio::select! {
      biased;
      _ = cancel.cancelled() => return Err(CompileError::Cancelled),
      result = client.solve(&compiled.definition) => result,
    };
    let result = solved.map_err(|e| compiled.classify(e))?;
    let reference = result.reference.ok_or(CompileError::EmptySolveResult)?;

    info!(spec = %spec.name, reference = %reference, "solved build graph");
    Ok((reference, ImageConfig::default()))
  }
}
