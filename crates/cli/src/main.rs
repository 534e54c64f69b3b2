mod cmd;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{BaseSpecArgs, PlanArgs};
use output::{OutputFormat, print_error};

/// rpmgraph - compile package specs into build graphs
#[derive(Parser)]
#[command(name = "rpmgraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose (debug) logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Compiler configuration file (TOML)
  #[arg(short, long, global = true, env = "RPMGRAPH_CONFIG")]
  config: Option<PathBuf>,

  /// Output format
  #[arg(short = 'f', long, global = true, value_enum, default_value_t)]
  format: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile a package spec and print the build graph
  Plan(PlanArgs),

  /// List configured targets
  Targets,

  /// Print the base meta-package spec for a distro
  BaseSpec(BaseSpecArgs),
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Plan(args) => cmd::cmd_plan(args, cli.config.as_deref(), cli.format),
    Commands::Targets => cmd::cmd_targets(cli.config.as_deref(), cli.format),
    Commands::BaseSpec(args) => cmd::cmd_base_spec(args, cli.format),
  };

  if let Err(err) = result {
    print_error(&format!("{:#}", err));
    std::process::exit(1);
  }
}
