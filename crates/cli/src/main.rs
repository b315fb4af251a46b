mod cmd;
mod output;
mod prompts;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{ArtifactCommand, DeployArgs, cmd_artifact, cmd_deploy};
use output::print_error;

/// esb - resolve deploy inputs and record them as artifact manifests
#[derive(Parser)]
#[command(name = "esb")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve deploy inputs and write the artifact manifest
  Deploy(DeployArgs),

  /// Inspect artifact manifests
  Artifact {
    #[command(subcommand)]
    command: ArtifactCommand,
  },
}

fn main() {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match &cli.command {
    Commands::Deploy(args) => cmd_deploy(args),
    Commands::Artifact { command } => cmd_artifact(command),
  };

  if let Err(e) = result {
    print_error(&format!("{:#}", e));
    std::process::exit(1);
  }
}
