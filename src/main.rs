use anyhow::Result;
use clap::{Parser, Subcommand};
use doi_graph::ingest;

#[derive(Parser)]
#[command(name = "doi-graph")]
#[command(about = "Ingest DOI metadata from OpenAIRE and OpenAlex into a research property graph")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a list of DOIs into the graph store
    Ingest(ingest::IngestArgs),
    /// Pattern-check a list of DOIs without touching the store
    Validate(ingest::ValidateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }

    match cli.command {
        Commands::Ingest(args) => ingest::run(args),
        Commands::Validate(args) => ingest::run_validate(args),
    }
}
