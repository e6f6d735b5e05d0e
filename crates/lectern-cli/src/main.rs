//! Lectern maintenance CLI
//!
//! The `lectern` command drives the offline build steps of the content
//! layer, most importantly the one-shot versification rules import.
//!
//! ## Commands
//!
//! - `import-v11n`: Parse a tab-separated rules file and submit the batch
//! - `versions`: List the versions a content engine serves

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use lectern_core::{
    init_tracing, parse_rules, run_import, ContentEngine, HttpContentEngine, RemoteEngineConfig,
};

#[derive(Parser)]
#[command(name = "lectern")]
#[command(author = "Lectern Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Maintenance tooling for the Lectern content layer", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a versification rules file into a content engine
    ///
    /// The import is all-or-nothing: a malformed line anywhere aborts the
    /// run before anything is submitted.
    ImportV11n {
        /// Path to the tab-separated rules file
        file: PathBuf,

        /// Content engine endpoint
        #[arg(long, env = "LECTERN_ENGINE_URL")]
        engine_url: String,

        /// Parse and report without submitting anything
        #[arg(long)]
        dry_run: bool,
    },

    /// List the versions a content engine serves
    Versions {
        /// Content engine endpoint
        #[arg(long, env = "LECTERN_ENGINE_URL")]
        engine_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::ImportV11n {
            file,
            engine_url,
            dry_run,
        } => cmd_import_v11n(&file, &engine_url, dry_run).await,
        Commands::Versions { engine_url } => cmd_versions(&engine_url).await,
    }
}

async fn cmd_import_v11n(file: &Path, engine_url: &str, dry_run: bool) -> Result<()> {
    let input = File::open(file)
        .with_context(|| format!("Failed to open rules file {}", file.display()))?;
    let reader = BufReader::new(input);

    if dry_run {
        let parsed = parse_rules(reader).context("Rules file is not importable")?;
        println!(
            "{} rules parsed ({} rows skipped); nothing submitted",
            parsed.rules.len(),
            parsed.skipped
        );
        return Ok(());
    }

    let engine = HttpContentEngine::new(RemoteEngineConfig::new(engine_url));
    let summary = run_import(reader, &engine)
        .await
        .context("v11n import failed")?;
    println!(
        "Imported {} rules ({} rows skipped)",
        summary.rules, summary.skipped
    );
    Ok(())
}

async fn cmd_versions(engine_url: &str) -> Result<()> {
    let engine = HttpContentEngine::new(RemoteEngineConfig::new(engine_url));
    let versions = engine
        .versions()
        .await
        .context("Failed to list versions")?;

    if versions.is_empty() {
        println!("No versions installed");
        return Ok(());
    }
    for version in versions {
        println!("{}\t{}\t{}", version.uid, version.language, version.title);
    }
    Ok(())
}
