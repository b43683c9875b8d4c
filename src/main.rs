use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use dependency_updates::config::{Settings, settings_path};
use dependency_updates::engine::{RefreshOutcome, ResolutionEngine};
use dependency_updates::logging::init_logging;
use dependency_updates::render::{render_json, render_text};
use dependency_updates::tooling::gradle::GradleCli;

#[derive(Parser)]
#[command(name = "dependency-updates")]
#[command(version, about = "Check the dependencies of a Gradle build for newer stable versions")]
struct Cli {
    /// Root directory of the build
    #[arg(default_value = ".")]
    project_dir: PathBuf,

    /// Settings file (defaults to the user settings file)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Gradle executable to use instead of the wrapper
    #[arg(long)]
    gradle: Option<PathBuf>,

    /// Print the result tree as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load_or_default(&settings_path())?,
    };
    let root_dir = std::path::absolute(&cli.project_dir)
        .with_context(|| format!("Invalid project directory {:?}", cli.project_dir))?;

    let gradle = match cli.gradle {
        Some(executable) => GradleCli::new().with_executable(executable),
        None => GradleCli::new(),
    };
    let gradle = Arc::new(gradle);
    let engine = ResolutionEngine::new(root_dir, gradle.clone(), gradle);

    if let RefreshOutcome::Started(run) = engine.refresh(&settings)? {
        info!("Checking {:?} ({})", engine.root_dir(), run);
    }

    let Some(tree) = engine.wait_idle().await else {
        error!("Run ended without a result");
        anyhow::bail!("run ended without a result");
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&render_json(&tree))?);
    } else {
        print!("{}", render_text(&tree));
    }
    Ok(())
}
