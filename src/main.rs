mod cli;

use packsmith::{assembler, config, pipeline, reprocess};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use packsmith_codecs::tools::{check_tools, Toolchain};

/// Exit status for a run that completed with recorded per-file failures.
const EXIT_DEGRADED: i32 = 2;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on the
    // verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "packsmith=trace,packsmith_codecs=debug,packsmith_common=debug".to_string()
        } else {
            "packsmith=info,packsmith_codecs=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Process { source, workers } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(process(&source, cli.config.as_deref(), workers))
        }
        Commands::Reprocess { tree } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(reprocess_tree(&tree, cli.config.as_deref()))
        }
        Commands::CheckTools => run_check_tools(),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("packsmith {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Cancel the token on the first ctrl-c so in-flight tools are killed and
/// staged partial output is discarded.
fn install_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling run");
            cancel.cancel();
        }
    });
}

async fn process(
    source: &Path,
    config_path: Option<&Path>,
    workers: Option<usize>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !source.is_dir() {
        anyhow::bail!("Source is not a directory: {:?}", source);
    }

    let toolchain = Toolchain::discover(&config.tool_overrides())?;
    let settings = config.codec_settings()?;
    let workers = workers.unwrap_or(config.run.workers);

    let cancel = CancellationToken::new();
    install_ctrl_c(cancel.clone());

    let codec = Arc::new(pipeline::ExternalCodec::new(
        toolchain.clone(),
        settings,
        cancel.clone(),
    ));
    let archiver = Arc::new(assembler::SevenZipArchiver::new(toolchain, cancel.clone()));
    let orchestrator = pipeline::Orchestrator::new(codec, archiver, workers, cancel);

    let summary = orchestrator.run(source).await?;

    println!("\nProcessed {:?} ({} files)", source, summary.files_scanned);
    for profile in &summary.profiles {
        println!(
            "  {}: {} converted, {} copied, {} failed -> {}",
            profile.profile,
            profile.succeeded,
            profile.copied,
            profile.failed,
            profile.artifact.display()
        );
    }

    if summary.is_degraded() {
        println!(
            "\nCompleted with {} failed conversions (see manifests for details)",
            summary.total_failed()
        );
        std::process::exit(EXIT_DEGRADED);
    }

    Ok(())
}

async fn reprocess_tree(tree: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !tree.is_dir() {
        anyhow::bail!("Dist tree is not a directory: {:?}", tree);
    }

    let toolchain = Toolchain::discover(&config.tool_overrides())?;
    let cancel = CancellationToken::new();
    install_ctrl_c(cancel.clone());

    let archiver = Arc::new(assembler::SevenZipArchiver::new(toolchain, cancel));
    let assembler = assembler::ArchiveAssembler::new(archiver);

    let summary = reprocess::reprocess(tree, &assembler).await?;

    println!(
        "Reprocessed {:?}: {} validated, {} inconsistent, {} previously failed",
        tree, summary.validated, summary.inconsistent, summary.previously_failed
    );
    println!("Archive: {}", summary.artifact.display());

    if summary.is_degraded() {
        std::process::exit(EXIT_DEGRADED);
    }

    Ok(())
}

fn run_check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    let tools = check_tools();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    if all_ok {
        println!("\nAll tools available.");
        Ok(())
    } else {
        anyhow::bail!("Some required tools are missing");
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            println!("Validating config: {:?}", path);
            let config = config::load_config(path)?;
            println!("Config is valid.");
            println!("  workers: {}", config.run.workers);
            println!("  dist format: {}", config.dist.format);
            println!("  dist target width: {}", config.dist.target_width);
            Ok(())
        }
        None => {
            let config = config::load_config_or_default(None)?;
            println!("Config is valid (defaults or discovered file).");
            println!("  workers: {}", config.run.workers);
            println!("  dist format: {}", config.dist.format);
            Ok(())
        }
    }
}
