//! Tarjuma - multi-model text translation router
//!
//! Command line entry point. Routes text and files between English, Hindi,
//! Urdu and Chinese over IndicTrans2 and OPUS-MT models served by a model
//! server, bridging unsupported pairs through English.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use tarjuma::cli::{Args, Commands};
use tarjuma::config::Config;
use tarjuma::error::TarjumaError;
use tarjuma::translate::http::check_server_availability;
use tarjuma::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    info!("Starting Tarjuma");

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    if let Commands::Check = args.command {
        check_server_availability(&config.server).await?;
        println!("Model server at {} is available", config.server.endpoint);
        return Ok(());
    }

    let workflow = Workflow::new(config)?;

    if let Err(e) = run(&workflow, args.command).await {
        report_error(&workflow, &e);
        return Err(e.into());
    }

    info!("Tarjuma completed successfully");
    Ok(())
}

async fn run(workflow: &Workflow, command: Commands) -> tarjuma::error::Result<()> {
    match command {
        Commands::Text { text, src, tgt, multi_step } => {
            let source = workflow.resolve_language(&src)?;
            let target = workflow.resolve_language(&tgt)?;

            let outcome = workflow.translate_text(&text, &source, &target, multi_step).await?;

            println!("\nTranslation ({}):", outcome.method);
            println!("From ({}): {}", source, text);
            println!("To   ({}): {}", target, outcome.text);
        }
        Commands::File { input, output, src, tgt, multi_step, fields, columns, file_type } => {
            let source = workflow.resolve_language(&src)?;
            let target = workflow.resolve_language(&tgt)?;
            let mut options = workflow.file_options(multi_step, fields, columns);
            options.format = file_type;

            let report = workflow
                .translate_file(&input, output.as_deref(), &source, &target, &options)
                .await?;

            println!("\nFile Translation Completed!");
            println!("Input:  {}", report.input.display());
            println!("Output: {}", report.output.display());
            println!("Format: {}", report.format);
            println!("Time:   {:.2}s", report.stats.elapsed.as_secs_f64());
            println!("Translated: {}", report.stats.succeeded);
            if report.stats.failed > 0 {
                println!("Failed (kept original): {}", report.stats.failed);
                for failure in &report.stats.failures {
                    println!("  {}: [{}] {}", failure.location, failure.kind, failure.error);
                }
            }
        }
        Commands::Batch { input_dir, output_dir, src, tgt, multi_step, fields, columns } => {
            let source = workflow.resolve_language(&src)?;
            let target = workflow.resolve_language(&tgt)?;
            let options = workflow.file_options(multi_step, fields, columns);

            let report = workflow
                .translate_directory(&input_dir, output_dir.as_deref(), &source, &target, &options)
                .await?;

            println!("\n{:<50} {:<8} {:>10} {:>8}", "File", "Format", "Translated", "Failed");
            println!("{}", "-".repeat(80));
            for file in &report.files {
                println!(
                    "{:<50} {:<8} {:>10} {:>8}",
                    file.output.display(),
                    file.format,
                    file.stats.succeeded,
                    file.stats.failed
                );
            }
            for (path, reason) in &report.failed {
                println!("Skipped {}: {}", path.display(), reason);
            }
        }
        Commands::Interactive => {
            workflow.interactive().await?;
        }
        Commands::Languages { src, multi_step } => {
            let router = workflow.router();
            let languages = router.languages();

            match src {
                Some(src) => {
                    let source = workflow.resolve_language(&src)?;
                    println!(
                        "\nTargets from {} ({}):",
                        languages.display_name(&source),
                        source
                    );
                    for target in router.get_available_targets(&source, multi_step) {
                        let method = if router.is_supported_pair(&source, &target) {
                            "direct"
                        } else {
                            "multi-step"
                        };
                        println!("  {:<12} {:<24} {}", target, languages.display_name(&target), method);
                    }
                }
                None => {
                    println!("\n{:<12} {:<24} {}", "Code", "Name", "Aliases");
                    println!("{}", "-".repeat(60));
                    for entry in languages.entries() {
                        println!("{:<12} {:<24} {}", entry.code, entry.name, entry.aliases.join(", "));
                    }
                    println!("\nPivot language: {}", router.pivot());
                }
            }
        }
        Commands::Info => {
            println!("\nSystem Information:");
            println!("Model server: {}", workflow.config().server.endpoint);
            println!("Pivot language: {}", workflow.router().pivot());

            for backend in workflow.system_info().await {
                println!("\n{}", backend.name);
                let pairs: Vec<String> = backend.pairs.iter().map(|p| p.to_string()).collect();
                println!("  Pairs:  {}", pairs.join(", "));
                for (key, model_id) in &backend.models {
                    let status = match backend.loaded.iter().find(|(loaded, _)| loaded == key) {
                        Some((_, load_time)) => format!("loaded in {:.2}s", load_time.as_secs_f64()),
                        None => "not loaded".to_string(),
                    };
                    println!("  {:<14} {:<48} {}", key, model_id, status);
                }
            }
        }
        Commands::Check => {}
    }

    Ok(())
}

/// Print the error kind, and for unsupported pairs the direct alternatives
fn report_error(workflow: &Workflow, error: &TarjumaError) {
    eprintln!("Error [{}]: {}", error.kind(), error);

    if let TarjumaError::UnsupportedPair { src, tgt, available } = error {
        let languages = workflow.router().languages();
        let targets: Vec<String> = available
            .iter()
            .map(|code| format!("{} ({})", code, languages.display_name(code)))
            .collect();
        if !targets.is_empty() {
            eprintln!("Direct targets from {}: {}", src, targets.join(", "));
        }
        if workflow.router().is_multistep_supported(src, tgt) {
            eprintln!("Hint: re-run with --multi-step to translate via {}", workflow.router().pivot());
        }
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".tarjuma").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "tarjuma.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("tarjuma.log").display()
    );

    Ok(())
}
