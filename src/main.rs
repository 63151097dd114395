//! scorm-localizer - SCORM course translation
//!
//! Entry point for the command line tool: imports SCORM packages into a
//! local library and produces translated copies of them.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scorm_localizer::cli::{Args, CacheAction, Commands};
use scorm_localizer::config::Config;
use scorm_localizer::language::Language;
use scorm_localizer::media::MediaProcessorFactory;
use scorm_localizer::setup::SetupManager;
use scorm_localizer::translate::{age_secs, format_duration, TranslationCache};
use scorm_localizer::workflow::Workflow;

const DEFAULT_CONFIG: &str = "scorm-localizer.toml";
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG).exists() {
                Config::from_file(DEFAULT_CONFIG)?
            } else {
                Config::default()
            }
        }
    };

    // Setup logging to both console and file
    setup_logging(args.verbose, &config.paths().log_dir)?;
    info!("Workspace: {}", config.workspace.root.display());

    match args.command {
        Commands::Init { output } => {
            config.save_to_file(&output)?;
            println!("Wrote configuration to {}", output.display());
        }
        Commands::Check => {
            let setup = SetupManager::new(&config)?;
            let workflow = Workflow::new(config.clone())?;
            let media = MediaProcessorFactory::create_processor(config.media.clone());

            let results = setup.run_checks(&config, workflow.translator(), media.as_ref()).await;
            println!("\n{:<14} {:<8} {}", "Check", "Status", "Detail");
            println!("{}", "-".repeat(70));
            for result in &results {
                let status = if result.passed { "ok" } else { "FAILED" };
                println!("{:<14} {:<8} {}", result.name, status, result.detail);
            }
            if results.iter().any(|r| !r.passed) {
                anyhow::bail!("Some checks failed");
            }
        }
        Commands::Import { file } => {
            SetupManager::new(&config)?;
            let workflow = Workflow::new(config)?;
            let record = workflow.import_package(&file).await?;
            println!("Imported {} as {}", record.original_name, record.id);
            match &record.launch_file {
                Some(launch) => println!("Launch file: {}", launch),
                None => println!("Launch file: not detected"),
            }
        }
        Commands::Translate { package, language, audio } => {
            let language = Language::resolve(&language)?;
            SetupManager::new(&config)?;
            let workflow = Workflow::new(config)?;
            run_translation(&workflow, package, language, audio).await?;
        }
        Commands::Launch { package, language } => {
            let workflow = Workflow::new(config)?;
            let launch = workflow.launch_file(&package, &language).await?;
            println!("{}", launch.display());
        }
        Commands::List => {
            let workflow = Workflow::new(config)?;
            let courses = workflow.library()?;
            if courses.is_empty() {
                println!("No packages imported yet.");
            } else {
                println!("\n{:<40} {:<20} {:<30}", "Package", "Uploaded", "Translations");
                println!("{}", "-".repeat(90));
                for course in courses {
                    let translations: Vec<&str> = course.translations.keys().map(String::as_str).collect();
                    println!(
                        "{:<40} {:<20} {:<30}",
                        course.id,
                        course.uploaded_at.format("%Y-%m-%d %H:%M"),
                        translations.join(", ")
                    );
                }
            }
        }
        Commands::Delete { package } => {
            let workflow = Workflow::new(config)?;
            let removed = workflow.delete_course(&package).await?;
            println!("Deleted {} ({} items removed)", package, removed);
        }
        Commands::Text { text, language } => {
            let language = Language::resolve(&language)?;
            let workflow = Workflow::new(config)?;
            println!("{}", workflow.translate_snippet(&text, language).await?);
        }
        Commands::Cache { action } => {
            let cache = TranslationCache::new(config.paths().translation_cache);
            match action {
                CacheAction::List => {
                    let entries = cache.list().await?;
                    if entries.is_empty() {
                        println!("No cached translations found.");
                    } else {
                        println!("\n{:<10} {:<8} {:<10} {:<50}", "Provider", "Lang", "Cached", "Text");
                        println!("{}", "-".repeat(80));
                        for entry in entries {
                            let text: String = entry.source_text.chars().take(50).collect();
                            println!(
                                "{:<10} {:<8} {:<10} {:<50}",
                                entry.provider,
                                entry.target_language,
                                format_duration(age_secs(entry.cached_at)),
                                text
                            );
                        }
                    }
                }
                CacheAction::Clear => {
                    let count = cache.clear().await?;
                    println!("Cleared {} cached translations.", count);
                }
            }
        }
    }

    Ok(())
}

/// Run the job in the background and follow its progress
async fn run_translation(workflow: &Workflow, package: String, language: Language, audio: bool) -> Result<()> {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")?.progress_chars("##-"),
    );

    let handle = workflow.spawn_translation(package.clone(), language, audio);
    while !handle.is_finished() {
        let progress = workflow.progress().get(&package);
        if !progress.is_idle() {
            bar.set_position(u64::from(progress.percent));
            bar.set_message(progress.message);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    match handle.await? {
        Ok(summary) => {
            bar.finish_with_message(format!("Translation complete ({})", language.name));
            println!("Text files: {} ({} strings replaced)", summary.text_files, summary.strings_replaced);
            if audio {
                println!(
                    "Audio: {} translated, {} kept original",
                    summary.audio.translated, summary.audio.restored
                );
            }
            println!("Archive: {}", summary.archive.display());
            Ok(())
        }
        Err(e) => {
            bar.abandon_with_message(format!("Error: {}", e));
            Err(e.into())
        }
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool, log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(log_dir, "scorm-localizer.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("scorm-localizer.log").display());

    Ok(())
}
