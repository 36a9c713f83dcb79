use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use depscope::config;
use depscope::manifest::parse_manifest;
use depscope::store::{AnnotationStore, Classification};
use depscope::version::npm::NpmRegistry;
use depscope::version::orchestrator::{Orchestrator, ResolutionOutcome};
use depscope::version::types::PackageSnapshot;

#[derive(Parser)]
#[command(name = "depscope")]
#[command(version, about = "Review a dependency manifest against the npm registry")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve every manifest dependency and print its version snapshots
    Review {
        /// Manifest file to read; defaults to the stored manifest text
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Print snapshots as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle a package's review classification (toggling the active value clears it)
    Mark {
        package: String,
        classification: Classification,
    },
    /// Set the free-text note for a package
    Note { package: String, text: String },
    /// Reset classifications, notes, and the stored manifest text
    Clear,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = init_logging()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

fn init_logging() -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(config::data_dir())
        .with_context(|| format!("Failed to create data dir {:?}", config::data_dir()))?;

    let file_appender = tracing_appender::rolling::never(config::data_dir(), "depscope.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut store = AnnotationStore::open(&config::db_path())?;

    match cli.command {
        Command::Review { manifest, json } => review(&mut store, manifest, json).await,
        Command::Mark {
            package,
            classification,
        } => {
            let next = store.toggle_classification(&package, classification)?;
            match next {
                Some(classification) => println!("{}: {}", package, classification.as_str()),
                None => println!("{}: unset", package),
            }
            Ok(())
        }
        Command::Note { package, text } => {
            store.set_note(&package, &text)?;
            println!("{}: note saved", package);
            Ok(())
        }
        Command::Clear => {
            store.clear_all()?;
            println!("cleared");
            Ok(())
        }
    }
}

async fn review(
    store: &mut AnnotationStore,
    manifest_path: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let text = match &manifest_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {:?}", path))?,
        None => {
            let stored = store.manifest_text().to_string();
            anyhow::ensure!(
                !stored.is_empty(),
                "no manifest stored; pass --manifest <path>"
            );
            stored
        }
    };

    let dependencies = match parse_manifest(&text) {
        Ok(dependencies) => dependencies,
        Err(e) => {
            // Invalid manifest: report and leave previously stored state alone
            eprintln!("manifest invalid: {}", e);
            return Ok(());
        }
    };

    store.set_manifest_text(&text)?;

    let orchestrator = Orchestrator::new(NpmRegistry::public()?);
    let batch = orchestrator.resolve_all(&dependencies).await;
    if !orchestrator.is_current(&batch) {
        return Ok(());
    }

    if json {
        let items: Vec<_> = batch
            .outcomes
            .iter()
            .map(|outcome| match outcome {
                ResolutionOutcome::Resolved(snapshot) => {
                    let mut value = serde_json::to_value(snapshot).unwrap_or_else(|_| json!({}));
                    if let Some(object) = value.as_object_mut() {
                        if let Some(classification) = store.classification(&snapshot.name) {
                            object.insert(
                                "classification".to_string(),
                                json!(classification.as_str()),
                            );
                        }
                        if let Some(note) = store.note(&snapshot.name) {
                            object.insert("note".to_string(), json!(note));
                        }
                    }
                    value
                }
                ResolutionOutcome::Failed { name, error } => {
                    json!({ "name": name, "error": error.to_string() })
                }
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    for outcome in &batch.outcomes {
        match outcome {
            ResolutionOutcome::Resolved(snapshot) => print_snapshot(store, snapshot),
            ResolutionOutcome::Failed { name, error } => {
                println!("{:<30} fetch failed: {}", name, error);
            }
        }
    }

    Ok(())
}

fn print_snapshot(store: &AnnotationStore, snapshot: &PackageSnapshot) {
    let marker = store
        .classification(&snapshot.name)
        .map(|c| c.as_str())
        .unwrap_or("-");

    let current = format!(
        "{}{}",
        snapshot.version,
        format_date(snapshot.version_published)
    );
    let next = snapshot
        .next_version
        .as_ref()
        .map(|v| format!("{}{}", v, format_date(snapshot.next_version_published)))
        .unwrap_or_else(|| "-".to_string());
    let latest = snapshot
        .latest_version
        .as_ref()
        .map(|v| format!("{}{}", v, format_date(snapshot.latest_version_published)))
        .unwrap_or_else(|| "-".to_string());

    println!(
        "{:<30} [{:<6}] current {:<28} next {:<28} latest {}",
        snapshot.name, marker, current, next, latest
    );

    if let Some(note) = store.note(&snapshot.name)
        && !note.is_empty()
    {
        println!("{:<30} note: {}", "", note);
    }
}

fn format_date(published: Option<chrono::DateTime<chrono::Utc>>) -> String {
    published
        .map(|t| format!(" ({})", t.format("%Y-%m-%d")))
        .unwrap_or_default()
}
