use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use threadline_monitoring::MonitoringConfig;

mod commands;

use commands::Report;

#[derive(Parser)]
#[command(
    name = "threadline",
    version,
    about = "Inspect and extend threads of linked notes in a vault"
)]
struct Cli {
    /// Vault directory holding the notes
    #[arg(long, value_name = "DIR", default_value = ".")]
    vault: PathBuf,

    /// YAML configuration file (defaults to `<vault>/.threadline.yaml` when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every note with its predecessor
    Nodes,
    /// Show the full thread a note belongs to and its reply chains
    Thread {
        /// Note path or reference, e.g. `journal/Start.md` or `Start`
        note: String,
    },
    /// Create a new note directly after a note
    Insert {
        /// Note path or reference to insert after
        note: String,
    },
    /// Report cycles and dangling references
    Check,
}

fn print_report<R: Report>(report: &R, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(report).context("Failed to serialize output")?;
        println!("{}", text);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let monitoring_config = MonitoringConfig {
        enable_json_logging: cli.json,
        ..MonitoringConfig::default()
    }
    .with_verbosity(cli.verbose);
    threadline_monitoring::init_logging(&monitoring_config)
        .context("Failed to initialize logging")?;

    let config = commands::load_config(&cli.vault, cli.config.as_deref())
        .context("Failed to load configuration")?;
    let (workspace, summary) = commands::open_workspace(&cli.vault, config)
        .await
        .with_context(|| format!("Failed to read vault {}", cli.vault.display()))?;

    match cli.command {
        Commands::Nodes => print_report(&commands::run_nodes(&workspace).await, cli.json),
        Commands::Thread { note } => {
            let view = commands::run_thread(&workspace, &note)
                .await
                .with_context(|| format!("Failed to show thread of {}", note))?;
            print_report(&view, cli.json)
        }
        Commands::Insert { note } => {
            let created = commands::run_insert(&workspace, &note)
                .await
                .with_context(|| format!("Failed to insert after {}", note))?;
            print_report(&created, cli.json)
        }
        Commands::Check => {
            let report = commands::run_check(&workspace, summary).await;
            print_report(&report, cli.json)?;
            if report.cycles.is_empty() {
                Ok(())
            } else {
                anyhow::bail!("{} notes are part of a prev cycle", report.cycles.len())
            }
        }
    }
}
