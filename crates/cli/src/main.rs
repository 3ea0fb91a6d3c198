//! provision-notify CLI
//!
//! Publishes a notification about a finished provisioning run to an SNS
//! topic. Meant to be called by the configuration-management client at the
//! end of every run.

mod input;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use provision_notify_aws::SnsPublisherFactory;
use provision_notify_core::format::render_message;
use provision_notify_core::{
    LogPublisherFactory, PublisherFactory, ReportOutcome, Reporter, RunReport,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

/// Publish a provisioning run notification.
#[derive(Parser, Debug)]
#[command(name = "provision-notify", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        short,
        long,
        env = "PROVISION_NOTIFY_CONFIG",
        default_value = "provision-notify.toml",
        global = true
    )]
    config: PathBuf,

    /// Run report JSON file, or `-` for stdin.
    #[arg(
        short,
        long,
        env = "PROVISION_NOTIFY_REPORT",
        default_value = "-",
        global = true
    )]
    report: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration and publish the notification (default).
    Send {
        /// Log the message instead of publishing it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the rendered subject and body without publishing.
    Render,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = input::load_config(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    let report = input::load_report(&cli.report).context("loading run report")?;

    match cli.command.unwrap_or(Command::Send { dry_run: false }) {
        Command::Send { dry_run: true } => {
            send(Reporter::new(config, LogPublisherFactory), &report).await
        }
        Command::Send { dry_run: false } => {
            send(Reporter::new(config, SnsPublisherFactory), &report).await
        }
        Command::Render => {
            let message = render_message(&config, &report)?;
            println!("Subject: {}\n\n{}", message.subject, message.body);
            Ok(())
        }
    }
}

async fn send<F: PublisherFactory>(
    mut reporter: Reporter<F>,
    report: &RunReport,
) -> anyhow::Result<()> {
    match reporter.report(report).await? {
        ReportOutcome::Published { message_id } => println!("{message_id}"),
        ReportOutcome::Skipped => info!("nothing published"),
    }
    Ok(())
}
