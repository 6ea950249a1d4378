pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use certdesk_core::config::{AppConfig, LoadOptions, LogFormat};
use certdesk_core::drafts::DraftSlot;
use clap::{Parser, Subcommand};

use crate::commands::draft::DraftOperation;
use crate::commands::report::ReportOperation;

#[derive(Debug, Parser)]
#[command(
    name = "certdesk",
    about = "Certdesk operator CLI",
    long_about = "Manage certification drafts, validate inspection reports, and operate the Certdesk database.",
    after_help = "Examples:\n  certdesk migrate\n  certdesk draft show --slot partner\n  certdesk draft set --patch '{\"certificate_type_id\": 1}'\n  certdesk report validate --certificate CERT-DEMO-0001 --data report.json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo certificate catalog and inspection fixture")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Work with the locally persisted certification draft of a slot")]
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },
    #[command(about = "Validate or submit an inspection report for a certificate")]
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },
}

#[derive(Debug, Subcommand)]
enum DraftAction {
    #[command(about = "Print the draft and its step navigation")]
    Show {
        #[arg(long, default_value = "client")]
        slot: DraftSlot,
    },
    #[command(about = "Merge a JSON patch into the draft")]
    Set {
        #[arg(long, default_value = "client")]
        slot: DraftSlot,
        #[arg(long, help = "JSON object with the draft keys to change")]
        patch: String,
    },
    #[command(about = "Advance to the next step when the current one is complete")]
    Next {
        #[arg(long, default_value = "client")]
        slot: DraftSlot,
    },
    #[command(about = "Return to the previous step")]
    Back {
        #[arg(long, default_value = "client")]
        slot: DraftSlot,
    },
    #[command(about = "Discard the draft and start over")]
    Clear {
        #[arg(long, default_value = "client")]
        slot: DraftSlot,
    },
    #[command(about = "Create a certificate from a completed draft")]
    Submit {
        #[arg(long, default_value = "client")]
        slot: DraftSlot,
    },
}

#[derive(Debug, Subcommand)]
enum ReportAction {
    #[command(about = "Validate report values against the certificate's effective schema")]
    Validate {
        #[arg(long)]
        certificate: String,
        #[arg(long, help = "JSON object, or array of sub-form objects")]
        data: PathBuf,
    },
    #[command(about = "Validate and store the report, marking the certificate inspected")]
    Submit {
        #[arg(long)]
        certificate: String,
        #[arg(long, help = "JSON object, or array of sub-form objects")]
        data: PathBuf,
    },
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    // stdout carries the JSON command outcome.
    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Draft { action } => {
            let (slot, operation) = match action {
                DraftAction::Show { slot } => (slot, DraftOperation::Show),
                DraftAction::Set { slot, patch } => (slot, DraftOperation::Set { patch }),
                DraftAction::Next { slot } => (slot, DraftOperation::Next),
                DraftAction::Back { slot } => (slot, DraftOperation::Back),
                DraftAction::Clear { slot } => (slot, DraftOperation::Clear),
                DraftAction::Submit { slot } => (slot, DraftOperation::Submit),
            };
            commands::draft::run(slot, operation)
        }
        Command::Report { action } => match action {
            ReportAction::Validate { certificate, data } => {
                commands::report::run(&certificate, &data, ReportOperation::Validate)
            }
            ReportAction::Submit { certificate, data } => {
                commands::report::run(&certificate, &data, ReportOperation::Submit)
            }
        },
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
