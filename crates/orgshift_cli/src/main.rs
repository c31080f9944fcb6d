mod commands;
mod helpers;
mod logging;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use orgshift_core::layout::require_id;
use orgshift_core::{MergeOperation, ReorgPlanner, UserLocation};
use tracing::info;

use crate::output::Output;

#[derive(Parser, Debug)]
#[command(name = "orgshift")]
#[command(about = "Reorganize tenant data in a hierarchical document store")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Store file path (overrides config and ORGSHIFT_STORE)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Print machine-readable JSON reports
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge one flat user record and its nested collections into another
    MergeUser {
        /// User id to merge from
        source: String,
        /// User id to merge into
        target: String,
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
        /// Keep the source record and its nested collections
        #[arg(long)]
        no_delete: bool,
    },
    /// Merge two users of an organization and fix the lookup index
    MergeOrgUser {
        #[arg(long)]
        org_id: String,
        /// User id to merge from
        #[arg(long)]
        source: String,
        /// User id to merge into
        #[arg(long)]
        target: String,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        no_delete: bool,
    },
    /// Copy location_settings/{org} under the organization
    MigrateLocationSettings {
        #[arg(long)]
        org_id: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Move an organization's flat collections under organizations/{org}
    MigrateToHierarchy {
        #[arg(long)]
        org_id: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// List organization users sharing an email address
    ScanDuplicates {
        #[arg(long)]
        org_id: String,
    },
    /// Check the hierarchy of an organization after migration
    VerifyHierarchy {
        #[arg(long)]
        org_id: String,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
}

impl Commands {
    /// Reject unusable identifiers before the store is opened.
    fn validate(&self) -> orgshift_core::Result<()> {
        match self {
            Commands::MergeUser { source, target, .. } => {
                require_id("source", source)?;
                require_id("target", target)
            }
            Commands::MergeOrgUser {
                org_id,
                source,
                target,
                ..
            } => {
                require_id("org-id", org_id)?;
                require_id("source", source)?;
                require_id("target", target)
            }
            Commands::MigrateLocationSettings { org_id, .. }
            | Commands::MigrateToHierarchy { org_id, .. }
            | Commands::ScanDuplicates { org_id }
            | Commands::VerifyHierarchy { org_id } => require_id("org-id", org_id),
            Commands::Config { .. } => Ok(()),
        }
    }
}

/// Exit status for a command line that clap refused. Help and version
/// requests are not failures.
fn parse_exit_code(err: &clap::Error) -> u8 {
    if err.use_stderr() { 1 } else { 0 }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }));

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(parse_exit_code(&err));
        }
    };

    if let Err(err) = cli.command.validate() {
        eprintln!("{:?}", miette::Report::new(err));
        return ExitCode::FAILURE;
    }

    let _guard = logging::init(cli.debug);
    info!(
        "Logging initialized. Logs are being written to: {:?}",
        logging::log_dir()
    );

    match run(cli).await {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{:?}", report);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> miette::Result<ExitCode> {
    let output = if cli.json { Output::json() } else { Output::new() };
    let config = helpers::load_config(cli.config.as_ref(), cli.store).await?;

    if let Commands::Config { cmd } = &cli.command {
        match cmd {
            ConfigCommands::Show => commands::config::show(&config, &output).await?,
        }
        return Ok(ExitCode::SUCCESS);
    }

    let store = helpers::open_store(&config).await?;
    let planner = ReorgPlanner::new(store.clone(), &config);

    let code = match cli.command {
        Commands::MergeUser {
            source,
            target,
            dry_run,
            no_delete,
        } => {
            let op = MergeOperation {
                source: UserLocation::flat(source),
                target: UserLocation::flat(target),
                dry_run,
                delete_source: !no_delete,
            };
            commands::merge::run(&planner, op, &output).await?;
            ExitCode::SUCCESS
        }
        Commands::MergeOrgUser {
            org_id,
            source,
            target,
            dry_run,
            no_delete,
        } => {
            let op = MergeOperation {
                source: UserLocation::in_tenant(org_id.as_str(), source),
                target: UserLocation::in_tenant(org_id, target),
                dry_run,
                delete_source: !no_delete,
            };
            commands::merge::run(&planner, op, &output).await?;
            ExitCode::SUCCESS
        }
        Commands::MigrateLocationSettings { org_id, dry_run } => {
            commands::migrate::location_settings(&planner, &org_id, dry_run, &output).await?;
            ExitCode::SUCCESS
        }
        Commands::MigrateToHierarchy { org_id, dry_run } => {
            commands::migrate::to_hierarchy(&planner, &org_id, dry_run, &output).await?;
            ExitCode::SUCCESS
        }
        Commands::ScanDuplicates { org_id } => {
            commands::scan::duplicates(store.as_ref(), &org_id, &output).await?;
            ExitCode::SUCCESS
        }
        Commands::VerifyHierarchy { org_id } => {
            commands::verify::hierarchy(store.as_ref(), &config.verify, &org_id, &output).await?
        }
        Commands::Config { .. } => ExitCode::SUCCESS,
    };

    store.close().await;
    Ok(code)
}
