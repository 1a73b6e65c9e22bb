mod commands;
mod config;
mod logging;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// PACS node tools.
#[derive(Parser)]
#[command(name = "pacs", version, about = "PACS node: PIX identity resolution and storage commitment")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a patient identifier into its cross-referenced aliases
    PixQuery {
        /// Patient identifier in CX form, e.g. `P1^^^HOSP&1.2.3&ISO`
        pid: String,
        /// Path to the node configuration TOML
        #[arg(long)]
        config: PathBuf,
    },

    /// Compute the storage commitment result for a request
    Stgcmt {
        /// Path to the request JSON (transaction_uid, requested)
        #[arg(long)]
        request: PathBuf,
        /// Path to the instance catalog JSON (array of stored instance records)
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Validate a node configuration file
    CheckConfig {
        /// Path to the node configuration TOML
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::PixQuery { pid, config } => {
            commands::pix::cmd_pix_query(&pid, &config, cli.output, cli.quiet);
        }
        Commands::Stgcmt { request, catalog } => {
            commands::stgcmt::cmd_stgcmt(&request, &catalog, cli.output, cli.quiet);
        }
        Commands::CheckConfig { file } => {
            commands::check::cmd_check_config(&file, cli.output, cli.quiet);
        }
    }
}

/// Report an error to stderr in the requested format.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}

/// A multi-threaded runtime for one command, or exit.
pub(crate) fn runtime(output: OutputFormat, quiet: bool) -> tokio::runtime::Runtime {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(&format!("failed to create tokio runtime: {}", e), output, quiet);
            process::exit(1);
        }
    }
}
