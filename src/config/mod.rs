pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "merchant-wizard")]
#[command(about = "Provision merchants and cashier teams through the admin API")]
pub struct CliConfig {
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the wizard from a request file and create every resource
    Provision {
        /// Path to the TOML request file
        #[arg(short, long)]
        file: String,

        /// Show the preview only, without calling the API
        #[arg(long)]
        dry_run: bool,

        /// Override run.retry_rounds from the request file
        #[arg(long)]
        retry_rounds: Option<u32>,

        /// Override run.report_path from the request file
        #[arg(long)]
        report: Option<String>,
    },

    /// Validate the request file and print the preview
    Preview {
        #[arg(short, long)]
        file: String,
    },

    /// Search existing users of the configured user type
    Search {
        #[arg(short, long)]
        file: String,

        /// Free-text keyword
        #[arg(long, conflicts_with = "id")]
        keyword: Option<String>,

        /// Look up one exact user id
        #[arg(long)]
        id: Option<String>,
    },

    /// Show the operator the configured credentials belong to
    Whoami {
        #[arg(short, long)]
        file: String,
    },
}

#[cfg(feature = "cli")]
impl Command {
    pub fn file(&self) -> &str {
        match self {
            Command::Provision { file, .. }
            | Command::Preview { file }
            | Command::Search { file, .. }
            | Command::Whoami { file } => file,
        }
    }
}
