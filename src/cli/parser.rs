use clap::{Parser, Subcommand};

/// Command-line interface definition for rJobTracker
/// Job-application tracker backend: job categories in SQLite, entries in a spreadsheet
#[derive(Parser)]
#[command(
    name = "rjobtracker",
    version = env!("CARGO_PKG_VERSION"),
    about = "A small job-application tracker backend: bounded job categories in SQLite, entries synced to a spreadsheet",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Run the HTTP API
    Serve {
        #[arg(long, help = "Listen port (overrides listen_addr and PORT)")]
        port: Option<u16>,
    },

    /// Inspect the configuration file
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing fields with their default values")]
        migrate: bool,
    },

    /// Manage job categories
    Jobs {
        #[command(subcommand)]
        action: JobsAction,
    },

    /// Append the records of a JSON array file to a job's sheet
    Sync {
        /// Job name (sheet title)
        job: String,

        /// File holding a JSON array of records
        #[arg(value_name = "FILE")]
        file: String,
    },

    /// Print the internal audit log
    Log,
}

#[derive(Subcommand)]
pub enum JobsAction {
    /// List all jobs
    List {
        #[arg(long, help = "Print as JSON")]
        json: bool,
    },

    /// Create a job
    Add { name: String, color: String },

    /// Delete a job by id
    Del {
        id: i64,

        #[arg(long, short = 'y', help = "Skip the confirmation prompt")]
        yes: bool,
    },
}
