use crate::export::ExportFormat;
use clap::{Args, Parser, Subcommand};

/// Command-line interface definition for dbhelper
/// Run statements against a configured SQLite connection
#[derive(Parser)]
#[command(
    name = "dbhelper",
    version = env!("CARGO_PKG_VERSION"),
    about = "Run scalar, non-query and table queries against a named SQLite connection",
    long_about = None
)]
pub struct Cli {
    /// Configuration file (default: ~/.dbhelper/dbhelper.conf)
    #[arg(global = true, long = "config", value_name = "FILE")]
    pub config: Option<String>,

    /// Connection string name to use (default: the config's default_connection)
    #[arg(global = true, long = "conn", value_name = "NAME")]
    pub conn: Option<String>,

    /// Override the database path of the selected connection
    #[arg(global = true, long = "db", value_name = "PATH")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Statement text plus how to interpret and parameterize it.
#[derive(Args, Debug, Clone)]
pub struct StatementArgs {
    /// SQL text, procedure name (--proc) or table name (--table)
    pub sql: String,

    /// Bound parameter, repeatable: NAME=VALUE or NAME:TYPE=VALUE (e.g. @id:int=42)
    #[arg(short = 'p', long = "param", value_name = "PARAM")]
    pub params: Vec<String>,

    /// Treat the text as the name of a procedure from the configuration
    #[arg(long = "proc", conflicts_with = "table")]
    pub procedure: bool,

    /// Treat the text as a table name and select all of its rows
    #[arg(long = "table")]
    pub table: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the configuration file and the database
    Init,

    /// Show or validate the configuration file
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(
            long = "check",
            help = "Check the configuration for missing or empty entries"
        )]
        check: bool,
    },

    /// Run a statement and print the number of affected rows
    Exec {
        #[command(flatten)]
        statement: StatementArgs,
    },

    /// Run a statement and print the first column of the first row
    Scalar {
        #[command(flatten)]
        statement: StatementArgs,
    },

    /// Run a query and print or export the resulting table
    Query {
        #[command(flatten)]
        statement: StatementArgs,

        /// Output format; a rendered table when omitted and printing to stdout
        #[arg(long, value_name = "FORMAT")]
        format: Option<ExportFormat>,

        /// Write the result to this file instead of stdout
        #[arg(long, value_name = "FILE")]
        file: Option<String>,

        /// Overwrite the output file without confirmation
        #[arg(long, short = 'f', requires = "file")]
        force: bool,
    },
}
