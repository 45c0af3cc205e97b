//! dbhelper library root.
//! Exposes the database session, its configuration collaborator, the
//! table export helpers and the CLI front end built on top of them.

pub mod cli;
pub mod config;
pub mod db;
pub mod errors;
pub mod export;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use utils::path::expand_tilde;

pub use config::{ConnectionStringSource, DEFAULT_CONNECTION_NAME};
pub use db::{
    CommandType, ConnectionState, DataAdapter, DataReader, DataSet, DataTable, DbType, DbValue,
    Parameter, ParameterDirection, Session, Statement,
};
pub use errors::{AppError, AppResult};

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Config { .. } => cli::commands::config::handle(&cli.command, cfg),
        Commands::Exec { .. } => cli::commands::exec::handle(cli, cfg),
        Commands::Scalar { .. } => cli::commands::scalar::handle(cli, cfg),
        Commands::Query { .. } => cli::commands::query::handle(cli, cfg),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    let config_path = cli.config.as_deref().map(expand_tilde);
    let cfg = Config::load(config_path.as_deref())?;

    dispatch(&cli, &cfg)
}
