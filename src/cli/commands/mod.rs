pub mod config;
pub mod exec;
pub mod init;
pub mod query;
pub mod scalar;

use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::Session;
use crate::errors::AppResult;
use crate::utils::path::expand_tilde;

/// Session on the connection selected by `--conn` (or the configured
/// default), with `--db` replacing its data source.
pub(crate) fn open_session(cli: &Cli, cfg: &Config) -> AppResult<Session> {
    let name = cli.conn.as_deref().unwrap_or(&cfg.default_connection);
    let mut session = Session::with_name(cfg, name)?;

    if let Some(db) = &cli.db {
        let path = expand_tilde(db);
        session.set_connection_string(format!("Data Source={}", path.display()));
    }

    Ok(session)
}
