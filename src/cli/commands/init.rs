use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::Session;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};
use crate::utils::path::expand_tilde;
use std::path::PathBuf;

/// Handle the `init` command
///
/// This initializes:
///  - the config directory (if missing)
///  - the configuration file (skipped in test mode)
///  - the SQLite database file, verified by opening a session on it
pub fn handle(cli: &Cli) -> AppResult<()> {
    let config_path: Option<PathBuf> = cli.config.as_deref().map(expand_tilde);
    let db = cli.db.as_deref().map(expand_tilde);

    let (cfg, db_path) = Config::init_all(
        config_path.as_deref(),
        db.as_deref().and_then(|p| p.to_str()),
        cli.test,
    )?;

    if !cli.test {
        let shown = config_path.unwrap_or_else(Config::config_file);
        info(format!("Config file : {}", shown.display()));
    }
    info(format!("Database    : {}", db_path.display()));

    // Open and close once so a bad path fails here and not on first use.
    let mut session = Session::new(&cfg)?;
    session.open_connection()?;
    session.close_connection();

    success("dbhelper initialization completed!");
    Ok(())
}
