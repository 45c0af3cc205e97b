use crate::cli::commands::open_session;
use crate::cli::params::build_statement;
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::errors::AppResult;

/// Handle the `exec` command: prints the number of affected rows.
pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    if let Commands::Exec { statement } = &cli.command {
        let stmt = build_statement(statement)?;
        let mut session = open_session(cli, cfg)?;

        let affected = session.execute_non_query(stmt)?;
        println!("{affected}");
    }
    Ok(())
}
