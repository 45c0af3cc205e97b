use crate::cli::commands::open_session;
use crate::cli::params::build_statement;
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::info;

/// Handle the `scalar` command: prints the first column of the first row.
pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    if let Commands::Scalar { statement } = &cli.command {
        let stmt = build_statement(statement)?;
        let mut session = open_session(cli, cfg)?;

        match session.execute_scalar(stmt)? {
            Some(value) => println!("{value}"),
            None => info("Statement returned no rows."),
        }
    }
    Ok(())
}
