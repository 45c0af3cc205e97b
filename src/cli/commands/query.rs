use crate::cli::commands::open_session;
use crate::cli::params::build_statement;
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::db::dataset::DataTable;
use crate::errors::AppResult;
use crate::export::{self, ExportFormat};
use crate::ui::messages::info;
use crate::utils::path::expand_tilde;
use crate::utils::table;
use std::io::{self, IsTerminal, Write};

/// Handle the `query` command: prints a table, or CSV/JSON to stdout or a file.
pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    if let Commands::Query {
        statement,
        format,
        file,
        force,
    } = &cli.command
    {
        let stmt = build_statement(statement)?;
        let mut session = open_session(cli, cfg)?;

        let data_set = session.get_data_set(stmt)?;
        let Some(result) = data_set.first() else {
            info("Statement returned no result set.");
            return Ok(());
        };

        match (file, format) {
            (Some(path), fmt) => {
                let fmt = fmt.unwrap_or(ExportFormat::Csv);
                export::export_table(result, fmt, &expand_tilde(path), *force)?;
            }
            (None, Some(fmt)) => write_stdout(result, *fmt)?,
            (None, None) => print_table(result, cfg),
        }
    }
    Ok(())
}

fn write_stdout(result: &DataTable, format: ExportFormat) -> AppResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        ExportFormat::Csv => export::write_csv(result, &mut out)?,
        ExportFormat::Json => export::write_json(result, &mut out)?,
    }
    out.flush()?;
    Ok(())
}

fn print_table(result: &DataTable, cfg: &Config) {
    let separator = cfg.separator_char.chars().next().unwrap_or('-');
    let color = io::stdout().is_terminal();
    print!("{}", table::render(result, separator, color));
    info(format!("{} row(s)", result.row_count()));
}
