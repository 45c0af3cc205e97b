use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::{success, warning};

/// Handle the `config` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Config {
        print_config,
        check,
    } = cmd
    {
        if *print_config {
            print!("{}", serde_yaml::to_string(cfg)?);
        }

        if *check {
            let issues = cfg.check();
            if issues.is_empty() {
                success("Configuration OK.");
            } else {
                for issue in &issues {
                    warning(issue);
                }
            }
        }
    }

    Ok(())
}
