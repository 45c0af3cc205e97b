use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Connection string name resolved when none is given explicitly.
pub const DEFAULT_CONNECTION_NAME: &str = "DbHelper";

/// Named connection-string lookup used when a session is constructed.
pub trait ConnectionStringSource {
    fn connection_string(&self, name: &str) -> Option<String>;

    /// Named SQL bodies run for `CommandType::StoredProcedure`.
    fn procedures(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

impl ConnectionStringSource for HashMap<String, String> {
    fn connection_string(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl ConnectionStringSource for BTreeMap<String, String> {
    fn connection_string(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_connection_name")]
    pub default_connection: String,
    #[serde(default)]
    pub connection_strings: BTreeMap<String, String>,
    #[serde(default)]
    pub procedures: BTreeMap<String, String>,
    #[serde(default = "default_separator_char")]
    pub separator_char: String,
}

fn default_connection_name() -> String {
    DEFAULT_CONNECTION_NAME.to_string()
}

fn default_separator_char() -> String {
    "-".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::with_data_source(&Self::database_file().to_string_lossy())
    }
}

impl ConnectionStringSource for Config {
    fn connection_string(&self, name: &str) -> Option<String> {
        self.connection_strings.get(name).cloned()
    }

    fn procedures(&self) -> BTreeMap<String, String> {
        self.procedures.clone()
    }
}

impl Config {
    /// Config with a single default connection pointing at `data_source`.
    pub fn with_data_source(data_source: &str) -> Self {
        let mut connection_strings = BTreeMap::new();
        connection_strings.insert(
            DEFAULT_CONNECTION_NAME.to_string(),
            format!("Data Source={data_source}"),
        );
        Self {
            default_connection: default_connection_name(),
            connection_strings,
            procedures: BTreeMap::new(),
            separator_char: default_separator_char(),
        }
    }

    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("dbhelper")
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".dbhelper")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("dbhelper.conf")
    }

    /// Return the full path of the default SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("dbhelper.sqlite")
    }

    /// Load configuration from `path` (or the standard location).
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_file);

        if !path.exists() {
            log::debug!("config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Write a default configuration (unless `is_test`) and create the
    /// database file if it is missing. Returns the database path.
    pub fn init_all(
        config_path: Option<&Path>,
        custom_db: Option<&str>,
        is_test: bool,
    ) -> AppResult<(Self, PathBuf)> {
        let dir = Self::config_dir();

        let db_path = match custom_db {
            Some(name) => {
                let p = Path::new(name);
                if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    dir.join(p)
                }
            }
            None => Self::database_file(),
        };

        let config = Self::with_data_source(&db_path.to_string_lossy());

        if !is_test {
            let cfg_path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(Self::config_file);
            config.save(&cfg_path)?;
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        if !db_path.exists() {
            fs::File::create(&db_path)?;
        }

        Ok((config, db_path))
    }

    /// Problems that would make sessions fail: returns one line per issue.
    pub fn check(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.connection_strings.contains_key(&self.default_connection) {
            issues.push(format!(
                "default connection '{}' is not defined in connection_strings",
                self.default_connection
            ));
        }
        for (name, value) in &self.connection_strings {
            if value.trim().is_empty() {
                issues.push(format!("connection string '{name}' is empty"));
            }
        }
        if self.separator_char.chars().count() != 1 {
            issues.push(format!(
                "separator_char should be a single character, got '{}'",
                self.separator_char
            ));
        }
        for (name, body) in &self.procedures {
            if body.trim().is_empty() {
                issues.push(format!("procedure '{name}' has an empty body"));
            }
        }

        issues
    }
}
