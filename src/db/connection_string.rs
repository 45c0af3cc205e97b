//! SQLite connection string parsing.
//!
//! Accepted forms:
//!  - a bare path (`/var/lib/app.sqlite`, `:memory:`, `file:...` URIs).
//!    Text before the first `=` containing a path separator is a path too,
//!    so `/data/a=b.db` opens that file.
//!  - `key=value` pairs separated by `;`, keys case-insensitive:
//!    `Data Source`, `Mode`, `Busy Timeout`, `Foreign Keys`
//!
//! An in-memory database lives as long as its connection. The closing
//! session calls close it after every statement, so with `Mode=Memory` (or
//! `:memory:`) nothing survives from one such call to the next.

use crate::errors::{AppError, AppResult};
use rusqlite::{Connection, OpenFlags};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    #[default]
    ReadWriteCreate,
    ReadWrite,
    ReadOnly,
    Memory,
}

impl OpenMode {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "readwritecreate" => Some(OpenMode::ReadWriteCreate),
            "readwrite" => Some(OpenMode::ReadWrite),
            "readonly" => Some(OpenMode::ReadOnly),
            "memory" => Some(OpenMode::Memory),
            _ => None,
        }
    }

    fn flags(self) -> OpenFlags {
        let base = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        match self {
            OpenMode::ReadWriteCreate | OpenMode::Memory => {
                base | OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
            }
            OpenMode::ReadWrite => base | OpenFlags::SQLITE_OPEN_READ_WRITE,
            OpenMode::ReadOnly => base | OpenFlags::SQLITE_OPEN_READ_ONLY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub data_source: String,
    pub mode: OpenMode,
    pub busy_timeout: Option<Duration>,
    pub foreign_keys: Option<bool>,
}

impl ConnectOptions {
    pub fn parse(conn_string: &str) -> AppResult<Self> {
        let trimmed = conn_string.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty connection string"));
        }

        // A value without '=' (or a URI, which may carry '=' in its query) is a path.
        if is_bare_path(trimmed) {
            return Ok(Self {
                data_source: trimmed.to_string(),
                mode: OpenMode::default(),
                busy_timeout: None,
                foreign_keys: None,
            });
        }

        let mut data_source = None;
        let mut mode = OpenMode::default();
        let mut busy_timeout = None;
        let mut foreign_keys = None;

        for pair in trimmed.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| invalid(&format!("expected key=value, got '{pair}'")))?;
            let value = value.trim();
            let key: String = key
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();

            match key.as_str() {
                "datasource" | "filename" => data_source = Some(value.to_string()),
                "mode" => {
                    mode = OpenMode::parse(value)
                        .ok_or_else(|| invalid(&format!("unknown mode '{value}'")))?
                }
                "busytimeout" | "defaulttimeout" | "timeout" => {
                    let secs: u64 = value
                        .parse()
                        .map_err(|_| invalid(&format!("invalid timeout '{value}'")))?;
                    busy_timeout = Some(Duration::from_secs(secs));
                }
                "foreignkeys" => {
                    foreign_keys = Some(parse_bool(value).ok_or_else(|| {
                        invalid(&format!("invalid boolean for Foreign Keys: '{value}'"))
                    })?)
                }
                _ => return Err(invalid(&format!("unsupported keyword '{key}'"))),
            }
        }

        let data_source = match (data_source, mode) {
            (Some(ds), _) => ds,
            (None, OpenMode::Memory) => ":memory:".to_string(),
            (None, _) => return Err(invalid("missing Data Source")),
        };

        Ok(Self {
            data_source,
            mode,
            busy_timeout,
            foreign_keys,
        })
    }

    pub fn is_memory(&self) -> bool {
        self.mode == OpenMode::Memory || self.data_source == ":memory:"
    }

    /// Opens a fresh SQLite connection with these options.
    pub fn open(&self) -> AppResult<Connection> {
        let conn = if self.is_memory() {
            Connection::open_in_memory_with_flags(self.mode.flags())?
        } else {
            Connection::open_with_flags(&self.data_source, self.mode.flags())?
        };

        if let Some(timeout) = self.busy_timeout {
            conn.busy_timeout(timeout)?;
        }
        if let Some(enabled) = self.foreign_keys {
            let value = if enabled { "ON" } else { "OFF" };
            conn.execute_batch(&format!("PRAGMA foreign_keys = {value};"))?;
        }

        Ok(conn)
    }
}

fn is_bare_path(value: &str) -> bool {
    match value.split_once('=') {
        None => true,
        Some((head, _)) => value.starts_with("file:") || head.contains(['/', '\\']),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid(msg: &str) -> AppError {
    AppError::DatabaseOperationFailed(format!("invalid connection string: {msg}"))
}
