//! Named command parameters and their type tags.

use crate::db::value::{DATE_FORMAT, DATETIME_FORMAT, DbValue};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Declared type of a parameter. Binding coerces the value into the
/// storage class the tag stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    Integer,
    BigInt,
    Bit,
    Real,
    Decimal,
    Text,
    VarChar,
    Char,
    Blob,
    VarBinary,
    Date,
    DateTime,
}

impl DbType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "int" | "integer" => Some(DbType::Integer),
            "bigint" => Some(DbType::BigInt),
            "bit" | "bool" | "boolean" => Some(DbType::Bit),
            "real" | "float" | "double" => Some(DbType::Real),
            "decimal" | "numeric" => Some(DbType::Decimal),
            "text" | "nvarchar" => Some(DbType::Text),
            "varchar" => Some(DbType::VarChar),
            "char" | "nchar" => Some(DbType::Char),
            "blob" => Some(DbType::Blob),
            "varbinary" | "binary" => Some(DbType::VarBinary),
            "date" => Some(DbType::Date),
            "datetime" | "timestamp" => Some(DbType::DateTime),
            _ => None,
        }
    }

    fn is_textual(self) -> bool {
        matches!(self, DbType::Text | DbType::VarChar | DbType::Char)
    }

    fn is_binary(self) -> bool {
        matches!(self, DbType::Blob | DbType::VarBinary)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterDirection {
    #[default]
    Input,
    Output,
    InputOutput,
    ReturnValue,
}

impl ParameterDirection {
    /// Whether the value is sent to the database when binding.
    pub fn is_bound(self) -> bool {
        matches!(self, ParameterDirection::Input | ParameterDirection::InputOutput)
    }

    /// Whether the value is filled from the first returned row.
    pub fn receives_row(self) -> bool {
        matches!(
            self,
            ParameterDirection::Output | ParameterDirection::InputOutput
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub db_type: DbType,
    pub size: Option<usize>,
    pub value: DbValue,
    pub direction: ParameterDirection,
}

impl Parameter {
    pub fn new(name: impl Into<String>, db_type: DbType, value: impl Into<DbValue>) -> Self {
        Self {
            name: name.into(),
            db_type,
            size: None,
            value: value.into(),
            direction: ParameterDirection::Input,
        }
    }

    pub fn sized(
        name: impl Into<String>,
        db_type: DbType,
        size: usize,
        value: impl Into<DbValue>,
    ) -> Self {
        Self {
            size: Some(size),
            ..Self::new(name, db_type, value)
        }
    }

    /// Output parameter with no initial value.
    pub fn output(name: impl Into<String>, db_type: DbType) -> Self {
        Self::new(name, db_type, DbValue::Null).with_direction(ParameterDirection::Output)
    }

    pub fn with_direction(mut self, direction: ParameterDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Name without its `@`, `:` or `$` prefix.
    pub fn bare_name(&self) -> &str {
        self.name.trim_start_matches(['@', ':', '$'])
    }

    /// Placeholder spellings to look up in a prepared statement, the
    /// given name first.
    pub(crate) fn placeholder_candidates(&self) -> Vec<String> {
        let bare = self.bare_name();
        let mut names = vec![self.name.clone()];
        for prefix in ['@', ':', '$'] {
            let candidate = format!("{prefix}{bare}");
            if candidate != self.name {
                names.push(candidate);
            }
        }
        names
    }

    /// Value converted to the declared type and clipped to `size`.
    pub fn bound_value(&self) -> AppResult<DbValue> {
        let coerced = coerce(&self.value, self.db_type).ok_or_else(|| {
            AppError::DatabaseOperationFailed(format!(
                "cannot convert {} value to {:?} for parameter {}",
                self.value.type_name(),
                self.db_type,
                self.name
            ))
        })?;
        Ok(self.truncate(coerced))
    }

    fn truncate(&self, value: DbValue) -> DbValue {
        match (self.size, value) {
            (Some(size), DbValue::Text(s)) if self.db_type.is_textual() && size > 0 => {
                DbValue::Text(s.chars().take(size).collect())
            }
            (Some(size), DbValue::Blob(mut b)) if self.db_type.is_binary() && size > 0 => {
                b.truncate(size);
                DbValue::Blob(b)
            }
            (_, value) => value,
        }
    }
}

fn coerce(value: &DbValue, db_type: DbType) -> Option<DbValue> {
    if value.is_null() {
        return Some(DbValue::Null);
    }

    match db_type {
        DbType::Integer | DbType::BigInt => match value {
            DbValue::Integer(i) => Some(DbValue::Integer(*i)),
            DbValue::Real(r) => Some(DbValue::Integer(r.trunc() as i64)),
            DbValue::Text(s) => s.trim().parse().ok().map(DbValue::Integer),
            _ => None,
        },
        DbType::Bit => match value {
            DbValue::Integer(i) => Some(DbValue::Integer(i64::from(*i != 0))),
            DbValue::Real(r) => Some(DbValue::Integer(i64::from(*r != 0.0))),
            DbValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Some(DbValue::Integer(1)),
                "0" | "false" | "no" => Some(DbValue::Integer(0)),
                _ => None,
            },
            _ => None,
        },
        DbType::Real | DbType::Decimal => match value {
            DbValue::Integer(i) => Some(DbValue::Real(*i as f64)),
            DbValue::Real(r) => Some(DbValue::Real(*r)),
            DbValue::Text(s) => s.trim().parse().ok().map(DbValue::Real),
            _ => None,
        },
        DbType::Text | DbType::VarChar | DbType::Char => match value {
            DbValue::Blob(b) => Some(DbValue::Text(String::from_utf8_lossy(b).into_owned())),
            other => Some(DbValue::Text(other.to_string())),
        },
        DbType::Blob | DbType::VarBinary => match value {
            DbValue::Blob(b) => Some(DbValue::Blob(b.clone())),
            DbValue::Text(s) => Some(DbValue::Blob(s.as_bytes().to_vec())),
            _ => None,
        },
        DbType::Date => match value {
            DbValue::Text(s) => parse_datetime(s)
                .map(|dt| dt.date())
                .or_else(|| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok())
                .map(DbValue::from),
            DbValue::Integer(secs) => {
                DateTime::from_timestamp(*secs, 0).map(|dt| DbValue::from(dt.date_naive()))
            }
            _ => None,
        },
        DbType::DateTime => match value {
            DbValue::Text(s) => parse_datetime(s)
                .or_else(|| {
                    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
                .map(DbValue::from),
            DbValue::Integer(secs) => DateTime::from_timestamp(*secs, 0).map(DbValue::from),
            _ => None,
        },
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    [DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}
