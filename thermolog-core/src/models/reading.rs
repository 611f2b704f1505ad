use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One persisted (inside, outside, created_at) record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub inside_temp: f64,
    pub outside_temp: f64,
    pub created_at: DateTime<Utc>,
}

/// Row shape of the `tempreading` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReadingRow {
    pub inside_temp: f64,
    pub outside_temp: f64,
    pub created_at: String,
}

impl TryFrom<ReadingRow> for Reading {
    type Error = chrono::ParseError;

    fn try_from(row: ReadingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            inside_temp: row.inside_temp,
            outside_temp: row.outside_temp,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

/// Fixed-width RFC 3339 in UTC with milliseconds, so text order is time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|ts| ts.with_timezone(&Utc))
}

/// Direction for history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}
