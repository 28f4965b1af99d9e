use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Closed classification of a saved item.
///
/// Assigned once by the classifier when an item is ingested and never
/// changed afterwards. Every kind except `Note` is a link kind and carries
/// a source URL plus provider metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Note,
    Article,
    Tweet,
    #[serde(rename = "tiktok")]
    TikTok,
    #[serde(rename = "youtube")]
    YouTube,
}

impl ContentKind {
    /// Every kind, notes first.
    pub const ALL: [ContentKind; 5] = [
        ContentKind::Note,
        ContentKind::Article,
        ContentKind::Tweet,
        ContentKind::TikTok,
        ContentKind::YouTube,
    ];

    /// Stable lowercase name used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Article => "article",
            Self::Tweet => "tweet",
            Self::TikTok => "tiktok",
            Self::YouTube => "youtube",
        }
    }

    /// Returns `true` for every kind that is backed by a URL.
    pub fn is_link(self) -> bool {
        !matches!(self, Self::Note)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known content kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown content kind: {0}")]
pub struct UnknownContentKind(pub String);

impl FromStr for ContentKind {
    type Err = UnknownContentKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "note" => Ok(Self::Note),
            "article" => Ok(Self::Article),
            "tweet" | "twitter" | "x" => Ok(Self::Tweet),
            "tiktok" => Ok(Self::TikTok),
            "youtube" => Ok(Self::YouTube),
            other => Err(UnknownContentKind(other.to_string())),
        }
    }
}

impl ToSql for ContentKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ContentKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        text.parse()
            .map_err(|e: UnknownContentKind| FromSqlError::Other(Box::new(e)))
    }
}
