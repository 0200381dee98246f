//! Author role of a conversation turn.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::history::core::errors::StoreError;

/// Role of a message author. The set is closed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Human input.
    Human,
    /// Model response.
    Ai,
    /// System instruction or notice.
    System,
}

impl Role {
    /// Every accepted role, in storage order.
    pub const ALL: [Self; 3] = [Self::Human, Self::Ai, Self::System];

    /// Stable string form for storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Ai => "ai",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "human" => Ok(Self::Human),
            "ai" => Ok(Self::Ai),
            "system" => Ok(Self::System),
            _ => Err(StoreError::InvalidArgument(format!(
                "invalid role: {value:?}, must be one of human, ai, system"
            ))),
        }
    }
}

impl rusqlite::types::ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
    }
}

impl rusqlite::types::FromSql for Role {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let raw = value.as_str()?;
        raw.parse()
            .map_err(|e| rusqlite::types::FromSqlError::Other(Box::new(e)))
    }
}
