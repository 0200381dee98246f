// File: src/history/core/ids.rs

//! Identifier types for the conversation history store.
//!
//! Two families live here:
//! - the surrogate keys assigned by `SQLite` (`ConversationId`, `MessageId`),
//!   which are integer newtypes so they cannot be swapped by accident;
//! - the external handle supplied by callers (`SessionId`), a validated string.
//!
//! Callers address conversations by `SessionId`. The surrogate key is returned
//! by creation so that turns can be appended without a second lookup.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::history::core::errors::StoreError;

/// Declare an integer row-id newtype with a consistent API.
macro_rules! define_row_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[repr(transparent)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Borrow the raw row id.
            #[inline]
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            #[inline]
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            #[inline]
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl FromStr for $name {
            type Err = core::num::ParseIntError;

            #[inline]
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

define_row_id!(
    /// Surrogate key of a conversation row.
    ///
    /// Assigned by the store, strictly increasing and never reused.
    ConversationId
);

define_row_id!(
    /// Surrogate key of a message row.
    MessageId
);

/// Caller-supplied handle for a conversation.
///
/// Any non-empty string is accepted and kept verbatim: no trimming, no length
/// ceiling, no normalisation. Comparison is byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Build a validated `SessionId`.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidArgument` if the input is empty.
    pub fn new(raw: impl Into<String>) -> Result<Self, StoreError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(StoreError::InvalidArgument(
                "session id must not be empty".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    /// Generate a fresh random handle for a new conversation.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow as `&str`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into `String`.
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<SessionId> for String {
    fn from(value: SessionId) -> Self {
        value.into_string()
    }
}

impl TryFrom<String> for SessionId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for SessionId {
    type Error = StoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// ===== Rusqlite integration ================================================

mod rusqlite_impl {
    use super::{ConversationId, MessageId, SessionId};

    use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

    macro_rules! impl_rusqlite_row_id {
        ($t:ty) => {
            impl ToSql for $t {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.0))
                }
            }

            impl FromSql for $t {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    i64::column_result(value).map(Self)
                }
            }
        };
    }

    impl_rusqlite_row_id!(ConversationId);
    impl_rusqlite_row_id!(MessageId);

    impl ToSql for SessionId {
        fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
            Ok(ToSqlOutput::from(self.as_str()))
        }
    }

    // Stored rows are taken as-is; other writers may not share our input rules.
    impl FromSql for SessionId {
        fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
            String::column_result(value).map(Self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_rejects_only_empty_values() {
        assert!(matches!(
            SessionId::new(""),
            Err(StoreError::InvalidArgument(_))
        ));
        assert_eq!(SessionId::new("   ").unwrap().as_str(), "   ");
        assert!(SessionId::new("s".repeat(300)).is_ok());
    }

    #[test]
    fn session_id_keeps_value_verbatim() {
        let id = SessionId::new(" session_001 ").unwrap();
        assert_eq!(id.as_str(), " session_001 ");
    }

    #[test]
    fn generated_session_ids_are_distinct() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn session_id_serde_is_a_plain_string() {
        let id = SessionId::new("session_002").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"session_002\"");
        assert!(serde_json::from_str::<SessionId>("\"\"").is_err());
    }

    #[test]
    fn row_ids_parse_and_display() {
        let id: ConversationId = "42".parse().unwrap();
        assert_eq!(id, ConversationId(42));
        assert_eq!(id.to_string(), "42");
        assert_eq!(i64::from(MessageId(7)), 7);
    }
}
