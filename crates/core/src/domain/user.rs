use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a caller-supplied identifier. Anything that is not a UUID is rejected
    /// before the store is touched.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| DomainError::InvalidArgument(format!("malformed user id `{value}`")))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::UserId;
    use crate::errors::DomainError;

    #[test]
    fn parse_accepts_uuid_with_surrounding_whitespace() {
        let id = UserId::parse(" 3f2b8c1e-9d4a-4c6b-8e2f-1a7d5c9b0e34 ").expect("valid id");
        assert_eq!(id.to_string(), "3f2b8c1e-9d4a-4c6b-8e2f-1a7d5c9b0e34");
    }

    #[test]
    fn parse_rejects_malformed_identifier() {
        let error = UserId::parse("not-an-id").expect_err("malformed id");
        assert!(matches!(error, DomainError::InvalidArgument(ref message) if message.contains("not-an-id")));
    }
}
