use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use vitrine_core::domain::product::{Product, ProductId};
use vitrine_core::domain::purchase::Purchase;
use vitrine_core::domain::user::{User, UserId};
use vitrine_core::recommendation::{PopularProduct, ProductFilter};

pub mod memory;
pub mod product;
pub mod purchase;
pub mod user;

pub use memory::{InMemoryProductRepository, InMemoryPurchaseRepository, InMemoryUserRepository};
pub use product::SqlProductRepository;
pub use purchase::SqlPurchaseRepository;
pub use user::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Products matching `filter`, ordered by name then id, at most `limit`.
    async fn list(
        &self,
        filter: &ProductFilter,
        limit: usize,
    ) -> Result<Vec<Product>, RepositoryError>;

    async fn save(&self, product: Product) -> Result<(), RepositoryError>;
    async fn count(&self) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Newest first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Purchase>, RepositoryError>;

    /// Summed quantity per product; largest first, ties by product id ascending.
    async fn top_products(&self, limit: usize) -> Result<Vec<PopularProduct>, RepositoryError>;

    async fn save(&self, purchase: Purchase) -> Result<(), RepositoryError>;
    async fn count(&self) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn exists(&self, id: &UserId) -> Result<bool, RepositoryError>;
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
    async fn save(&self, user: User) -> Result<(), RepositoryError>;
    async fn count(&self) -> Result<u64, RepositoryError>;
}

pub(crate) fn decode_error(field: &str, error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(format!("{field}: {error}"))
}

pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(value).map_err(|error| decode_error(field, error))
}

pub(crate) fn parse_decimal(field: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value).map_err(|error| decode_error(field, error))
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| decode_error(field, error))
}

/// Fixed-width RFC 3339 so that text ordering in SQL matches time ordering.
pub(crate) fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
