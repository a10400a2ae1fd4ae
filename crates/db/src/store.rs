//! Adapter exposing the repositories as the engine's `CatalogStore`.

use std::sync::Arc;

use async_trait::async_trait;

use vitrine_core::domain::product::{Product, ProductId};
use vitrine_core::domain::purchase::Purchase;
use vitrine_core::domain::user::UserId;
use vitrine_core::recommendation::{CatalogStore, PopularProduct, ProductFilter, StoreError};

use crate::repositories::{
    InMemoryProductRepository, InMemoryPurchaseRepository, InMemoryUserRepository,
    ProductRepository, PurchaseRepository, RepositoryError, SqlProductRepository,
    SqlPurchaseRepository, SqlUserRepository, UserRepository,
};
use crate::DbPool;

impl From<RepositoryError> for StoreError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Database(error) => Self::Unavailable(error.to_string()),
            RepositoryError::Decode(message) => Self::Decode(message),
        }
    }
}

#[derive(Clone)]
pub struct RepositoryStore {
    products: Arc<dyn ProductRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    users: Arc<dyn UserRepository>,
}

impl RepositoryStore {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        purchases: Arc<dyn PurchaseRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self { products, purchases, users }
    }

    pub fn sql(pool: DbPool) -> Self {
        Self::new(
            Arc::new(SqlProductRepository::new(pool.clone())),
            Arc::new(SqlPurchaseRepository::new(pool.clone())),
            Arc::new(SqlUserRepository::new(pool)),
        )
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryProductRepository::default()),
            Arc::new(InMemoryPurchaseRepository::default()),
            Arc::new(InMemoryUserRepository::default()),
        )
    }

    pub fn products(&self) -> &dyn ProductRepository {
        self.products.as_ref()
    }

    pub fn purchases(&self) -> &dyn PurchaseRepository {
        self.purchases.as_ref()
    }

    pub fn users(&self) -> &dyn UserRepository {
        self.users.as_ref()
    }
}

#[async_trait]
impl CatalogStore for RepositoryStore {
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.products.find_by_id(id).await?)
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        limit: usize,
    ) -> Result<Vec<Product>, StoreError> {
        Ok(self.products.list(filter, limit).await?)
    }

    async fn list_user_purchases(&self, user_id: &UserId) -> Result<Vec<Purchase>, StoreError> {
        Ok(self.purchases.list_for_user(user_id).await?)
    }

    async fn aggregate_popular_products(
        &self,
        limit: usize,
    ) -> Result<Vec<PopularProduct>, StoreError> {
        Ok(self.purchases.top_products(limit).await?)
    }

    async fn user_exists(&self, user_id: &UserId) -> Result<bool, StoreError> {
        Ok(self.users.exists(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use vitrine_core::recommendation::{CatalogStore, StoreError};

    use super::RepositoryStore;
    use crate::repositories::RepositoryError;
    use crate::{connect_with_settings, migrations};

    #[test]
    fn repository_errors_map_onto_store_errors() {
        let decode = StoreError::from(RepositoryError::Decode("price: bad".to_string()));
        assert_eq!(decode, StoreError::Decode("price: bad".to_string()));

        let database = StoreError::from(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        assert!(matches!(database, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn sql_store_without_schema_reports_unavailable() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        let store = RepositoryStore::sql(pool);

        let error = store.aggregate_popular_products(5).await.expect_err("no tables");
        assert!(matches!(error, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn sql_store_on_empty_schema_is_empty() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let store = RepositoryStore::sql(pool);

        assert!(store.aggregate_popular_products(5).await.expect("popular").is_empty());
    }
}
