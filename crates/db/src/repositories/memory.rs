use std::collections::HashMap;

use tokio::sync::RwLock;

use vitrine_core::domain::product::{Product, ProductId};
use vitrine_core::domain::purchase::{Purchase, PurchaseId};
use vitrine_core::domain::user::{User, UserId};
use vitrine_core::recommendation::{PopularProduct, ProductFilter};

use super::{ProductRepository, PurchaseRepository, RepositoryError, UserRepository};

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<ProductId, Product>>,
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(id).cloned())
    }

    async fn list(
        &self,
        filter: &ProductFilter,
        limit: usize,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        let mut matching: Vec<&Product> =
            products.values().filter(|product| filter.matches(product)).collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(matching.into_iter().take(limit).cloned().collect())
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        products.insert(product.id, product);
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.products.read().await.len() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryPurchaseRepository {
    purchases: RwLock<HashMap<PurchaseId, Purchase>>,
}

#[async_trait::async_trait]
impl PurchaseRepository for InMemoryPurchaseRepository {
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Purchase>, RepositoryError> {
        let purchases = self.purchases.read().await;
        let mut history: Vec<Purchase> =
            purchases.values().filter(|purchase| purchase.user_id == *user_id).cloned().collect();
        history.sort_by(|a, b| {
            b.purchased_at.cmp(&a.purchased_at).then_with(|| b.id.0.cmp(&a.id.0))
        });
        Ok(history)
    }

    async fn top_products(&self, limit: usize) -> Result<Vec<PopularProduct>, RepositoryError> {
        let purchases = self.purchases.read().await;
        let mut totals: HashMap<ProductId, u64> = HashMap::new();
        for purchase in purchases.values() {
            *totals.entry(purchase.product_id).or_default() += u64::from(purchase.quantity);
        }

        let mut ranked: Vec<PopularProduct> = totals
            .into_iter()
            .map(|(product_id, total_quantity)| PopularProduct { product_id, total_quantity })
            .collect();
        ranked.sort_by(|a, b| {
            b.total_quantity.cmp(&a.total_quantity).then_with(|| a.product_id.cmp(&b.product_id))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn save(&self, purchase: Purchase) -> Result<(), RepositoryError> {
        let mut purchases = self.purchases.write().await;
        purchases.insert(purchase.id, purchase);
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.purchases.read().await.len() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn exists(&self, id: &UserId) -> Result<bool, RepositoryError> {
        Ok(self.users.read().await.contains_key(id))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn save(&self, user: User) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        users.insert(user.id, user);
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.users.read().await.len() as u64)
    }
}
