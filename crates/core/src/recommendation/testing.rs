//! In-process catalog used by the engine's unit tests, with failure and latency hooks.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;

use super::store::{CatalogStore, PopularProduct, ProductFilter, StoreError};
use crate::domain::product::{Category, Color, PieceType, Product, ProductId, Size};
use crate::domain::purchase::{Purchase, PurchaseId};
use crate::domain::user::UserId;

type FilterHook = Arc<dyn Fn(&ProductFilter) -> bool + Send + Sync>;

pub fn product(category: Category, piece_type: PieceType, color: Color, price: i64) -> Product {
    Product {
        id: ProductId::new(),
        name: format!("{} {} {}", piece_type.as_str(), category.as_str(), color.as_str()),
        category,
        piece_type,
        color,
        size: Size::M,
        price: Decimal::from(price),
        stock_quantity: 10,
    }
}

#[derive(Clone, Default)]
pub struct FixtureStore {
    users: HashSet<UserId>,
    products: Vec<Product>,
    purchases: Vec<Purchase>,
    failing_filters: Vec<FilterHook>,
    slow_filters: Vec<(Duration, FilterHook)>,
    fail_history: bool,
    fail_everything: bool,
}

impl FixtureStore {
    pub fn add_user(&mut self) -> UserId {
        let id = UserId::new();
        self.users.insert(id);
        id
    }

    pub fn add_product(&mut self, product: Product) {
        self.products.push(product);
    }

    /// Records a purchase one minute after the previous one.
    pub fn add_purchase(&mut self, user_id: UserId, product: &Product, quantity: u32) {
        let offset = ChronoDuration::minutes(self.purchases.len() as i64);
        self.purchases.push(Purchase {
            id: PurchaseId::new(),
            user_id,
            product_id: product.id,
            quantity,
            product_name: product.name.clone(),
            product_price: product.price,
            purchased_at: Utc::now() + offset,
        });
    }

    pub fn fail_products_matching(
        &mut self,
        hook: impl Fn(&ProductFilter) -> bool + Send + Sync + 'static,
    ) {
        self.failing_filters.push(Arc::new(hook));
    }

    pub fn delay_products_matching(
        &mut self,
        delay: Duration,
        hook: impl Fn(&ProductFilter) -> bool + Send + Sync + 'static,
    ) {
        self.slow_filters.push((delay, Arc::new(hook)));
    }

    pub fn fail_history(&mut self) {
        self.fail_history = true;
    }

    pub fn fail_everything(&mut self) {
        self.fail_everything = true;
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail_everything {
            return Err(StoreError::Unavailable("fixture store is down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for FixtureStore {
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        self.check()?;
        Ok(self.products.iter().find(|product| product.id == *id).cloned())
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        limit: usize,
    ) -> Result<Vec<Product>, StoreError> {
        self.check()?;
        if self.failing_filters.iter().any(|hook| hook(filter)) {
            return Err(StoreError::Unavailable("product query failed".to_string()));
        }
        let delay = self
            .slow_filters
            .iter()
            .filter(|(_, hook)| hook(filter))
            .map(|(delay, _)| *delay)
            .max();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.products.iter().filter(|p| filter.matches(p)).take(limit).cloned().collect())
    }

    async fn list_user_purchases(&self, user_id: &UserId) -> Result<Vec<Purchase>, StoreError> {
        self.check()?;
        if self.fail_history {
            return Err(StoreError::Unavailable("purchase history unavailable".to_string()));
        }
        let mut purchases: Vec<Purchase> =
            self.purchases.iter().filter(|p| p.user_id == *user_id).cloned().collect();
        purchases.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));
        Ok(purchases)
    }

    async fn aggregate_popular_products(
        &self,
        limit: usize,
    ) -> Result<Vec<PopularProduct>, StoreError> {
        self.check()?;
        let mut totals: HashMap<ProductId, u64> = HashMap::new();
        for purchase in &self.purchases {
            *totals.entry(purchase.product_id).or_default() += u64::from(purchase.quantity);
        }
        let mut popular: Vec<PopularProduct> = totals
            .into_iter()
            .map(|(product_id, total_quantity)| PopularProduct { product_id, total_quantity })
            .collect();
        popular.sort_by(|a, b| {
            b.total_quantity.cmp(&a.total_quantity).then_with(|| a.product_id.cmp(&b.product_id))
        });
        popular.truncate(limit);
        Ok(popular)
    }

    async fn user_exists(&self, user_id: &UserId) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self.users.contains(user_id))
    }
}
