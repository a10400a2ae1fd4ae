//! The read-only view of the catalog that the recommendation engine consumes.

use std::collections::HashSet;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::product::{Category, Color, PieceType, Product, ProductId};
use crate::domain::purchase::Purchase;
use crate::domain::user::UserId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unavailable(String),
    #[error("store returned undecodable data: {0}")]
    Decode(String),
}

/// Product query. Unset fields do not constrain the result; price bounds are inclusive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<Category>,
    pub piece_type: Option<PieceType>,
    pub color: Option<Color>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub exclude_ids: HashSet<ProductId>,
    pub in_stock_only: bool,
}

impl ProductFilter {
    pub fn in_stock() -> Self {
        Self { in_stock_only: true, ..Self::default() }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_piece_type(mut self, piece_type: PieceType) -> Self {
        self.piece_type = Some(piece_type);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_price_range(mut self, min_price: Decimal, max_price: Decimal) -> Self {
        self.min_price = Some(min_price);
        self.max_price = Some(max_price);
        self
    }

    pub fn excluding(mut self, ids: impl IntoIterator<Item = ProductId>) -> Self {
        self.exclude_ids.extend(ids);
        self
    }

    pub fn matches(&self, product: &Product) -> bool {
        if self.in_stock_only && !product.in_stock() {
            return false;
        }
        if self.exclude_ids.contains(&product.id) {
            return false;
        }
        if self.category.is_some_and(|category| category != product.category) {
            return false;
        }
        if self.piece_type.is_some_and(|piece_type| piece_type != product.piece_type) {
            return false;
        }
        if self.color.is_some_and(|color| color != product.color) {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularProduct {
    pub product_id: ProductId,
    pub total_quantity: u64,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;

    async fn list_products(
        &self,
        filter: &ProductFilter,
        limit: usize,
    ) -> Result<Vec<Product>, StoreError>;

    /// Every purchase line of the user, newest first.
    async fn list_user_purchases(&self, user_id: &UserId) -> Result<Vec<Purchase>, StoreError>;

    /// Purchase quantity summed per product across all users, largest first.
    async fn aggregate_popular_products(
        &self,
        limit: usize,
    ) -> Result<Vec<PopularProduct>, StoreError>;

    async fn user_exists(&self, user_id: &UserId) -> Result<bool, StoreError>;
}
