//! Preference extraction from a user's purchase history

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::debug;

use super::store::{CatalogStore, StoreError};
use crate::domain::product::{Category, Color, PieceType, Product, ProductId};
use crate::domain::purchase::Purchase;

/// Purchased quantity per attribute value, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally<K> {
    entries: Vec<(K, u64)>,
}

impl<K> Default for Tally<K> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<K: Copy + PartialEq> Tally<K> {
    pub fn add(&mut self, key: K, quantity: u64) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, total)) => *total += quantity,
            None => self.entries.push((key, quantity)),
        }
    }

    /// Key with the largest total. On a tie the key seen first wins.
    pub fn leader(&self) -> Option<K> {
        let mut leader: Option<(K, u64)> = None;
        for &(key, total) in &self.entries {
            if leader.map_or(true, |(_, best)| total > best) {
                leader = Some((key, total));
            }
        }
        leader.map(|(key, _)| key)
    }
}

/// What one user tends to buy. Built per request and dropped with it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreferenceProfile {
    pub preferred_category: Option<Category>,
    pub preferred_piece_type: Option<PieceType>,
    pub preferred_color: Option<Color>,
    /// Mean unit price over resolved purchase lines, not weighted by quantity.
    pub average_price: Decimal,
    pub categories: Tally<Category>,
    pub piece_types: Tally<PieceType>,
    pub colors: Tally<Color>,
    pub resolved_lines: usize,
}

impl PreferenceProfile {
    /// Builds the profile from purchase lines already joined to their products.
    pub fn from_resolved<'a>(lines: impl IntoIterator<Item = (&'a Purchase, &'a Product)>) -> Self {
        let mut categories = Tally::default();
        let mut piece_types = Tally::default();
        let mut colors = Tally::default();
        let mut price_total = Decimal::ZERO;
        let mut resolved_lines = 0usize;

        for (purchase, product) in lines {
            let quantity = u64::from(purchase.quantity);
            categories.add(product.category, quantity);
            piece_types.add(product.piece_type, quantity);
            colors.add(product.color, quantity);
            price_total += product.price;
            resolved_lines += 1;
        }

        let average_price = if resolved_lines == 0 {
            Decimal::ZERO
        } else {
            price_total / Decimal::from(resolved_lines)
        };

        Self {
            preferred_category: categories.leader(),
            preferred_piece_type: piece_types.leader(),
            preferred_color: colors.leader(),
            average_price,
            categories,
            piece_types,
            colors,
            resolved_lines,
        }
    }

    pub fn has_price_signal(&self) -> bool {
        self.average_price > Decimal::ZERO
    }
}

/// Resolves every purchase to its current catalog entry and builds the profile.
/// Purchases whose product no longer exists are skipped.
pub async fn analyze(
    store: &dyn CatalogStore,
    purchases: &[Purchase],
) -> Result<PreferenceProfile, StoreError> {
    let mut resolved: HashMap<ProductId, Option<Product>> = HashMap::new();
    for purchase in purchases {
        if !resolved.contains_key(&purchase.product_id) {
            let product = store.find_product(&purchase.product_id).await?;
            resolved.insert(purchase.product_id, product);
        }
    }

    let lines = purchases.iter().filter_map(|purchase| {
        resolved
            .get(&purchase.product_id)
            .and_then(Option::as_ref)
            .map(|product| (purchase, product))
    });
    let profile = PreferenceProfile::from_resolved(lines);

    debug!(
        event_name = "recommendation.profile.built",
        purchase_lines = purchases.len(),
        resolved_lines = profile.resolved_lines,
        preferred_category = profile.preferred_category.map(|c| c.as_str()),
        preferred_piece_type = profile.preferred_piece_type.map(|p| p.as_str()),
        preferred_color = profile.preferred_color.map(|c| c.as_str()),
        average_price = %profile.average_price,
        "preference profile built"
    );

    Ok(profile)
}
