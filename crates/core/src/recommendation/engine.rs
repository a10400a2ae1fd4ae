//! Request orchestration: validation, the history/no-history split, and the fallbacks.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::candidates::CandidateGenerator;
use super::preferences::analyze;
use super::scoring::{rank, ScoreCalculator};
use super::store::{CatalogStore, ProductFilter};
use super::types::{Recommendation, RecommendationSource};
use crate::config::{AppConfig, BudgetMode, RecommendationConfig};
use crate::domain::product::ProductId;
use crate::domain::purchase::Purchase;
use crate::domain::user::UserId;
use crate::errors::{ApplicationError, DomainError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationSettings {
    pub default_limit: u32,
    pub max_limit: u32,
    pub price_tolerance_pct: u32,
    pub strategy_timeout: Duration,
    pub budget_mode: BudgetMode,
}

impl From<&RecommendationConfig> for RecommendationSettings {
    fn from(config: &RecommendationConfig) -> Self {
        Self {
            default_limit: config.default_limit,
            max_limit: config.max_limit,
            price_tolerance_pct: config.price_tolerance_pct,
            strategy_timeout: Duration::from_millis(config.strategy_timeout_ms),
            budget_mode: config.budget_mode,
        }
    }
}

impl RecommendationSettings {
    /// Checks id shape and limit range. Needs no store, so callers can reject bad input
    /// before opening one. `None` means the configured default limit.
    pub fn validate_request(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<RecommendationRequest, DomainError> {
        let user_id = UserId::parse(user_id)?;
        let limit = limit.unwrap_or_else(|| i64::from(self.default_limit));
        let max_limit = i64::from(self.max_limit);
        if !(1..=max_limit).contains(&limit) {
            return Err(DomainError::InvalidArgument(format!(
                "limit must be between 1 and {max_limit}, got {limit}"
            )));
        }
        let limit = usize::try_from(limit)
            .map_err(|_| DomainError::InvalidArgument(format!("limit {limit} is out of range")))?;
        Ok(RecommendationRequest { user_id, limit })
    }
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default().recommendation)
    }
}

/// A request that passed input validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationRequest {
    pub user_id: UserId,
    pub limit: usize,
}

/// Which way a request goes once the user is known to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendationPath {
    NoHistory,
    HasHistory(Vec<Purchase>),
}

impl RecommendationPath {
    pub fn from_history(purchases: Vec<Purchase>) -> Self {
        if purchases.is_empty() {
            Self::NoHistory
        } else {
            Self::HasHistory(purchases)
        }
    }
}

/// Stateless across requests; clone it freely.
#[derive(Clone)]
pub struct RecommendationEngine {
    store: Arc<dyn CatalogStore>,
    settings: RecommendationSettings,
    calculator: ScoreCalculator,
    generator: CandidateGenerator,
}

impl RecommendationEngine {
    pub fn new(store: Arc<dyn CatalogStore>, settings: RecommendationSettings) -> Self {
        Self::with_calculator(store, settings, ScoreCalculator::default())
    }

    pub fn with_calculator(
        store: Arc<dyn CatalogStore>,
        settings: RecommendationSettings,
        calculator: ScoreCalculator,
    ) -> Self {
        let generator = CandidateGenerator::new(
            store.clone(),
            settings.budget_mode,
            settings.strategy_timeout,
            settings.price_tolerance_pct,
        );
        Self { store, settings, calculator, generator }
    }

    pub async fn recommend_default(
        &self,
        user_id: &str,
    ) -> Result<Vec<Recommendation>, ApplicationError> {
        let request = self.settings.validate_request(user_id, None)?;
        self.execute(request).await
    }

    /// Ranked recommendations for `user_id`, at most `limit` of them.
    ///
    /// Input is validated before the store is touched. An unknown user is an error,
    /// an empty list is not.
    pub async fn recommend(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<Recommendation>, ApplicationError> {
        let request = self.settings.validate_request(user_id, Some(limit))?;
        self.execute(request).await
    }

    /// Runs an already validated request against the store.
    pub async fn execute(
        &self,
        request: RecommendationRequest,
    ) -> Result<Vec<Recommendation>, ApplicationError> {
        let RecommendationRequest { user_id, limit } = request;

        if !self.store.user_exists(&user_id).await? {
            return Err(DomainError::NotFound { entity: "user", id: user_id.to_string() }.into());
        }

        let purchases = self.store.list_user_purchases(&user_id).await?;
        let recommendations = match RecommendationPath::from_history(purchases) {
            RecommendationPath::NoHistory => {
                info!(
                    event_name = "recommendation.fallback.popular",
                    user_id = %user_id,
                    limit,
                    "user has no purchase history; using popular products"
                );
                self.popular_fallback(limit).await?
            }
            RecommendationPath::HasHistory(purchases) => {
                self.personalized(&purchases, limit).await?
            }
        };

        info!(
            event_name = "recommendation.completed",
            user_id = %user_id,
            limit,
            returned = recommendations.len(),
            source = recommendations.first().map(|r| r.source.as_str()),
            "recommendations ready"
        );
        Ok(recommendations)
    }

    /// Best sellers by summed quantity, or any in-stock products when nothing was
    /// ever sold.
    pub async fn popular_fallback(
        &self,
        limit: usize,
    ) -> Result<Vec<Recommendation>, ApplicationError> {
        let popular = self.store.aggregate_popular_products(limit).await?;
        if popular.is_empty() {
            info!(
                event_name = "recommendation.fallback.cold_start",
                limit,
                "no purchases recorded; using in-stock products"
            );
            return self.cold_start(limit).await;
        }

        let mut recommendations = Vec::with_capacity(popular.len());
        for entry in popular.into_iter().take(limit) {
            // Sold products can disappear from the catalog later.
            if let Some(product) = self.store.find_product(&entry.product_id).await? {
                recommendations.push(Recommendation {
                    product,
                    recommendation_score: entry.total_quantity as f64,
                    source: RecommendationSource::Popular,
                    matched: Vec::new(),
                });
            }
        }
        Ok(recommendations)
    }

    pub async fn cold_start(&self, limit: usize) -> Result<Vec<Recommendation>, ApplicationError> {
        let products = self.store.list_products(&ProductFilter::in_stock(), limit).await?;
        Ok(products
            .into_iter()
            .take(limit)
            .map(|product| Recommendation::unscored(product, RecommendationSource::ColdStart))
            .collect())
    }

    async fn personalized(
        &self,
        purchases: &[Purchase],
        limit: usize,
    ) -> Result<Vec<Recommendation>, ApplicationError> {
        let profile = analyze(self.store.as_ref(), purchases).await?;
        let exclusions: HashSet<ProductId> =
            purchases.iter().map(|purchase| purchase.product_id).collect();

        let candidates = self.generator.generate(&profile, &exclusions, limit).await?;
        let candidate_count = candidates.len();
        let ranked = rank(candidates, &profile, &self.calculator, limit);

        info!(
            event_name = "recommendation.personalized.ranked",
            purchase_lines = purchases.len(),
            excluded = exclusions.len(),
            candidates = candidate_count,
            ranked = ranked.len(),
            "personalized candidates ranked"
        );
        Ok(ranked)
    }
}
