//! Personalized product recommendations.
//!
//! A request either follows the user's own purchase history (profile, three candidate
//! strategies, scoring) or falls back to best sellers, and from there to any in-stock
//! products when nothing has been sold yet.

pub mod candidates;
pub mod engine;
pub mod preferences;
pub mod scoring;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use candidates::{BudgetPlan, CandidateGenerator, Strategy, StrategyKind};
pub use engine::{
    RecommendationEngine, RecommendationPath, RecommendationRequest, RecommendationSettings,
};
pub use preferences::{PreferenceProfile, Tally};
pub use scoring::{ScoreCalculator, ScoringWeights};
pub use store::{CatalogStore, PopularProduct, ProductFilter, StoreError};
pub use types::{MatchReason, Recommendation, RecommendationSource};
