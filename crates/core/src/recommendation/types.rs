//! Value types returned by the recommendation engine

use serde::{Deserialize, Serialize};

use crate::domain::product::Product;

/// Which branch of the engine produced a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    /// Ranked against the user's own preference profile
    Personalized,
    /// User has no history; ranked by units sold across all users
    Popular,
    /// Nothing has ever been sold; any in-stock products
    ColdStart,
}

impl RecommendationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personalized => "personalized",
            Self::Popular => "popular",
            Self::ColdStart => "cold_start",
        }
    }
}

/// A preference the product matched, used to explain its score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    Category,
    PieceType,
    Color,
    Price,
}

/// A product together with its relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub product: Product,
    /// Always >= 0. On the popular path this is the number of units sold.
    pub recommendation_score: f64,
    pub source: RecommendationSource,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched: Vec<MatchReason>,
}

impl Recommendation {
    pub fn unscored(product: Product, source: RecommendationSource) -> Self {
        Self { product, recommendation_score: 0.0, source, matched: Vec::new() }
    }
}
