//! Relevance scoring, first-occurrence dedup and ordering of candidates

use std::collections::HashSet;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::preferences::PreferenceProfile;
use super::types::{MatchReason, Recommendation, RecommendationSource};
use crate::domain::product::Product;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub category: f64,
    pub piece_type: f64,
    pub color: f64,
}

impl ScoringWeights {
    pub const DEFAULT: Self = Self { category: 3.0, piece_type: 2.0, color: 1.5 };
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreCalculator {
    weights: ScoringWeights,
}

impl ScoreCalculator {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Composite score and the preferences the product matched.
    pub fn score(&self, product: &Product, profile: &PreferenceProfile) -> (f64, Vec<MatchReason>) {
        let mut score = 0.0;
        let mut matched = Vec::new();

        if profile.preferred_category == Some(product.category) {
            score += self.weights.category;
            matched.push(MatchReason::Category);
        }
        if profile.preferred_piece_type == Some(product.piece_type) {
            score += self.weights.piece_type;
            matched.push(MatchReason::PieceType);
        }
        if profile.preferred_color == Some(product.color) {
            score += self.weights.color;
            matched.push(MatchReason::Color);
        }

        let price = price_score(product.price, profile.average_price);
        if price > 0.0 {
            score += price;
            matched.push(MatchReason::Price);
        }

        (score, matched)
    }
}

/// `max(0, 1 - |price - average| / average)`, or 0 without a positive average.
pub fn price_score(price: Decimal, average_price: Decimal) -> f64 {
    if average_price <= Decimal::ZERO {
        return 0.0;
    }
    let closeness = Decimal::ONE - (price - average_price).abs() / average_price;
    closeness.max(Decimal::ZERO).to_f64().unwrap_or(0.0)
}

/// Keeps the first occurrence of each product, scores it once, then sorts by score
/// descending. The sort is stable so equal scores keep generation order.
pub fn rank(
    candidates: Vec<Product>,
    profile: &PreferenceProfile,
    calculator: &ScoreCalculator,
    limit: usize,
) -> Vec<Recommendation> {
    let mut seen = HashSet::with_capacity(candidates.len());
    let mut ranked: Vec<Recommendation> = candidates
        .into_iter()
        .filter(|product| seen.insert(product.id))
        .map(|product| {
            let (score, matched) = calculator.score(&product, profile);
            Recommendation {
                product,
                recommendation_score: score,
                source: RecommendationSource::Personalized,
                matched,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.recommendation_score.total_cmp(&a.recommendation_score));
    ranked.truncate(limit);
    ranked
}
