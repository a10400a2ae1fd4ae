//! Candidate generation: three independent retrieval strategies sharing one limit

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::preferences::PreferenceProfile;
use super::store::{CatalogStore, ProductFilter, StoreError};
use crate::config::BudgetMode;
use crate::domain::product::{Product, ProductId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    CategoryMatch,
    PieceTypeMatch,
    PriceBand,
}

impl StrategyKind {
    pub const ORDER: [StrategyKind; 3] =
        [Self::CategoryMatch, Self::PieceTypeMatch, Self::PriceBand];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CategoryMatch => "category_match",
            Self::PieceTypeMatch => "piece_type_match",
            Self::PriceBand => "price_band",
        }
    }

    /// Sub-limit given the overall limit and how many candidates are already taken.
    pub fn sub_limit(&self, limit: usize, taken: usize) -> usize {
        let remaining = limit.saturating_sub(taken);
        match self {
            Self::CategoryMatch => (limit / 3).min(remaining),
            Self::PieceTypeMatch => remaining / 2,
            Self::PriceBand => remaining,
        }
    }
}

/// One retrieval query derived from the profile. Pure data; it does not know about
/// the other strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    pub kind: StrategyKind,
    pub filter: ProductFilter,
}

impl Strategy {
    /// Returns `None` when the profile carries no signal for this strategy.
    pub fn for_profile(
        kind: StrategyKind,
        profile: &PreferenceProfile,
        exclusions: &HashSet<ProductId>,
        price_tolerance_pct: u32,
    ) -> Option<Self> {
        let base = ProductFilter::in_stock().excluding(exclusions.iter().copied());
        let filter = match kind {
            StrategyKind::CategoryMatch => base.with_category(profile.preferred_category?),
            StrategyKind::PieceTypeMatch => base.with_piece_type(profile.preferred_piece_type?),
            StrategyKind::PriceBand => {
                if !profile.has_price_signal() {
                    return None;
                }
                let (min, max) = price_band(profile.average_price, price_tolerance_pct);
                base.with_price_range(min, max)
            }
        };
        Some(Self { kind, filter })
    }
}

/// Inclusive bounds `average ± average * tolerance%`.
pub fn price_band(average_price: Decimal, tolerance_pct: u32) -> (Decimal, Decimal) {
    let tolerance = average_price * Decimal::from(tolerance_pct) / Decimal::ONE_HUNDRED;
    (average_price - tolerance, average_price + tolerance)
}

/// Sub-limits fixed before any strategy runs, assuming every earlier strategy fills
/// its share. The shares never add up to more than the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetPlan {
    pub limit: usize,
    sub_limits: [usize; 3],
}

impl BudgetPlan {
    pub fn up_front(limit: usize, applicable: [bool; 3]) -> Self {
        let mut sub_limits = [0usize; 3];
        let mut assumed = 0usize;
        for (index, kind) in StrategyKind::ORDER.iter().enumerate() {
            if applicable[index] {
                sub_limits[index] = kind.sub_limit(limit, assumed);
                assumed += sub_limits[index];
            }
        }
        Self { limit, sub_limits }
    }

    pub fn sub_limit(&self, kind: StrategyKind) -> usize {
        self.sub_limits[Self::slot(kind)]
    }

    fn slot(kind: StrategyKind) -> usize {
        match kind {
            StrategyKind::CategoryMatch => 0,
            StrategyKind::PieceTypeMatch => 1,
            StrategyKind::PriceBand => 2,
        }
    }
}

#[derive(Debug)]
enum StrategyOutcome {
    Skipped,
    Fetched(Vec<Product>),
    TimedOut,
    Failed(StoreError),
}

#[derive(Clone)]
pub struct CandidateGenerator {
    store: Arc<dyn CatalogStore>,
    mode: BudgetMode,
    strategy_timeout: Duration,
    price_tolerance_pct: u32,
}

impl CandidateGenerator {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        mode: BudgetMode,
        strategy_timeout: Duration,
        price_tolerance_pct: u32,
    ) -> Self {
        Self { store, mode, strategy_timeout, price_tolerance_pct }
    }

    pub fn strategies(
        &self,
        profile: &PreferenceProfile,
        exclusions: &HashSet<ProductId>,
    ) -> [Option<Strategy>; 3] {
        StrategyKind::ORDER
            .map(|kind| Strategy::for_profile(kind, profile, exclusions, self.price_tolerance_pct))
    }

    /// Raw candidates in strategy order. Duplicates across strategies are kept.
    ///
    /// A strategy that times out or fails contributes nothing; the call only fails
    /// when every strategy that ran failed.
    pub async fn generate(
        &self,
        profile: &PreferenceProfile,
        exclusions: &HashSet<ProductId>,
        limit: usize,
    ) -> Result<Vec<Product>, StoreError> {
        let strategies = self.strategies(profile, exclusions);
        let outcomes = match self.mode {
            BudgetMode::Sequential => self.run_sequential(&strategies, limit).await,
            BudgetMode::Concurrent => self.run_concurrent(&strategies, limit).await,
        };
        merge_outcomes(outcomes)
    }

    async fn run_sequential(
        &self,
        strategies: &[Option<Strategy>; 3],
        limit: usize,
    ) -> Vec<(StrategyKind, StrategyOutcome)> {
        let mut outcomes = Vec::with_capacity(strategies.len());
        let mut taken = 0usize;
        for (kind, strategy) in StrategyKind::ORDER.into_iter().zip(strategies) {
            let outcome = match strategy {
                Some(strategy) if taken < limit => {
                    self.run_one(strategy, kind.sub_limit(limit, taken)).await
                }
                _ => StrategyOutcome::Skipped,
            };
            if let StrategyOutcome::Fetched(products) = &outcome {
                taken += products.len();
            }
            outcomes.push((kind, outcome));
        }
        outcomes
    }

    async fn run_concurrent(
        &self,
        strategies: &[Option<Strategy>; 3],
        limit: usize,
    ) -> Vec<(StrategyKind, StrategyOutcome)> {
        let [category, piece_type, price] = strategies;
        let plan = BudgetPlan::up_front(
            limit,
            [category.is_some(), piece_type.is_some(), price.is_some()],
        );

        let (category, piece_type, price) = tokio::join!(
            self.run_planned(category.as_ref(), &plan),
            self.run_planned(piece_type.as_ref(), &plan),
            self.run_planned(price.as_ref(), &plan),
        );

        vec![
            (StrategyKind::CategoryMatch, category),
            (StrategyKind::PieceTypeMatch, piece_type),
            (StrategyKind::PriceBand, price),
        ]
    }

    async fn run_planned(&self, strategy: Option<&Strategy>, plan: &BudgetPlan) -> StrategyOutcome {
        match strategy {
            Some(strategy) => self.run_one(strategy, plan.sub_limit(strategy.kind)).await,
            None => StrategyOutcome::Skipped,
        }
    }

    async fn run_one(&self, strategy: &Strategy, sub_limit: usize) -> StrategyOutcome {
        // A zero limit would read as "no limit" to some stores.
        if sub_limit == 0 {
            return StrategyOutcome::Skipped;
        }

        let query = self.store.list_products(&strategy.filter, sub_limit);
        match tokio::time::timeout(self.strategy_timeout, query).await {
            Ok(Ok(mut products)) => {
                products.truncate(sub_limit);
                debug!(
                    event_name = "recommendation.strategy.fetched",
                    strategy = strategy.kind.as_str(),
                    sub_limit,
                    fetched = products.len(),
                    "candidate strategy completed"
                );
                StrategyOutcome::Fetched(products)
            }
            Ok(Err(error)) => {
                warn!(
                    event_name = "recommendation.strategy.failed",
                    strategy = strategy.kind.as_str(),
                    error = %error,
                    "candidate strategy failed; continuing without it"
                );
                StrategyOutcome::Failed(error)
            }
            Err(_) => {
                let timeout_ms =
                    u64::try_from(self.strategy_timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(
                    event_name = "recommendation.strategy.timeout",
                    strategy = strategy.kind.as_str(),
                    timeout_ms,
                    "candidate strategy timed out; continuing without it"
                );
                StrategyOutcome::TimedOut
            }
        }
    }
}

fn merge_outcomes(
    outcomes: Vec<(StrategyKind, StrategyOutcome)>,
) -> Result<Vec<Product>, StoreError> {
    let mut candidates = Vec::new();
    let mut attempted = 0usize;
    let mut answered = 0usize;
    let mut first_error = None;

    for (_, outcome) in outcomes {
        match outcome {
            StrategyOutcome::Skipped => {}
            StrategyOutcome::Fetched(products) => {
                attempted += 1;
                answered += 1;
                candidates.extend(products);
            }
            StrategyOutcome::TimedOut => attempted += 1,
            StrategyOutcome::Failed(error) => {
                attempted += 1;
                first_error.get_or_insert(error);
            }
        }
    }

    // The store must answer at least one attempted strategy.
    if attempted > 0 && answered == 0 {
        return Err(first_error.unwrap_or_else(|| {
            StoreError::Unavailable("every candidate strategy timed out".to_string())
        }));
    }
    Ok(candidates)
}
