use std::sync::Arc;

use serde_json::json;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;
use vitrine_core::errors::ApplicationError;
use vitrine_core::recommendation::{Recommendation, RecommendationEngine, RecommendationSettings};
use vitrine_db::RepositoryStore;

use crate::commands::{open_current, prepare, CommandResult};

pub fn run(user_id: &str, limit: Option<i64>) -> CommandResult {
    let (config, runtime) = match prepare("recommend") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };
    let correlation_id = Uuid::new_v4().to_string();
    let settings = RecommendationSettings::from(&config.recommendation);

    // Bad input is reported before any connection is opened.
    let request = match settings.validate_request(user_id, limit) {
        Ok(request) => request,
        Err(error) => return engine_failure(ApplicationError::from(error), &correlation_id),
    };

    let span = info_span!("recommend", correlation_id = %correlation_id, user_id = %user_id);
    let result = runtime.block_on(
        async {
            let pool = open_current(&config).await.map_err(|(error_class, message, code)| {
                CommandResult::failure("recommend", error_class, message, code)
            })?;
            let store = Arc::new(RepositoryStore::sql(pool.clone()));
            let engine = RecommendationEngine::new(store, settings);

            let ranked = engine.execute(request).await;
            pool.close().await;

            ranked.map_err(|error| engine_failure(error, &correlation_id))
        }
        .instrument(span),
    );

    match result {
        Ok(recommendations) => render(user_id, &correlation_id, &recommendations),
        Err(failure) => failure,
    }
}

fn engine_failure(error: ApplicationError, correlation_id: &str) -> CommandResult {
    let interface = error.into_interface(correlation_id);
    warn!(
        event_name = "cli.recommend.failed",
        correlation_id,
        error_class = interface.error_class(),
        error = %interface,
        "recommendation request failed"
    );
    CommandResult::failure_with_data(
        "recommend",
        interface.error_class(),
        interface.to_string(),
        7,
        Some(json!({
            "correlation_id": correlation_id,
            "hint": interface.user_message(),
        })),
    )
}

fn render(
    user_id: &str,
    correlation_id: &str,
    recommendations: &[Recommendation],
) -> CommandResult {
    let items = match serde_json::to_value(recommendations) {
        Ok(items) => items,
        Err(error) => {
            return CommandResult::failure("recommend", "serialization", error.to_string(), 7);
        }
    };
    info!(
        event_name = "cli.recommend.completed",
        correlation_id,
        returned = recommendations.len(),
        "recommendations rendered"
    );

    let message = match recommendations.first() {
        Some(first) => {
            format!("ranked {} products ({})", recommendations.len(), first.source.as_str())
        }
        None => "no products to recommend".to_string(),
    };
    CommandResult::success_with_data(
        "recommend",
        message,
        json!({
            "user_id": user_id,
            "correlation_id": correlation_id,
            "recommendations": items,
        }),
    )
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::Value;
    use vitrine_core::domain::product::{Category, Color, PieceType, Product, ProductId, Size};
    use vitrine_core::recommendation::{Recommendation, RecommendationSource};

    use super::render;

    #[test]
    fn renders_flattened_products_with_source() {
        let product = Product {
            id: ProductId::new(),
            name: "Shorts Esportivo".to_string(),
            category: Category::Esportivo,
            piece_type: PieceType::Shorts,
            color: Color::Preto,
            size: Size::M,
            price: Decimal::new(3990, 2),
            stock_quantity: 35,
        };
        let recommendation = Recommendation {
            recommendation_score: 3.0,
            ..Recommendation::unscored(product, RecommendationSource::Popular)
        };

        let result = render("user-1", "req-1", &[recommendation]);
        let payload: Value = serde_json::from_str(&result.output).expect("json");

        assert_eq!(result.exit_code, 0);
        assert_eq!(payload["message"], "ranked 1 products (popular)");
        let first = &payload["data"]["recommendations"][0];
        assert_eq!(first["name"], "Shorts Esportivo");
        assert_eq!(first["source"], "popular");
        assert_eq!(first["recommendation_score"], 3.0);
    }

    #[test]
    fn empty_list_is_still_success() {
        let result = render("user-1", "req-1", &[]);
        let payload: Value = serde_json::from_str(&result.output).expect("json");

        assert_eq!(result.exit_code, 0);
        assert_eq!(payload["data"]["recommendations"], Value::Array(Vec::new()));
    }
}
