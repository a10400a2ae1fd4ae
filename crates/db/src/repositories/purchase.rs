use sqlx::Row;

use vitrine_core::domain::product::ProductId;
use vitrine_core::domain::purchase::{Purchase, PurchaseId};
use vitrine_core::domain::user::UserId;
use vitrine_core::recommendation::PopularProduct;

use super::{
    decode_error, format_timestamp, parse_decimal, parse_timestamp, parse_uuid, sql_limit,
    PurchaseRepository, RepositoryError,
};
use crate::DbPool;

pub struct SqlPurchaseRepository {
    pool: DbPool,
}

impl SqlPurchaseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_purchase(row: &sqlx::sqlite::SqliteRow) -> Result<Purchase, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let product_id: String =
        row.try_get("product_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let quantity: i64 =
        row.try_get("quantity").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let product_name: String =
        row.try_get("product_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let product_price: String =
        row.try_get("product_price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let purchased_at: String =
        row.try_get("purchased_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Purchase {
        id: PurchaseId(parse_uuid("purchase.id", &id)?),
        user_id: UserId(parse_uuid("purchase.user_id", &user_id)?),
        product_id: ProductId(parse_uuid("purchase.product_id", &product_id)?),
        quantity: u32::try_from(quantity)
            .map_err(|error| decode_error("purchase.quantity", error))?,
        product_name,
        product_price: parse_decimal("purchase.product_price", &product_price)?,
        purchased_at: parse_timestamp("purchase.purchased_at", &purchased_at)?,
    })
}

#[async_trait::async_trait]
impl PurchaseRepository for SqlPurchaseRepository {
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Purchase>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, product_id, quantity, product_name, product_price, purchased_at
             FROM purchase
             WHERE user_id = ?
             ORDER BY purchased_at DESC, id DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_purchase).collect::<Result<Vec<_>, _>>()
    }

    async fn top_products(&self, limit: usize) -> Result<Vec<PopularProduct>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT product_id, SUM(quantity) AS total_quantity
             FROM purchase
             GROUP BY product_id
             ORDER BY total_quantity DESC, product_id ASC
             LIMIT ?",
        )
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let product_id: String = row
                    .try_get("product_id")
                    .map_err(|e| RepositoryError::Decode(e.to_string()))?;
                let total_quantity: i64 = row
                    .try_get("total_quantity")
                    .map_err(|e| RepositoryError::Decode(e.to_string()))?;
                Ok(PopularProduct {
                    product_id: ProductId(parse_uuid("purchase.product_id", &product_id)?),
                    total_quantity: u64::try_from(total_quantity)
                        .map_err(|error| decode_error("purchase.total_quantity", error))?,
                })
            })
            .collect()
    }

    async fn save(&self, purchase: Purchase) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO purchase (id, user_id, product_id, quantity, product_name,
                                   product_price, purchased_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 quantity = excluded.quantity,
                 product_name = excluded.product_name,
                 product_price = excluded.product_price,
                 purchased_at = excluded.purchased_at",
        )
        .bind(purchase.id.0.to_string())
        .bind(purchase.user_id.to_string())
        .bind(purchase.product_id.to_string())
        .bind(i64::from(purchase.quantity))
        .bind(&purchase.product_name)
        .bind(purchase.product_price.to_string())
        .bind(format_timestamp(&purchase.purchased_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM purchase")
            .fetch_one(&self.pool)
            .await?;
        u64::try_from(count).map_err(|error| decode_error("purchase.count", error))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use vitrine_core::domain::product::ProductId;
    use vitrine_core::domain::purchase::{Purchase, PurchaseId};
    use vitrine_core::domain::user::{User, UserId};

    use super::SqlPurchaseRepository;
    use crate::repositories::{PurchaseRepository, SqlUserRepository, UserRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    async fn user(pool: &DbPool) -> UserId {
        let user = User {
            id: UserId::new(),
            name: "Ana Souza".to_string(),
            email: Some("ana@example.com".to_string()),
            created_at: Utc::now(),
        };
        let id = user.id;
        SqlUserRepository::new(pool.clone()).save(user).await.expect("save user");
        id
    }

    fn purchase(user_id: UserId, product_id: ProductId, quantity: u32, minute: i64) -> Purchase {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single().expect("valid time");
        Purchase {
            id: PurchaseId::new(),
            user_id,
            product_id,
            quantity,
            product_name: "Camiseta Básica Algodão".to_string(),
            product_price: Decimal::new(2990, 2),
            purchased_at: base + Duration::minutes(minute),
        }
    }

    #[tokio::test]
    async fn history_is_newest_first_and_scoped_to_user() {
        let pool = pool().await;
        let repo = SqlPurchaseRepository::new(pool.clone());
        let ana = user(&pool).await;
        let bruno = user(&pool).await;

        let first = purchase(ana, ProductId::new(), 1, 0);
        let second = purchase(ana, ProductId::new(), 2, 30);
        let other = purchase(bruno, ProductId::new(), 1, 10);
        for line in [&first, &second, &other] {
            repo.save(line.clone()).await.expect("save purchase");
        }

        let history = repo.list_for_user(&ana).await.expect("history");
        assert_eq!(history, vec![second, first]);
        assert!(repo.list_for_user(&UserId::new()).await.expect("empty").is_empty());
    }

    #[tokio::test]
    async fn top_products_sum_quantity_and_break_ties_by_id() {
        let pool = pool().await;
        let repo = SqlPurchaseRepository::new(pool.clone());
        let ana = user(&pool).await;

        let low = ProductId("00000000-0000-4000-8000-000000000001".parse().expect("uuid"));
        let high = ProductId("00000000-0000-4000-8000-000000000002".parse().expect("uuid"));
        let best = ProductId::new();
        repo.save(purchase(ana, high, 2, 0)).await.expect("save");
        repo.save(purchase(ana, low, 1, 1)).await.expect("save");
        repo.save(purchase(ana, low, 1, 2)).await.expect("save");
        repo.save(purchase(ana, best, 5, 3)).await.expect("save");

        let top = repo.top_products(10).await.expect("top");
        let ranked: Vec<_> = top.iter().map(|p| (p.product_id, p.total_quantity)).collect();
        assert_eq!(ranked, vec![(best, 5), (low, 2), (high, 2)]);

        assert_eq!(repo.top_products(1).await.expect("top one").len(), 1);
        assert_eq!(repo.count().await.expect("count"), 4);
    }
}
