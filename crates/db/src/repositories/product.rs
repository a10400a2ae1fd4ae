use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Row, Sqlite};

use vitrine_core::domain::product::{Category, Color, PieceType, Product, ProductId, Size};
use vitrine_core::recommendation::ProductFilter;

use super::{decode_error, parse_decimal, parse_uuid, sql_limit, ProductRepository, RepositoryError};
use crate::DbPool;

const PRODUCT_COLUMNS: &str =
    "SELECT id, name, category, piece_type, color, size, price, stock_quantity FROM product";

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let category: String =
        row.try_get("category").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let piece_type: String =
        row.try_get("piece_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let color: String = row.try_get("color").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let size: String = row.try_get("size").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let price: String = row.try_get("price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let stock_quantity: i64 =
        row.try_get("stock_quantity").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Product {
        id: ProductId(parse_uuid("product.id", &id)?),
        name,
        category: Category::parse(&category)
            .ok_or_else(|| decode_error("product.category", &category))?,
        piece_type: PieceType::parse(&piece_type)
            .ok_or_else(|| decode_error("product.piece_type", &piece_type))?,
        color: Color::parse(&color).ok_or_else(|| decode_error("product.color", &color))?,
        size: Size::parse(&size).ok_or_else(|| decode_error("product.size", &size))?,
        price: parse_decimal("product.price", &price)?,
        stock_quantity: u32::try_from(stock_quantity)
            .map_err(|error| decode_error("product.stock_quantity", error))?,
    })
}

/// Prices are stored as decimal text. The REAL comparison is widened so it never
/// drops a row the decimal comparison keeps; `ProductFilter::matches` settles the edge.
fn widened_price_bound(value: Decimal, direction: f64) -> f64 {
    let approx = value.to_f64().unwrap_or(direction * f64::MAX);
    approx + direction * approx.abs().max(1.0) * 1e-9
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &ProductFilter) {
    query.push(" WHERE 1=1");
    if filter.in_stock_only {
        query.push(" AND stock_quantity > 0");
    }
    if let Some(category) = filter.category {
        query.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(piece_type) = filter.piece_type {
        query.push(" AND piece_type = ").push_bind(piece_type.as_str());
    }
    if let Some(color) = filter.color {
        query.push(" AND color = ").push_bind(color.as_str());
    }
    if let Some(min_price) = filter.min_price {
        query.push(" AND CAST(price AS REAL) >= ").push_bind(widened_price_bound(min_price, -1.0));
    }
    if let Some(max_price) = filter.max_price {
        query.push(" AND CAST(price AS REAL) <= ").push_bind(widened_price_bound(max_price, 1.0));
    }
    if !filter.exclude_ids.is_empty() {
        query.push(" AND id NOT IN (");
        let mut separated = query.separated(", ");
        for id in &filter.exclude_ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(")");
    }
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("{PRODUCT_COLUMNS} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn list(
        &self,
        filter: &ProductFilter,
        limit: usize,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut products = Vec::with_capacity(limit.min(64));
        let mut offset = 0usize;
        while products.len() < limit {
            let mut query = QueryBuilder::<Sqlite>::new(PRODUCT_COLUMNS);
            push_filter(&mut query, filter);
            query
                .push(" ORDER BY name ASC, id ASC LIMIT ")
                .push_bind(sql_limit(limit))
                .push(" OFFSET ")
                .push_bind(sql_limit(offset));

            let rows = query.build().fetch_all(&self.pool).await?;
            for row in &rows {
                let product = row_to_product(row)?;
                if products.len() < limit && filter.matches(&product) {
                    products.push(product);
                }
            }
            if rows.len() < limit {
                break;
            }
            offset += rows.len();
        }
        Ok(products)
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO product (id, name, category, piece_type, color, size, price, stock_quantity)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 category = excluded.category,
                 piece_type = excluded.piece_type,
                 color = excluded.color,
                 size = excluded.size,
                 price = excluded.price,
                 stock_quantity = excluded.stock_quantity",
        )
        .bind(product.id.to_string())
        .bind(&product.name)
        .bind(product.category.as_str())
        .bind(product.piece_type.as_str())
        .bind(product.color.as_str())
        .bind(product.size.as_str())
        .bind(product.price.to_string())
        .bind(i64::from(product.stock_quantity))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM product")
            .fetch_one(&self.pool)
            .await?;
        u64::try_from(count).map_err(|error| decode_error("product.count", error))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use vitrine_core::domain::product::{Category, Color, PieceType, Product, ProductId, Size};
    use vitrine_core::recommendation::ProductFilter;

    use super::SqlProductRepository;
    use crate::repositories::ProductRepository;
    use crate::{connect_with_settings, migrations};

    async fn repo() -> SqlProductRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlProductRepository::new(pool)
    }

    fn product(name: &str, category: Category, price: Decimal, stock: u32) -> Product {
        Product {
            id: ProductId::new(),
            name: name.to_string(),
            category,
            piece_type: PieceType::Calca,
            color: Color::Azul,
            size: Size::Eu38,
            price,
            stock_quantity: stock,
        }
    }

    #[tokio::test]
    async fn save_and_find_preserves_accents_and_decimal_price() {
        let repo = repo().await;
        let jeans = product("Calça Jeans Skinny", Category::Casual, Decimal::new(8990, 2), 30);

        repo.save(jeans.clone()).await.expect("save");
        let found = repo.find_by_id(&jeans.id).await.expect("find");

        assert_eq!(found, Some(jeans));
        assert_eq!(repo.find_by_id(&ProductId::new()).await.expect("find missing"), None);
    }

    #[tokio::test]
    async fn save_upserts_stock_changes() {
        let repo = repo().await;
        let mut jeans = product("Calça Jeans Reta", Category::Casual, Decimal::new(7990, 2), 25);
        repo.save(jeans.clone()).await.expect("save");

        jeans.stock_quantity = 0;
        repo.save(jeans.clone()).await.expect("update");

        assert_eq!(repo.count().await.expect("count"), 1);
        let found = repo.find_by_id(&jeans.id).await.expect("find").expect("present");
        assert!(!found.in_stock());
    }

    #[tokio::test]
    async fn list_applies_every_filter_clause() {
        let repo = repo().await;
        let cheap = product("A Calça", Category::Casual, Decimal::new(6999, 2), 5);
        let edge = product("B Calça", Category::Casual, Decimal::new(13000, 2), 5);
        let over = product("C Calça", Category::Casual, Decimal::new(13001, 2), 5);
        let owned = product("D Calça", Category::Casual, Decimal::from(100), 5);
        let sold_out = product("E Calça", Category::Casual, Decimal::from(100), 0);
        let formal = product("F Calça", Category::Formal, Decimal::from(100), 5);
        for item in [&cheap, &edge, &over, &owned, &sold_out, &formal] {
            repo.save(item.clone()).await.expect("save");
        }

        let filter = ProductFilter::in_stock()
            .with_category(Category::Casual)
            .with_piece_type(PieceType::Calca)
            .with_color(Color::Azul)
            .with_price_range(Decimal::from(70), Decimal::from(130))
            .excluding([owned.id]);
        let listed = repo.list(&filter, 10).await.expect("list");

        assert_eq!(listed, vec![edge]);
    }

    #[tokio::test]
    async fn price_edges_follow_decimal_comparison() {
        let repo = repo().await;
        // 70.0000000000000000001 and 130.0000000000000000001 both round to whole doubles
        let min = Decimal::from_str_exact("70.0000000000000000001").expect("min");
        let max = Decimal::from_str_exact("130.0000000000000000001").expect("max");
        let below = product("A Calça", Category::Casual, Decimal::from(70), 5);
        let low = product("B Calça", Category::Casual, Decimal::new(7001, 2), 5);
        let high = product("C Calça", Category::Casual, Decimal::from(130), 5);
        for item in [&below, &low, &high] {
            repo.save(item.clone()).await.expect("save");
        }

        let filter = ProductFilter::default().with_price_range(min, max);
        let listed = repo.list(&filter, 1).await.expect("list");

        assert_eq!(listed, vec![low.clone()]);
        assert_eq!(repo.list(&filter, 10).await.expect("list"), vec![low, high]);
    }

    #[tokio::test]
    async fn list_orders_by_name_and_honours_limit() {
        let repo = repo().await;
        for name in ["Saia Midi", "Blusa Social", "Jaqueta Jeans"] {
            repo.save(product(name, Category::Casual, Decimal::from(50), 3)).await.expect("save");
        }

        let listed = repo.list(&ProductFilter::default(), 2).await.expect("list");
        let names: Vec<_> = listed.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(names, vec!["Blusa Social", "Jaqueta Jeans"]);
    }
}
