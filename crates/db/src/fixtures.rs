use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use vitrine_core::domain::product::{Category, Color, PieceType, Product, ProductId, Size};
use vitrine_core::domain::purchase::{Purchase, PurchaseId};
use vitrine_core::domain::user::{User, UserId};

use crate::repositories::RepositoryError;
use crate::store::RepositoryStore;

/// Demo purchases are dated relative to this instant (2024-03-01T12:00:00Z).
const SEED_EPOCH_SECS: i64 = 1_709_294_400;

const PRODUCT_ID_BASE: u128 = 0x5e3d_0000_0000_4000_8000_0000_0000_0000;
const USER_ID_BASE: u128 = 0x5e3d_0000_0000_4000_8000_0001_0000_0000;
const PURCHASE_ID_BASE: u128 = 0x5e3d_0000_0000_4000_8000_0002_0000_0000;

struct SeedProduct {
    name: &'static str,
    category: Category,
    piece_type: PieceType,
    color: Color,
    size: Size,
    price_cents: i64,
    stock_quantity: u32,
}

const SEED_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Camiseta Básica Algodão",
        category: Category::Casual,
        piece_type: PieceType::Camiseta,
        color: Color::Branco,
        size: Size::M,
        price_cents: 2990,
        stock_quantity: 50,
    },
    SeedProduct {
        name: "Camiseta Básica Algodão",
        category: Category::Casual,
        piece_type: PieceType::Camiseta,
        color: Color::Preto,
        size: Size::M,
        price_cents: 2990,
        stock_quantity: 45,
    },
    SeedProduct {
        name: "Camiseta Básica Algodão",
        category: Category::Casual,
        piece_type: PieceType::Camiseta,
        color: Color::Azul,
        size: Size::G,
        price_cents: 2990,
        stock_quantity: 40,
    },
    SeedProduct {
        name: "Calça Jeans Skinny",
        category: Category::Casual,
        piece_type: PieceType::Calca,
        color: Color::Azul,
        size: Size::Eu38,
        price_cents: 8990,
        stock_quantity: 30,
    },
    SeedProduct {
        name: "Calça Jeans Reta",
        category: Category::Casual,
        piece_type: PieceType::Calca,
        color: Color::Preto,
        size: Size::Eu40,
        price_cents: 7990,
        stock_quantity: 25,
    },
    SeedProduct {
        name: "Vestido Floral Verão",
        category: Category::Casual,
        piece_type: PieceType::Vestido,
        color: Color::Rosa,
        size: Size::P,
        price_cents: 11990,
        stock_quantity: 20,
    },
    SeedProduct {
        name: "Vestido Longo Festa",
        category: Category::Festa,
        piece_type: PieceType::Vestido,
        color: Color::Preto,
        size: Size::M,
        price_cents: 19990,
        stock_quantity: 15,
    },
    SeedProduct {
        name: "Blusa Social Feminina",
        category: Category::Formal,
        piece_type: PieceType::Blusa,
        color: Color::Branco,
        size: Size::M,
        price_cents: 6990,
        stock_quantity: 35,
    },
    SeedProduct {
        name: "Blusa Casual Manga Longa",
        category: Category::Casual,
        piece_type: PieceType::Blusa,
        color: Color::Cinza,
        size: Size::G,
        price_cents: 4990,
        stock_quantity: 40,
    },
    SeedProduct {
        name: "Jaqueta Jeans Clássica",
        category: Category::Casual,
        piece_type: PieceType::Jaqueta,
        color: Color::Azul,
        size: Size::M,
        price_cents: 12990,
        stock_quantity: 18,
    },
    SeedProduct {
        name: "Casaco de Inverno",
        category: Category::Inverno,
        piece_type: PieceType::Casaco,
        color: Color::Preto,
        size: Size::G,
        price_cents: 24990,
        stock_quantity: 12,
    },
    SeedProduct {
        name: "Shorts Jeans Feminino",
        category: Category::Casual,
        piece_type: PieceType::Shorts,
        color: Color::Azul,
        size: Size::Eu36,
        price_cents: 5990,
        stock_quantity: 28,
    },
    SeedProduct {
        name: "Shorts Esportivo",
        category: Category::Esportivo,
        piece_type: PieceType::Shorts,
        color: Color::Preto,
        size: Size::M,
        price_cents: 3990,
        stock_quantity: 35,
    },
    SeedProduct {
        name: "Saia Midi Plissada",
        category: Category::Formal,
        piece_type: PieceType::Saia,
        color: Color::Bege,
        size: Size::M,
        price_cents: 8990,
        stock_quantity: 0,
    },
];

struct SeedUser {
    name: &'static str,
    email: &'static str,
}

const SEED_USERS: &[SeedUser] = &[
    SeedUser { name: "Ana Souza", email: "ana.souza@example.com" },
    SeedUser { name: "Bruno Lima", email: "bruno.lima@example.com" },
    SeedUser { name: "Carla Dias", email: "carla.dias@example.com" },
];

/// (user index, product index, quantity, days before the seed epoch)
const SEED_PURCHASES: &[(usize, usize, u32, i64)] = &[
    (0, 2, 2, 40),
    (0, 3, 1, 21),
    (0, 0, 1, 7),
    (1, 7, 1, 30),
    (1, 6, 1, 12),
    (1, 12, 3, 2),
];

/// Deterministic demo catalog: apparel across categories, three shoppers, and a
/// short purchase history. The third shopper has no purchases.
pub struct DemoDataset;

impl DemoDataset {
    pub fn product_id(index: usize) -> ProductId {
        ProductId(Uuid::from_u128(PRODUCT_ID_BASE + index as u128))
    }

    pub fn user_id(index: usize) -> UserId {
        UserId(Uuid::from_u128(USER_ID_BASE + index as u128))
    }

    pub fn products() -> Vec<Product> {
        SEED_PRODUCTS
            .iter()
            .enumerate()
            .map(|(index, seed)| Product {
                id: Self::product_id(index),
                name: seed.name.to_string(),
                category: seed.category,
                piece_type: seed.piece_type,
                color: seed.color,
                size: seed.size,
                price: Decimal::new(seed.price_cents, 2),
                stock_quantity: seed.stock_quantity,
            })
            .collect()
    }

    pub fn users() -> Result<Vec<User>, RepositoryError> {
        let epoch = seed_epoch()?;
        Ok(SEED_USERS
            .iter()
            .enumerate()
            .map(|(index, seed)| User {
                id: Self::user_id(index),
                name: seed.name.to_string(),
                email: Some(seed.email.to_string()),
                created_at: epoch - Duration::days(90),
            })
            .collect())
    }

    pub fn purchases() -> Result<Vec<Purchase>, RepositoryError> {
        let epoch = seed_epoch()?;
        let products = Self::products();
        SEED_PURCHASES
            .iter()
            .enumerate()
            .map(|(index, &(user, product, quantity, days_ago))| {
                let product = products.get(product).ok_or_else(|| {
                    RepositoryError::Decode(format!("seed purchase {index} names no product"))
                })?;
                Ok::<Purchase, RepositoryError>(Purchase {
                    id: PurchaseId(Uuid::from_u128(PURCHASE_ID_BASE + index as u128)),
                    user_id: Self::user_id(user),
                    product_id: product.id,
                    quantity,
                    product_name: product.name.clone(),
                    product_price: product.price,
                    purchased_at: epoch - Duration::days(days_ago),
                })
            })
            .collect()
    }

    /// Upserts the demo dataset. Running it twice leaves the same rows.
    pub async fn load(store: &RepositoryStore) -> Result<SeedResult, RepositoryError> {
        let products = Self::products();
        let users = Self::users()?;
        let purchases = Self::purchases()?;
        let result = SeedResult {
            products: products.len(),
            users: users.len(),
            purchases: purchases.len(),
        };

        for user in users {
            store.users().save(user).await?;
        }
        for product in products {
            store.products().save(product).await?;
        }
        for purchase in purchases {
            store.purchases().save(purchase).await?;
        }

        info!(
            event_name = "db.seed.loaded",
            products = result.products,
            users = result.users,
            purchases = result.purchases,
            "demo dataset loaded"
        );
        Ok(result)
    }

    /// Checks that every demo row is present.
    pub async fn verify(store: &RepositoryStore) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let mut products_present = true;
        for index in 0..SEED_PRODUCTS.len() {
            let product = store.products().find_by_id(&Self::product_id(index)).await?;
            products_present &= product.is_some();
        }
        checks.push(("products", products_present));

        let mut users_present = true;
        for index in 0..SEED_USERS.len() {
            users_present &= store.users().exists(&Self::user_id(index)).await?;
        }
        checks.push(("users", users_present));

        let mut histories_match = true;
        for index in 0..SEED_USERS.len() {
            let expected = SEED_PURCHASES.iter().filter(|(user, ..)| *user == index).count();
            let actual = store.purchases().list_for_user(&Self::user_id(index)).await?.len();
            histories_match &= actual >= expected;
        }
        checks.push(("purchase-histories", histories_match));

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }
}

fn seed_epoch() -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::from_timestamp(SEED_EPOCH_SECS, 0)
        .ok_or_else(|| RepositoryError::Decode("seed epoch out of range".to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedResult {
    pub products: usize,
    pub users: usize,
    pub purchases: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
