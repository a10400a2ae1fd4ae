pub mod config;
pub mod domain;
pub mod errors;
pub mod recommendation;

pub use config::{AppConfig, BudgetMode, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::product::{Category, Color, PieceType, Product, ProductId, Size};
pub use domain::purchase::{Purchase, PurchaseId};
pub use domain::user::{User, UserId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use recommendation::{
    CatalogStore, PopularProduct, ProductFilter, Recommendation, RecommendationEngine,
    RecommendationSettings, RecommendationSource, StoreError,
};
