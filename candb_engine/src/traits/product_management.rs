use thiserror::Error;

use crate::{
    availability::{AvailabilityError, AvailabilityMap},
    db_types::{NewProduct, Product, ProductId, ProductUpdate, StockLevels, ValidationError},
    product_objects::ProductQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum ProductApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Product {0} is referenced by order lines and cannot be deleted")]
    ProductInUse(ProductId),
    #[error("Product {0} was modified by someone else. Reload it and try again.")]
    StaleVersion(ProductId),
    #[error("Invalid product data. {0}")]
    ValidationError(#[from] ValidationError),
    #[error("{0}")]
    AvailabilityError(#[from] AvailabilityError),
}

impl From<sqlx::Error> for ProductApiError {
    fn from(e: sqlx::Error) -> Self {
        ProductApiError::DatabaseError(e.to_string())
    }
}

/// Storage for products. Every write that changes a product bumps its `version`; writes that carry a version fail
/// with [`ProductApiError::StaleVersion`] if the stored row has moved on.
#[allow(async_fn_in_trait)]
pub trait ProductManagement {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, ProductApiError>;

    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, ProductApiError>;

    /// Products matching the filter, ordered by name.
    async fn search_products(&self, query: ProductQueryFilter) -> Result<Vec<Product>, ProductApiError>;

    async fn update_product(
        &self,
        id: &ProductId,
        version: i64,
        update: ProductUpdate,
    ) -> Result<Product, ProductApiError>;

    /// Replaces the availability map. `None` removes it, so that model stock decides.
    async fn set_availability(
        &self,
        id: &ProductId,
        version: i64,
        availability: Option<AvailabilityMap>,
    ) -> Result<Product, ProductApiError>;

    async fn set_stock_levels(
        &self,
        id: &ProductId,
        version: i64,
        levels: StockLevels,
    ) -> Result<Product, ProductApiError>;

    /// Returns false if there was no such product.
    async fn delete_product(&self, id: &ProductId) -> Result<bool, ProductApiError>;
}
