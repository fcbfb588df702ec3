use std::fmt::Debug;

use log::*;

use crate::{
    availability::{AvailabilityEngine, AvailabilityMap, StockQuery},
    db_types::{NewProduct, Product, ProductId, ProductUpdate, StockLevels},
    product_objects::{ProductQueryFilter, StockCheckResult},
    traits::{ProductApiError, ProductManagement},
};

/// `ProductApi` manages the product catalogue and answers stock checks.
pub struct ProductApi<B> {
    db: B,
    engine: AvailabilityEngine,
}

impl<B: Debug> Debug for ProductApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProductApi ({:?}, tz {})", self.db, self.engine.timezone())
    }
}

impl<B> ProductApi<B> {
    pub fn new(db: B, engine: AvailabilityEngine) -> Self {
        Self { db, engine }
    }

    pub fn engine(&self) -> &AvailabilityEngine {
        &self.engine
    }
}

impl<B> ProductApi<B>
where B: ProductManagement
{
    pub async fn create_product(&self, product: NewProduct) -> Result<Product, ProductApiError> {
        let product = self.db.insert_product(product).await?;
        info!("📦️ Product {} ({}) created", product.id, product.name);
        Ok(product)
    }

    pub async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, ProductApiError> {
        self.db.fetch_product(id).await
    }

    /// Like [`Self::fetch_product`], but a missing product is an error.
    pub async fn product(&self, id: &ProductId) -> Result<Product, ProductApiError> {
        self.db.fetch_product(id).await?.ok_or_else(|| ProductApiError::ProductNotFound(id.clone()))
    }

    pub async fn search_products(&self, query: ProductQueryFilter) -> Result<Vec<Product>, ProductApiError> {
        trace!("📦️ Searching products. {query}");
        self.db.search_products(query).await
    }

    /// The version a write should be checked against. Callers that read the product earlier pass the version they saw;
    /// otherwise the current one is used.
    async fn version_for_write(&self, id: &ProductId, expected: Option<i64>) -> Result<i64, ProductApiError> {
        match expected {
            Some(v) => Ok(v),
            None => self.product(id).await.map(|p| p.version),
        }
    }

    pub async fn update_product(
        &self,
        id: &ProductId,
        expected_version: Option<i64>,
        update: ProductUpdate,
    ) -> Result<Product, ProductApiError> {
        let version = self.version_for_write(id, expected_version).await?;
        let product = self.db.update_product(id, version, update).await?;
        debug!("📦️ Product {id} updated to version {}", product.version);
        Ok(product)
    }

    /// Replaces the availability map of a product. Maps are validated when they are built, so anything that reaches
    /// this point decodes cleanly when read back.
    pub async fn set_availability(
        &self,
        id: &ProductId,
        expected_version: Option<i64>,
        availability: Option<AvailabilityMap>,
    ) -> Result<Product, ProductApiError> {
        let version = self.version_for_write(id, expected_version).await?;
        let product = self.db.set_availability(id, version, availability).await?;
        info!(
            "📦️ Availability for {id} set. {}",
            product.availability.as_ref().map(|m| format!("{} entries", m.len())).unwrap_or("Model stock".into())
        );
        Ok(product)
    }

    pub async fn set_stock_levels(
        &self,
        id: &ProductId,
        expected_version: Option<i64>,
        levels: StockLevels,
    ) -> Result<Product, ProductApiError> {
        let version = self.version_for_write(id, expected_version).await?;
        let product = self.db.set_stock_levels(id, version, levels).await?;
        info!("📦️ Stock for {id} set to {:?} physical, {:?} reserved", product.physical_stock, product.reserved_stock);
        Ok(product)
    }

    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ProductApiError> {
        if self.db.delete_product(id).await? {
            info!("📦️ Product {id} deleted");
            Ok(())
        } else {
            Err(ProductApiError::ProductNotFound(id.clone()))
        }
    }

    /// Asks the availability engine whether the product can supply the requested quantity.
    ///
    /// Configuration faults in the product's availability map are returned as errors and logged, since they need an
    /// operator's attention.
    pub async fn check_stock(&self, id: &ProductId, query: &StockQuery) -> Result<StockCheckResult, ProductApiError> {
        let product = self.product(id).await?;
        let decision = self.engine.evaluate(&product, query).map_err(|e| {
            if e.is_configuration_fault() {
                error!("📦️ Availability configuration of {id} is broken. {e}");
            }
            e
        })?;
        debug!(
            "📦️ Stock check for {} x {id}: {} (decided by {}, {})",
            query.quantity, decision.available, decision.source, decision.indicator
        );
        Ok(StockCheckResult {
            product_id: product.id,
            quantity: query.quantity,
            available: decision.available,
            source: decision.source,
            indicator: decision.indicator,
        })
    }
}
