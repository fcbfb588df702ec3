use std::fmt::Debug;

use candb_common::Money;
use log::*;

use crate::{
    availability::{AvailabilityEngine, StockQuery, StockSource},
    db_types::{NewOrder, NewOrderLine, Order, OrderId, OrderLine, OrderLineId, OrderLineStatus, ValidationError},
    events::{EventProducers, OrderCreatedEvent, OrderLineAddedEvent, OrderLineStatusChangedEvent},
    order_objects::{NewLineRequest, OrderQueryFilter, OrderWithLines},
    traits::{OrderFlowError, OrderManagement, ProductApiError, ProductManagement},
};

/// How many times a line placement is re-evaluated when another writer changed the product in between.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 3;

impl From<ProductApiError> for OrderFlowError {
    fn from(e: ProductApiError) -> Self {
        match e {
            ProductApiError::ProductNotFound(id) => OrderFlowError::ProductNotFound(id),
            ProductApiError::StaleVersion(id) => OrderFlowError::StaleVersion(format!("Product {id}")),
            ProductApiError::ValidationError(e) => OrderFlowError::ValidationError(e),
            ProductApiError::AvailabilityError(e) => OrderFlowError::AvailabilityError(e),
            e => OrderFlowError::DatabaseError(e.to_string()),
        }
    }
}

/// `OrderFlowApi` handles orders and order lines. Every line goes through the availability engine before it is stored.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
    engine: AvailabilityEngine,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers, engine: AvailabilityEngine) -> Self {
        Self { db, producers, engine }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement + ProductManagement
{
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        let order = self.db.insert_order(order).await?;
        info!("🧾️ Order {} created for profile #{}", order.id, order.profile_id);
        for emitter in &self.producers.order_created_producer {
            emitter.publish_event(OrderCreatedEvent::new(order.clone())).await;
        }
        Ok(order)
    }

    /// Adds a line to an existing order.
    ///
    /// The availability engine decides, at the current time in the store's timezone, whether the product can supply
    /// the quantity. If not, the call fails with [`OrderFlowError::InsufficientStock`] and nothing is stored.
    ///
    /// Otherwise the line is stored with the product's current price as its unit price, and the source that approved
    /// it. When model stock approved a product that tracks its stock, the quantity is reserved on the product in the
    /// same transaction. Availability entries carry their own counters, which are not touched.
    ///
    /// If another writer changes the product between the decision and the write, the decision is taken again, up to
    /// [`MAX_PLACEMENT_ATTEMPTS`] times.
    pub async fn add_order_line(&self, order_id: &OrderId, request: NewLineRequest) -> Result<OrderLine, OrderFlowError> {
        let mut attempt = 1;
        loop {
            match self.try_place_line(order_id, &request).await {
                Err(OrderFlowError::StaleVersion(what)) if attempt < MAX_PLACEMENT_ATTEMPTS => {
                    debug!("🧾️ {what} changed while placing a line on {order_id}. Retrying (attempt {attempt})");
                    attempt += 1;
                },
                Ok(line) => {
                    info!("🧾️ Line {} added to {order_id}: {} x {}", line.id, line.quantity, line.product_id);
                    for emitter in &self.producers.order_line_added_producer {
                        emitter.publish_event(OrderLineAddedEvent::new(line.clone())).await;
                    }
                    return Ok(line);
                },
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_place_line(&self, order_id: &OrderId, request: &NewLineRequest) -> Result<OrderLine, OrderFlowError> {
        let product = self
            .db
            .fetch_product(&request.product_id)
            .await?
            .ok_or_else(|| OrderFlowError::ProductNotFound(request.product_id.clone()))?;
        let mut query = StockQuery::new(request.quantity);
        if request.search_until_found {
            query = query.search_until_found();
        }
        let decision = self.engine.evaluate(&product, &query).map_err(|e| {
            if e.is_configuration_fault() {
                error!("🧾️ Cannot decide stock for {}. Its availability configuration is broken. {e}", product.id);
            }
            e
        })?;
        if !decision.available {
            debug!("🧾️ {} cannot supply {} units ({} says {})", product.id, request.quantity, decision.source, decision.indicator);
            return Err(OrderFlowError::InsufficientStock {
                product_id: product.id.clone(),
                requested: request.quantity,
            });
        }
        let reserve = match decision.source {
            StockSource::ModelStock if product.physical_stock.is_some() => request.quantity,
            _ => 0,
        };
        let line = NewOrderLine {
            order_id: order_id.clone(),
            product_id: product.id.clone(),
            quantity: request.quantity,
            quantity_reserved: reserve,
            persistent_cost: Some(product.price),
            force_price: None,
            notes: request.notes.clone(),
            availability_id: decision.source.availability_id(),
        };
        self.db.place_order_line(&product, line).await
    }

    /// Sets the price of a line to an agreed total, or clears it with `None` so the line is priced per unit again.
    pub async fn force_line_price(&self, id: &OrderLineId, price: Option<Money>) -> Result<OrderLine, OrderFlowError> {
        if price.map(|p| p.is_negative()).unwrap_or(false) {
            return Err(ValidationError::Negative("forced price").into());
        }
        let line = self.db.force_line_price(id, price).await?;
        info!("🧾️ Line {id} forced price set to {price:?}. Item cost is now {:?}", line.item_cost);
        Ok(line)
    }

    /// Moves a line to a new status. Cancelling or returning a line hands any stock it reserved back to the product.
    /// Setting the status a line already has is a no-op.
    pub async fn update_line_status(
        &self,
        id: &OrderLineId,
        status: OrderLineStatus,
    ) -> Result<OrderLine, OrderFlowError> {
        let line = self.db.fetch_order_line(id).await?.ok_or_else(|| OrderFlowError::OrderLineNotFound(id.clone()))?;
        if line.status == status {
            debug!("🧾️ Line {id} is already {status}");
            return Ok(line);
        }
        let old_status = line.status;
        let updated = self.db.update_line_status(id, status).await?;
        info!("🧾️ Line {id} changed from {old_status} to {}", updated.status);
        for emitter in &self.producers.line_status_changed_producer {
            emitter.publish_event(OrderLineStatusChangedEvent::new(updated.clone(), old_status)).await;
        }
        Ok(updated)
    }

    pub async fn fetch_order(&self, id: &OrderId) -> Result<Option<OrderWithLines>, OrderFlowError> {
        let Some(order) = self.db.fetch_order(id).await? else {
            return Ok(None);
        };
        let lines = self.db.fetch_order_lines(id).await?;
        Ok(Some(OrderWithLines { order, lines }))
    }

    pub async fn fetch_order_lines(&self, id: &OrderId) -> Result<Vec<OrderLine>, OrderFlowError> {
        self.db.fetch_order_lines(id).await
    }

    pub async fn fetch_order_line(&self, id: &OrderLineId) -> Result<Option<OrderLine>, OrderFlowError> {
        self.db.fetch_order_line(id).await
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        trace!("🧾️ Searching orders. {query}");
        self.db.search_orders(query).await
    }
}
