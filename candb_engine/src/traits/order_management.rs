use candb_common::Money;
use thiserror::Error;

use crate::{
    availability::AvailabilityError,
    db_types::{
        NewOrder,
        NewOrderLine,
        Order,
        OrderId,
        OrderLine,
        OrderLineId,
        OrderLineStatus,
        Product,
        ProductId,
        ValidationError,
    },
    order_objects::OrderQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order line {0} does not exist")]
    OrderLineNotFound(OrderLineId),
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Profile #{0} does not exist")]
    ProfileNotFound(i64),
    #[error("{0} was modified by someone else. Try again.")]
    StaleVersion(String),
    #[error("Product {product_id} cannot supply {requested} units right now")]
    InsufficientStock { product_id: ProductId, requested: i64 },
    #[error("Order line {id} is {from} and cannot be changed to {to}")]
    InvalidStatusChange { id: OrderLineId, from: OrderLineStatus, to: OrderLineStatus },
    #[error("Invalid order data. {0}")]
    ValidationError(#[from] ValidationError),
    #[error("{0}")]
    AvailabilityError(#[from] AvailabilityError),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

/// Storage for orders and order lines.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderFlowError>;

    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, OrderFlowError>;

    /// Orders matching the filter, oldest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError>;

    async fn fetch_order_lines(&self, order_id: &OrderId) -> Result<Vec<OrderLine>, OrderFlowError>;

    async fn fetch_order_line(&self, id: &OrderLineId) -> Result<Option<OrderLine>, OrderFlowError>;

    /// Stores a new order line for `product` in a single transaction.
    ///
    /// If the line reserves stock (`quantity_reserved > 0`), the product's `reserved_stock` is increased by that amount
    /// in the same transaction, provided the product is still at the version held in `product`. Otherwise the call
    /// fails with [`OrderFlowError::StaleVersion`] and nothing is written.
    async fn place_order_line(&self, product: &Product, line: NewOrderLine) -> Result<OrderLine, OrderFlowError>;

    /// Changes the status of an order line. When the new status releases stock, any quantity the line still holds in
    /// reserve is handed back to the product in the same transaction.
    async fn update_line_status(&self, id: &OrderLineId, status: OrderLineStatus) -> Result<OrderLine, OrderFlowError>;

    /// Sets or clears the forced price of an order line and recomputes its item cost.
    async fn force_line_price(&self, id: &OrderLineId, price: Option<Money>) -> Result<OrderLine, OrderFlowError>;
}
