use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderLine, OrderLineStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineAddedEvent {
    pub line: OrderLine,
}

impl OrderLineAddedEvent {
    pub fn new(line: OrderLine) -> Self {
        Self { line }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineStatusChangedEvent {
    pub line: OrderLine,
    pub old_status: OrderLineStatus,
}

impl OrderLineStatusChangedEvent {
    pub fn new(line: OrderLine, old_status: OrderLineStatus) -> Self {
        Self { line, old_status }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderCreated(OrderCreatedEvent),
    OrderLineAdded(OrderLineAddedEvent),
    OrderLineStatusChanged(OrderLineStatusChangedEvent),
}
