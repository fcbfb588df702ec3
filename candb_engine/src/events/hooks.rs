use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    OrderCreatedEvent,
    OrderLineAddedEvent,
    OrderLineStatusChangedEvent,
};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_created_producer: Vec<EventProducer<OrderCreatedEvent>>,
    pub order_line_added_producer: Vec<EventProducer<OrderLineAddedEvent>>,
    pub line_status_changed_producer: Vec<EventProducer<OrderLineStatusChangedEvent>>,
}

pub struct EventHandlers {
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_order_line_added: Option<EventHandler<OrderLineAddedEvent>>,
    pub on_line_status_changed: Option<EventHandler<OrderLineStatusChangedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_created = hooks.on_order_created.map(|f| EventHandler::new(buffer_size, f));
        let on_order_line_added = hooks.on_order_line_added.map(|f| EventHandler::new(buffer_size, f));
        let on_line_status_changed = hooks.on_line_status_changed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_created, on_order_line_added, on_line_status_changed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_created {
            result.order_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_line_added {
            result.order_line_added_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_line_status_changed {
            result.line_status_changed_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_created {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_order_line_added {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_line_status_changed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_created: Option<Handler<OrderCreatedEvent>>,
    pub on_order_line_added: Option<Handler<OrderLineAddedEvent>>,
    pub on_line_status_changed: Option<Handler<OrderLineStatusChangedEvent>>,
}

impl EventHooks {
    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCreatedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    pub fn on_order_line_added<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderLineAddedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_line_added = Some(Arc::new(f));
        self
    }

    pub fn on_line_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderLineStatusChangedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_line_status_changed = Some(Arc::new(f));
        self
    }
}
