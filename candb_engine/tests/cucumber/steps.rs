use candb_common::Money;
use candb_engine::{
    availability::{AvailabilityEntry, AvailabilityMap, StockConfig, StockSource, TimeSelector},
    db_types::{NewOrder, OrderLineStatus},
    order_objects::NewLineRequest,
    OrderFlowError,
};
use cucumber::{given, then, when};

use crate::cucumber::CanDbWorld;

async fn add_availability_entry(world: &mut CanDbWorld, name: &str, entry: AvailabilityEntry) {
    let sys = world.system();
    let id = sys.product_id(name);
    let product = sys.products.product(&id).await.expect("Error fetching product");
    let mut entries = product.availability.map(|m| m.entries().to_vec()).unwrap_or_default();
    entries.push(entry);
    let map = AvailabilityMap::new(entries).expect("Invalid availability map");
    sys.products.set_availability(&id, Some(product.version), Some(map)).await.expect("Error setting availability");
}

#[given(expr = "'{word}' has an everyday entry #{int} that is unavailable")]
async fn everyday_unavailable(world: &mut CanDbWorld, name: String, entry_id: i64) {
    let entry = AvailabilityEntry::new(entry_id, TimeSelector::WeekdayRange(0, 6), StockConfig::unavailable());
    add_availability_entry(world, &name, entry).await;
}

#[given(expr = "'{word}' has a default entry #{int} with {int} in stock and {int} reserved")]
async fn default_entry(world: &mut CanDbWorld, name: String, entry_id: i64, physical: i64, reserved: i64) {
    let entry = AvailabilityEntry::new(entry_id, TimeSelector::Default, StockConfig::counted(physical, reserved));
    add_availability_entry(world, &name, entry).await;
}

async fn place_line(world: &mut CanDbWorld, username: &str, quantity: i64, name: &str, search: bool) {
    let sys = world.system();
    let order = match &sys.current_order {
        Some(order) => order.clone(),
        None => {
            let profile_id = sys.profile_id(username);
            let order = sys.orders.create_order(NewOrder::new(profile_id)).await.expect("Error creating order");
            sys.current_order = Some(order.clone());
            order
        },
    };
    let mut request = NewLineRequest::new(sys.product_id(name), quantity);
    if search {
        request = request.search_until_found();
    }
    match sys.orders.add_order_line(&order.id, request).await {
        Ok(line) => {
            sys.last_line = Some(line);
            sys.last_error = None;
        },
        Err(e) => sys.last_error = Some(e),
    }
}

#[when(expr = "'{word}' orders {int} of '{word}'")]
async fn order_product(world: &mut CanDbWorld, username: String, quantity: i64, name: String) {
    place_line(world, &username, quantity, &name, false).await;
    let sys = world.system();
    assert!(sys.last_error.is_none(), "Order was refused: {:?}", sys.last_error);
}

#[when(expr = "'{word}' orders {int} of '{word}' searching all entries")]
async fn order_product_searching(world: &mut CanDbWorld, username: String, quantity: i64, name: String) {
    place_line(world, &username, quantity, &name, true).await;
    let sys = world.system();
    assert!(sys.last_error.is_none(), "Order was refused: {:?}", sys.last_error);
}

#[when(expr = "'{word}' tries to order {int} of '{word}'")]
async fn try_order_product(world: &mut CanDbWorld, username: String, quantity: i64, name: String) {
    place_line(world, &username, quantity, &name, false).await;
}

fn last_line_id(world: &mut CanDbWorld) -> candb_engine::db_types::OrderLineId {
    world.system().last_line.as_ref().expect("No order line was placed").id.clone()
}

#[when("the last line is cancelled")]
async fn cancel_last_line(world: &mut CanDbWorld) {
    let id = last_line_id(world);
    let sys = world.system();
    let line = sys.orders.update_line_status(&id, OrderLineStatus::Cancelled).await.expect("Error cancelling line");
    sys.last_line = Some(line);
}

#[when(expr = "the last line is forced to {word}")]
async fn force_last_line(world: &mut CanDbWorld, price: String) {
    let price = price.parse::<Money>().expect("Not a valid price");
    let id = last_line_id(world);
    let sys = world.system();
    let line = sys.orders.force_line_price(&id, Some(price)).await.expect("Error forcing price");
    sys.last_line = Some(line);
}

#[then(expr = "the order has {int} line(s)")]
async fn order_line_count(world: &mut CanDbWorld, count: usize) {
    let sys = world.system();
    let order = sys.current_order.as_ref().expect("No order was created");
    let lines = sys.orders.fetch_order_lines(&order.id).await.expect("Error fetching lines");
    assert_eq!(lines.len(), count);
}

#[then(expr = "the last line costs {word}")]
async fn last_line_cost(world: &mut CanDbWorld, cost: String) {
    let cost = cost.parse::<Money>().expect("Not a valid amount");
    let line = world.system().last_line.clone().expect("No order line was placed");
    assert_eq!(line.item_cost, Some(cost));
    assert_eq!(line.calculate_item_cost(), Ok(Some(cost)));
}

#[then("the last line was approved by model stock")]
async fn approved_by_model_stock(world: &mut CanDbWorld) {
    let line = world.system().last_line.clone().expect("No order line was placed");
    assert_eq!(line.stock_source(), Some(StockSource::ModelStock));
}

#[then(expr = "the last line was approved by availability entry {int}")]
async fn approved_by_entry(world: &mut CanDbWorld, entry_id: i64) {
    let line = world.system().last_line.clone().expect("No order line was placed");
    assert_eq!(line.stock_source(), Some(StockSource::Configuration(entry_id)));
    assert_eq!(line.quantity_reserved, 0);
}

#[then("the order is refused for insufficient stock")]
async fn refused(world: &mut CanDbWorld) {
    let sys = world.system();
    assert!(
        matches!(sys.last_error, Some(OrderFlowError::InsufficientStock { .. })),
        "Expected the order to be refused, got {:?}",
        sys.last_error
    );
}

#[then(expr = "'{word}' has {int} units reserved")]
async fn reserved_units(world: &mut CanDbWorld, name: String, reserved: i64) {
    let sys = world.system();
    let product = sys.products.product(&sys.product_id(&name)).await.expect("Error fetching product");
    assert_eq!(product.reserved_stock, Some(reserved));
}

#[then(expr = "'{word}' has no reserved stock")]
async fn no_reserved_stock(world: &mut CanDbWorld, name: String) {
    let sys = world.system();
    let product = sys.products.product(&sys.product_id(&name)).await.expect("Error fetching product");
    assert_eq!(product.reserved_stock, None);
    assert_eq!(product.physical_stock, None);
}
