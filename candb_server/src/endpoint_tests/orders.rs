use actix_web::{http::StatusCode, web, web::ServiceConfig};
use candb_engine::{
    db_types::{OrderLineStatus, Role},
    events::EventProducers,
    traits::OrderFlowError,
    OrderFlowApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{get_request, issue_token, line_for, mug, order_for, patch_request, post_request, test_engine},
    mocks::MockOrderStore,
};
use crate::routes::{AddOrderLineRoute, CreateOrderRoute, OrderByIdRoute, OrdersRoute, UpdateLineStatusRoute};

fn configure(store: MockOrderStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OrderFlowApi::new(store, EventProducers::default(), test_engine());
        cfg.service(CreateOrderRoute::<MockOrderStore>::new())
            .service(OrdersRoute::<MockOrderStore>::new())
            .service(OrderByIdRoute::<MockOrderStore>::new())
            .service(AddOrderLineRoute::<MockOrderStore>::new())
            .service(UpdateLineStatusRoute::<MockOrderStore>::new())
            .app_data(web::Data::new(api));
    }
}

#[actix_web::test]
async fn create_order_for_self() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_insert_order().withf(|order| order.profile_id == 7).returning(|order| Ok(order_for(order.profile_id)));
    let token = issue_token(7, &[Role::User]);
    let (status, body) = post_request(&token, "/orders", json!({}), configure(store)).await;
    assert_eq!(status, StatusCode::CREATED);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["profile_id"], 7);
}

#[actix_web::test]
async fn customers_cannot_order_for_others() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(7, &[Role::User]);
    let (status, _) = post_request(&token, "/orders", json!({"profile_id": 8}), configure(MockOrderStore::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn my_orders_are_limited_to_my_profile() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_search_orders().withf(|q| q.profile_id == Some(7)).returning(|_| Ok(vec![order_for(7)]));
    let token = issue_token(7, &[Role::User]);
    let (status, body) = get_request(&token, "/orders?profile_id=8", configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.len(), 1);
}

#[actix_web::test]
async fn other_profiles_orders_are_hidden() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(order_for(8))));
    store.expect_fetch_order_lines().returning(|_| Ok(vec![]));
    let token = issue_token(7, &[Role::User]);
    let (status, _) = get_request(&token, "/orders/ORDER-1", configure(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn staff_can_read_any_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(order_for(8))));
    store.expect_fetch_order_lines().returning(|_| Ok(vec![line_for(&mug(), 2, OrderLineStatus::Pending)]));
    let token = issue_token(1, &[Role::User, Role::ReadAll]);
    let (status, body) = get_request(&token, "/orders/ORDER-1", configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["order"]["profile_id"], 8);
    assert_eq!(order["lines"][0]["quantity"], 2);
}

#[actix_web::test]
async fn add_line_within_stock() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(order_for(7))));
    store.expect_fetch_order_lines().returning(|_| Ok(vec![]));
    store.expect_fetch_product().returning(|_| Ok(Some(mug())));
    store
        .expect_place_order_line()
        .withf(|_, line| line.quantity == 3 && line.quantity_reserved == 3 && line.availability_id.is_none())
        .returning(|product, line| Ok(line_for(product, line.quantity, OrderLineStatus::Pending)));
    let token = issue_token(7, &[Role::User]);
    let (status, body) = post_request(
        &token,
        "/orders/ORDER-1/lines",
        json!({"product_id": "PRODUCT-mug", "quantity": 3}),
        configure(store),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let line: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(line["quantity"], 3);
    assert_eq!(line["persistent_cost"], 1250);
}

#[actix_web::test]
async fn add_line_beyond_stock_is_refused() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(order_for(7))));
    store.expect_fetch_order_lines().returning(|_| Ok(vec![]));
    store.expect_fetch_product().returning(|_| Ok(Some(mug())));
    store.expect_place_order_line().never();
    let token = issue_token(7, &[Role::User]);
    let (status, body) = post_request(
        &token,
        "/orders/ORDER-1/lines",
        json!({"product_id": "PRODUCT-mug", "quantity": 9}),
        configure(store),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("cannot supply 9 units"), "was: {body}");
}

#[actix_web::test]
async fn status_changes_need_write_role() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(7, &[Role::User]);
    let (status, _) = patch_request(
        &token,
        "/order_lines/ORDERLINE-1/status",
        json!({"status": "Cancelled"}),
        configure(MockOrderStore::new()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn invalid_status_change_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_line().returning(|_| Ok(Some(line_for(&mug(), 2, OrderLineStatus::Cancelled))));
    store.expect_update_line_status().returning(|id, to| {
        Err(OrderFlowError::InvalidStatusChange { id: id.clone(), from: OrderLineStatus::Cancelled, to })
    });
    let token = issue_token(1, &[Role::User, Role::Write]);
    let (status, _) = patch_request(
        &token,
        "/order_lines/ORDERLINE-1/status",
        json!({"status": "Open"}),
        configure(store),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
