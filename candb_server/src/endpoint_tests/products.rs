use actix_web::{http::StatusCode, web, web::ServiceConfig};
use candb_engine::{
    availability::{AvailabilityEntry, AvailabilityMap, StockConfig, TimeSelector},
    db_types::{ProductId, Role},
    traits::ProductApiError,
    ProductApi,
};
use mockall::predicate::eq;
use serde_json::{json, Value};

use super::{
    helpers::{delete_request, get_request, issue_token, mug, patch_request, put_request, test_engine},
    mocks::MockProductStore,
};
use crate::routes::{
    CheckStockRoute,
    DeleteProductRoute,
    ProductByIdRoute,
    SetAvailabilityRoute,
    SetStockRoute,
    UpdateProductRoute,
};

fn configure(store: MockProductStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = ProductApi::new(store, test_engine());
        cfg.service(CheckStockRoute::<MockProductStore>::new())
            .service(SetAvailabilityRoute::<MockProductStore>::new())
            .service(SetStockRoute::<MockProductStore>::new())
            .service(ProductByIdRoute::<MockProductStore>::new())
            .service(UpdateProductRoute::<MockProductStore>::new())
            .service(DeleteProductRoute::<MockProductStore>::new())
            .app_data(web::Data::new(api));
    }
}

#[actix_web::test]
async fn fetch_product_without_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/products/PRODUCT-mug", configure(MockProductStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No access token"), "was: {body}");
}

#[actix_web::test]
async fn fetch_product_with_tampered_token() {
    let _ = env_logger::try_init().ok();
    let mut token = issue_token(1, &[Role::User]);
    token.replace_range(token.len() - 6.., "AAAAAA");
    let (status, _) = get_request(&token, "/products/PRODUCT-mug", configure(MockProductStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn fetch_product() {
    let _ = env_logger::try_init().ok();
    let mut store = MockProductStore::new();
    store.expect_fetch_product().with(eq(ProductId::from("PRODUCT-mug"))).returning(|_| Ok(Some(mug())));
    let token = issue_token(1, &[Role::User]);
    let (status, body) = get_request(&token, "/products/PRODUCT-mug", configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let product: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(product["name"], "Mug");
    assert_eq!(product["physical_stock"], 10);
}

#[actix_web::test]
async fn fetch_missing_product() {
    let _ = env_logger::try_init().ok();
    let mut store = MockProductStore::new();
    store.expect_fetch_product().returning(|_| Ok(None));
    let token = issue_token(1, &[Role::User]);
    let (status, _) = get_request(&token, "/products/PRODUCT-nope", configure(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn check_stock_reports_model_stock() {
    let _ = env_logger::try_init().ok();
    let mut store = MockProductStore::new();
    store.expect_fetch_product().returning(|_| Ok(Some(mug())));
    let token = issue_token(1, &[Role::User]);
    let (status, body) =
        get_request(&token, "/products/PRODUCT-mug/check_stock?quantity=8", configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["available"], true);
    assert_eq!(result["quantity"], 8);

    let mut store = MockProductStore::new();
    store.expect_fetch_product().returning(|_| Ok(Some(mug())));
    let (status, body) =
        get_request(&token, "/products/PRODUCT-mug/check_stock?quantity=9", configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["available"], false);
}

#[actix_web::test]
async fn check_stock_rejects_negative_quantities() {
    let _ = env_logger::try_init().ok();
    let mut store = MockProductStore::new();
    store.expect_fetch_product().returning(|_| Ok(Some(mug())));
    let token = issue_token(1, &[Role::User]);
    let (status, _) = get_request(&token, "/products/PRODUCT-mug/check_stock?quantity=-1", configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn check_stock_with_broken_availability_is_a_server_fault() {
    let _ = env_logger::try_init().ok();
    // Entry 1 points at an entry that does not exist
    let map = AvailabilityMap::new(vec![AvailabilityEntry::new(1, TimeSelector::Default, StockConfig::reference(7))])
        .unwrap();
    let mut store = MockProductStore::new();
    store.expect_fetch_product().returning(move |_| {
        let mut product = mug();
        product.availability = Some(map.clone());
        Ok(Some(product))
    });
    let token = issue_token(1, &[Role::User]);
    let (status, body) =
        get_request(&token, "/products/PRODUCT-mug/check_stock?quantity=1", configure(store)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("misconfigured"), "was: {body}");
}

#[actix_web::test]
async fn updates_need_write_role() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, &[Role::User]);
    let (status, _) =
        patch_request(&token, "/products/PRODUCT-mug", json!({"name": "Big mug"}), configure(MockProductStore::new()))
            .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn update_with_stale_version() {
    let _ = env_logger::try_init().ok();
    let mut store = MockProductStore::new();
    store
        .expect_update_product()
        .withf(|id, version, _| id.as_str() == "PRODUCT-mug" && *version == 2)
        .returning(|id, _, _| Err(ProductApiError::StaleVersion(id.clone())));
    let token = issue_token(1, &[Role::User, Role::Write]);
    let (status, body) = patch_request(
        &token,
        "/products/PRODUCT-mug",
        json!({"version": 2, "name": "Big mug"}),
        configure(store),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("modified by someone else"), "was: {body}");
}

#[actix_web::test]
async fn set_stock_uses_current_version() {
    let _ = env_logger::try_init().ok();
    let mut store = MockProductStore::new();
    store.expect_fetch_product().returning(|_| Ok(Some(mug())));
    store
        .expect_set_stock_levels()
        .withf(|_, version, levels| *version == 3 && levels.physical_stock == Some(20))
        .returning(|_, _, levels| {
            let mut product = mug();
            product.physical_stock = levels.physical_stock;
            product.reserved_stock = levels.reserved_stock;
            product.version = 4;
            Ok(product)
        });
    let token = issue_token(1, &[Role::User, Role::Write]);
    let (status, body) = put_request(
        &token,
        "/products/PRODUCT-mug/stock",
        json!({"physical_stock": 20, "reserved_stock": 2}),
        configure(store),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let product: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(product["version"], 4);
    assert_eq!(product["physical_stock"], 20);
}

#[actix_web::test]
async fn malformed_availability_is_rejected() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, &[Role::User, Role::Write]);
    let body = json!({"version": 3, "availability": {"1": ["sometimes", {"available": true}]}});
    let (status, _) =
        put_request(&token, "/products/PRODUCT-mug/availability", body, configure(MockProductStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn delete_product_in_use() {
    let _ = env_logger::try_init().ok();
    let mut store = MockProductStore::new();
    store.expect_delete_product().returning(|id| Err(ProductApiError::ProductInUse(id.clone())));
    let token = issue_token(1, &[Role::User, Role::Write]);
    let (status, _) = delete_request(&token, "/products/PRODUCT-mug", configure(store)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
