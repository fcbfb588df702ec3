use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
    ResponseError,
};
use candb_common::{Money, Secret};
use candb_engine::{
    availability::AvailabilityEngine,
    db_types::{Order, OrderId, OrderLine, OrderLineId, OrderLineStatus, Product, ProductId, Role},
};
use chrono::{FixedOffset, TimeZone, Utc};
use log::debug;
use serde_json::Value;

use crate::{
    auth::{TokenIssuer, TokenValidator, ACCESS_TOKEN_HEADER},
    config::AuthConfig,
    middleware::AuthenticationMiddlewareFactory,
};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Secret::new("endpoint-tests-only-secret-0123456789abcdef".to_string()),
        token_expiry_secs: 3600,
    }
}

pub fn issue_token(profile_id: i64, roles: &[Role]) -> String {
    TokenIssuer::new(&get_auth_config())
        .issue_token(profile_id, "alice", roles.to_vec())
        .expect("Failed to sign token")
}

/// Stock checks in tests are made in a fixed zone, so that results do not depend on where the tests run.
pub fn test_engine() -> AvailabilityEngine {
    AvailabilityEngine::new(FixedOffset::east_opt(2 * 3600).expect("valid offset"))
}

pub async fn get_request(token: &str, path: &str, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, String) {
    send(with_token(TestRequest::get(), token).uri(path), configure).await
}

pub async fn post_request(
    token: &str,
    path: &str,
    body: Value,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    send(with_token(TestRequest::post(), token).uri(path).set_json(body), configure).await
}

pub async fn put_request(
    token: &str,
    path: &str,
    body: Value,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    send(with_token(TestRequest::put(), token).uri(path).set_json(body), configure).await
}

pub async fn patch_request(
    token: &str,
    path: &str,
    body: Value,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    send(with_token(TestRequest::patch(), token).uri(path).set_json(body), configure).await
}

pub async fn delete_request(
    token: &str,
    path: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    send(with_token(TestRequest::delete(), token).uri(path), configure).await
}

fn with_token(req: TestRequest, token: &str) -> TestRequest {
    if token.is_empty() {
        req
    } else {
        req.insert_header((ACCESS_TOKEN_HEADER, token))
    }
}

/// Runs the request through an app wrapped in the authentication middleware. Middleware rejections are turned into
/// the response the client would have seen.
async fn send(req: TestRequest, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, String) {
    let validator = TokenValidator::new(&get_auth_config());
    let app = App::new().wrap(AuthenticationMiddlewareFactory::new(validator)).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = res.into_body().try_into_bytes().expect("Body should be readable");
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.as_response_error().error_response();
            let status = res.status();
            let body = res.into_body().try_into_bytes().expect("Body should be readable");
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

pub fn timestamp() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
}

pub fn mug() -> Product {
    Product {
        id: ProductId::from("PRODUCT-mug"),
        name: "Mug".to_string(),
        price: Money::from(1250),
        description: None,
        physical_stock: Some(10),
        reserved_stock: Some(2),
        availability: None,
        notes: None,
        tags: vec![],
        version: 3,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

pub fn order_for(profile_id: i64) -> Order {
    Order {
        id: OrderId::from("ORDER-1"),
        profile_id,
        order_time: timestamp(),
        override_cost: None,
        total_cost: None,
        notes: None,
        version: 1,
        updated_at: timestamp(),
    }
}

pub fn line_for(product: &Product, quantity: i64, status: OrderLineStatus) -> OrderLine {
    OrderLine {
        id: OrderLineId::from("ORDERLINE-1"),
        order_id: OrderId::from("ORDER-1"),
        product_id: product.id.clone(),
        quantity,
        quantity_reserved: quantity,
        persistent_cost: Some(product.price),
        item_cost: product.price.checked_mul(quantity),
        force_price: None,
        status,
        notes: None,
        availability_id: None,
        version: 1,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}
