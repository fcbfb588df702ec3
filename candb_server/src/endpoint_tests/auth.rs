use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use candb_common::Money;
use candb_engine::{
    auth_api::hash_password,
    db_types::{AuditEvent, AuditLogType, Profile, Role},
    AccountApi,
    AuditApi,
    AuthApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{get_auth_config, get_request, issue_token, post_request, timestamp},
    mocks::{MockAuditStore, MockProfileStore},
};
use crate::{
    auth::{TokenIssuer, TokenValidator, ACCESS_TOKEN_HEADER},
    config::ServerOptions,
    data_objects::LoginResponse,
    middleware::AuthenticationMiddlewareFactory,
    routes::{AuthRoute, CheckTokenRoute, CreateProfileRoute, MyProfileRoute, UpdateRolesRoute},
};

fn configure_login(store: MockProfileStore, audit: MockAuditStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(AuthRoute::<MockProfileStore, MockAuditStore>::new())
            .app_data(web::Data::new(AuthApi::new(store)))
            .app_data(web::Data::new(AuditApi::new(audit, 5)))
            .app_data(web::Data::new(TokenIssuer::new(&get_auth_config())))
            .app_data(web::Data::new(ServerOptions::default()));
    }
}

async fn login(body: Value, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, Option<String>, String) {
    let app = test::init_service(App::new().configure(configure)).await;
    let req = TestRequest::post().uri("/auth").set_json(body).to_request();
    let res = test::call_service(&app, req).await;
    let status = res.status();
    let header = res.headers().get(ACCESS_TOKEN_HEADER).and_then(|v| v.to_str().ok()).map(String::from);
    let body = res.into_body().try_into_bytes().unwrap();
    (status, header, String::from_utf8_lossy(&body).into_owned())
}

#[actix_web::test]
async fn login_with_valid_credentials() {
    let _ = env_logger::try_init().ok();
    let hash = hash_password("correct horse battery staple").unwrap();
    let mut store = MockProfileStore::new();
    store
        .expect_fetch_credentials()
        .withf(|u| u.to_string() == "alice")
        .returning(move |_| Ok(Some((7, hash.clone()))));
    store.expect_fetch_roles_for_profile().returning(|_| Ok(vec![Role::User, Role::Write]));
    let mut audit = MockAuditStore::new();
    audit
        .expect_insert_audit_entry()
        .withf(|e| e.event == AuditEvent::Login && e.log_type == AuditLogType::Info && e.profile_id == Some(7))
        .times(1)
        .returning(|_| Ok(1));
    let body = json!({"username": "alice", "password": "correct horse battery staple"});
    let (status, header, body) = login(body, configure_login(store, audit)).await;
    assert_eq!(status, StatusCode::OK);
    let response: LoginResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.profile_id, 7);
    assert_eq!(header.as_deref(), Some(response.access_token.as_str()));
    let claims = TokenValidator::new(&get_auth_config()).validate(&response.access_token).unwrap();
    assert_eq!(claims.sub, 7);
    assert_eq!(claims.username, "alice");
    assert_eq!(claims.roles, vec![Role::User, Role::Write]);
}

#[actix_web::test]
async fn login_with_wrong_password_is_audited() {
    let _ = env_logger::try_init().ok();
    let hash = hash_password("correct horse battery staple").unwrap();
    let mut store = MockProfileStore::new();
    store.expect_fetch_credentials().returning(move |_| Ok(Some((7, hash.clone()))));
    store.expect_fetch_roles_for_profile().never();
    let mut audit = MockAuditStore::new();
    audit
        .expect_insert_audit_entry()
        .withf(|e| e.event == AuditEvent::Login && e.log_type == AuditLogType::Warning)
        .times(1)
        .returning(|_| Ok(1));
    let body = json!({"username": "alice", "password": "Tr0ub4dor&3"});
    let (status, header, body) = login(body, configure_login(store, audit)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(header.is_none());
    assert!(body.contains("error"), "was: {body}");
}

#[actix_web::test]
async fn unknown_users_fail_like_wrong_passwords() {
    let _ = env_logger::try_init().ok();
    let mut store = MockProfileStore::new();
    store.expect_fetch_credentials().returning(|_| Ok(None));
    let mut audit = MockAuditStore::new();
    audit.expect_insert_audit_entry().returning(|_| Ok(1));
    let body = json!({"username": "mallory", "password": "whatever"});
    let (status, _, _) = login(body, configure_login(store, audit)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn check_token() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(7, &[Role::User]);
    let (status, body) = get_request(&token, "/check_token", |cfg| {
        cfg.service(CheckTokenRoute::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let claims: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(claims["sub"], 7);
}

#[actix_web::test]
async fn login_token_opens_the_api() {
    let _ = env_logger::try_init().ok();
    let hash = hash_password("correct horse battery staple").unwrap();
    let mut credentials = MockProfileStore::new();
    credentials.expect_fetch_credentials().returning(move |_| Ok(Some((7, hash.clone()))));
    credentials.expect_fetch_roles_for_profile().returning(|_| Ok(vec![Role::User]));
    let mut accounts = MockProfileStore::new();
    accounts.expect_fetch_profile().withf(|id| *id == 7).times(1).returning(|id| {
        Ok(Some(Profile {
            id,
            username: "alice".to_string(),
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
            balance: Money::from_dollars(5),
            admin_notes: None,
            version: 1,
            created_at: timestamp(),
            updated_at: timestamp(),
        }))
    });
    let mut audit = MockAuditStore::new();
    audit.expect_insert_audit_entry().returning(|_| Ok(1));
    let api_scope = web::scope("/api")
        .wrap(AuthenticationMiddlewareFactory::new(TokenValidator::new(&get_auth_config())))
        .service(MyProfileRoute::<MockProfileStore>::new());
    let app = App::new()
        .service(AuthRoute::<MockProfileStore, MockAuditStore>::new())
        .service(api_scope)
        .app_data(web::Data::new(AuthApi::new(credentials)))
        .app_data(web::Data::new(AccountApi::new(accounts)))
        .app_data(web::Data::new(AuditApi::new(audit, 5)))
        .app_data(web::Data::new(TokenIssuer::new(&get_auth_config())))
        .app_data(web::Data::new(ServerOptions::default()));
    let app = test::init_service(app).await;

    let body = json!({"username": "alice", "password": "correct horse battery staple"});
    let req = TestRequest::post().uri("/auth").set_json(body).to_request();
    let login: LoginResponse = test::call_and_read_body_json(&app, req).await;

    let req =
        TestRequest::get().uri("/api/profile").insert_header((ACCESS_TOKEN_HEADER, login.access_token)).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let profile: Value = test::read_body_json(res).await;
    assert_eq!(profile["id"], 7);
    assert_eq!(profile["username"], "alice");
}

fn configure_profiles(accounts: MockProfileStore, auth: MockProfileStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(CreateProfileRoute::<MockProfileStore>::new())
            .service(UpdateRolesRoute::<MockProfileStore>::new())
            .app_data(web::Data::new(AccountApi::new(accounts)))
            .app_data(web::Data::new(AuthApi::new(auth)));
    }
}

#[actix_web::test]
async fn granting_roles_needs_super_admin() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, &[Role::User, Role::Write]);
    let body = json!({"username": "bob", "password": "a much longer Passw0rd!", "roles": ["User", "Write"]});
    let configure = configure_profiles(MockProfileStore::new(), MockProfileStore::new());
    let (status, _) = post_request(&token, "/profiles", body, configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn update_roles() {
    let _ = env_logger::try_init().ok();
    let mut store = MockProfileStore::new();
    store
        .expect_assign_roles()
        .withf(|id, roles| *id == 9 && roles.to_vec() == vec![Role::ReadAll])
        .times(1)
        .returning(|_, _| Ok(()));
    store.expect_remove_roles().never();
    store.expect_fetch_roles_for_profile().returning(|_| Ok(vec![Role::User, Role::ReadAll]));
    let token = issue_token(1, &[Role::User, Role::SuperAdmin]);
    let body = json!({"profile_id": 9, "apply": ["ReadAll"]});
    let (status, body) = post_request(&token, "/roles", body, configure_profiles(MockProfileStore::new(), store)).await;
    assert_eq!(status, StatusCode::OK);
    let roles: Vec<Role> = serde_json::from_str(&body).unwrap();
    assert_eq!(roles, vec![Role::User, Role::ReadAll]);
}
