use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use candb_engine::{
    availability::AvailabilityEngine,
    events::EventProducers,
    AccountApi,
    AuditApi,
    AuthApi,
    OrderFlowApi,
    ProductApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    auth::{TokenIssuer, TokenValidator},
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    middleware::AuthenticationMiddlewareFactory,
    routes::{
        health,
        AddOrderLineRoute,
        AuditLogRoute,
        AuthRoute,
        CheckStockRoute,
        CheckTokenRoute,
        CreateOrderRoute,
        CreateProductRoute,
        CreateProfileRoute,
        CreditProfileRoute,
        DebitProfileRoute,
        DeleteProductRoute,
        ForceLinePriceRoute,
        MyProfileRoute,
        OrderByIdRoute,
        OrdersRoute,
        ProductByIdRoute,
        ProductsRoute,
        ProfileByIdRoute,
        ProfilesRoute,
        SetAvailabilityRoute,
        SetStockRoute,
        UpdateLineStatusRoute,
        UpdateProductRoute,
        UpdateRolesRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let engine = AvailabilityEngine::new(config.timezone);
    info!("📦️ Stock checks default to UTC{}", config.timezone);
    let options = ServerOptions::from_config(&config);
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let products_api = ProductApi::new(db.clone(), engine);
        let orders_api = OrderFlowApi::new(db.clone(), EventProducers::default(), engine);
        let accounts_api = AccountApi::new(db.clone());
        let auth_api = AuthApi::new(db.clone());
        let audit_api = AuditApi::new(db.clone(), config.audit_max_severity);
        let jwt_signer = TokenIssuer::new(&config.auth);
        let validator = TokenValidator::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("candb::access_log"))
            .app_data(web::Data::new(products_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(audit_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(options));
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .wrap(AuthenticationMiddlewareFactory::new(validator))
            .service(CheckTokenRoute::new())
            .service(MyProfileRoute::<SqliteDatabase>::new())
            .service(ProfilesRoute::<SqliteDatabase>::new())
            .service(CreateProfileRoute::<SqliteDatabase>::new())
            .service(ProfileByIdRoute::<SqliteDatabase>::new())
            .service(CreditProfileRoute::<SqliteDatabase>::new())
            .service(DebitProfileRoute::<SqliteDatabase>::new())
            .service(UpdateRolesRoute::<SqliteDatabase>::new())
            .service(ProductsRoute::<SqliteDatabase>::new())
            .service(CreateProductRoute::<SqliteDatabase>::new())
            .service(CheckStockRoute::<SqliteDatabase>::new())
            .service(SetAvailabilityRoute::<SqliteDatabase>::new())
            .service(SetStockRoute::<SqliteDatabase>::new())
            .service(ProductByIdRoute::<SqliteDatabase>::new())
            .service(UpdateProductRoute::<SqliteDatabase>::new())
            .service(DeleteProductRoute::<SqliteDatabase>::new())
            .service(OrdersRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(AddOrderLineRoute::<SqliteDatabase>::new())
            .service(UpdateLineStatusRoute::<SqliteDatabase>::new())
            .service(ForceLinePriceRoute::<SqliteDatabase>::new())
            .service(AuditLogRoute::<SqliteDatabase>::new());
        app.service(health).service(AuthRoute::<SqliteDatabase, SqliteDatabase>::new()).service(auth_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
