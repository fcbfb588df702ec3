//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two should delegate to the engine
//! APIs, which own the business rules. Keep this module neat and tidy 🙏
//!
//! Every handler is async, and every engine call is awaited, so a slow database query never blocks a worker thread.
//!
//! Routes under `/api` sit behind the authentication middleware. Routes declared with `requires [...]` are also wrapped
//! in the ACL middleware, which checks the roles in the caller's access token.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use candb_engine::{
    audit_objects::AuditQueryFilter,
    auth_api::validate_password,
    availability::StockQuery,
    db_types::{
        AuditEvent,
        AuditLogType,
        NewAuditEntry,
        NewOrder,
        NewProduct,
        NewProfile,
        OrderId,
        OrderLineId,
        ProductId,
        ProductUpdate,
        Role,
    },
    order_objects::{NewLineRequest, OrderQueryFilter},
    product_objects::ProductQueryFilter,
    traits::{AccountManagement, AuditLog, AuthManagement, OrderManagement, ProductManagement},
    AccountApi,
    AuditApi,
    AuthApi,
    OrderFlowApi,
    ProductApi,
};
use log::*;
use serde_json::json;

use crate::{
    auth::{JwtClaims, TokenIssuer, ACCESS_TOKEN_HEADER},
    config::ServerOptions,
    data_objects::{
        AmountRequest,
        AvailabilityRequest,
        ForcePriceRequest,
        JsonResponse,
        LoginRequest,
        LoginResponse,
        NewOrderRequest,
        NewProfileRequest,
        RoleUpdateRequest,
        StatusUpdateRequest,
        StockCheckParams,
        StockRequest,
        Versioned,
    },
    errors::ServerError,
    helpers::get_remote_ip,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(auth => Post "/auth" impl AuthManagement, AuditLog);
/// Route handler for the auth endpoint
///
/// Exchanges a username and password for an access token. The token is returned in the `candb_access_token` header
/// and in the JSON body, and must be supplied in the `candb_access_token` header on every `/api` request.
///
/// Successful and failed logins are both written to the audit log.
pub async fn auth<A, L>(
    req: HttpRequest,
    body: web::Json<LoginRequest>,
    api: web::Data<AuthApi<A>>,
    audit: web::Data<AuditApi<L>>,
    signer: web::Data<TokenIssuer>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    A: AuthManagement,
    L: AuditLog,
{
    let LoginRequest { username, password } = body.into_inner();
    trace!("💻️ Received auth request for {username}");
    let origin = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".into());
    let (profile_id, roles) = match api.authenticate(&username, &password).await {
        Ok(v) => v,
        Err(e) => {
            let message = format!("Failed login for {username}");
            let entry = NewAuditEntry::new(AuditLogType::Warning, AuditEvent::Login, message)
                .with_origin(origin)
                .with_severity(1);
            audit.record_quietly(entry).await;
            return Err(e.into());
        },
    };
    let access_token = signer.issue_token(profile_id, &username, roles.clone())?;
    let entry = NewAuditEntry::new(AuditLogType::Info, AuditEvent::Login, format!("{username} logged in"))
        .with_profile(profile_id)
        .with_origin(origin)
        .with_severity(2);
    audit.record_quietly(entry).await;
    trace!("💻️ Issued access token");
    Ok(HttpResponse::Ok()
        .insert_header((ACCESS_TOKEN_HEADER, access_token.as_str()))
        .json(LoginResponse { profile_id, roles, access_token }))
}

route!(check_token => Get "/check_token" requires [Role::User]);
pub async fn check_token(claims: JwtClaims) -> Result<HttpResponse, ServerError> {
    debug!("💻️ Token is valid for {}", claims.username);
    Ok(HttpResponse::Ok().json(claims))
}

//----------------------------------------------   Profiles  ----------------------------------------------------
route!(my_profile => Get "/profile" impl AccountManagement where requires [Role::User]);
pub async fn my_profile<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_profile for {}", claims.username);
    get_profile(claims.sub, api.as_ref()).await
}

route!(profile_by_id => Get "/profiles/{id}" impl AccountManagement where requires [Role::User]);
/// Profiles can read their own record. Reading anyone else's needs `ReadAll`.
pub async fn profile_by_id<B: AccountManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET profile #{id}");
    if !claims.is_owner_or(id, Role::ReadAll) {
        return Err(ServerError::InsufficientPermissions(format!("Cannot read profile #{id}")));
    }
    get_profile(id, api.as_ref()).await
}

async fn get_profile<B: AccountManagement>(id: i64, api: &AccountApi<B>) -> Result<HttpResponse, ServerError> {
    let profile = api.profile_by_id(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Profile #{id}")))?;
    Ok(HttpResponse::Ok().json(profile))
}

route!(profiles => Get "/profiles" impl AccountManagement where requires [Role::ReadAll]);
pub async fn profiles<B: AccountManagement>(api: web::Data<AccountApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET profiles");
    let profiles = api.profiles().await?;
    Ok(HttpResponse::Ok().json(profiles))
}

route!(create_profile => Post "/profiles" impl AccountManagement, AuthManagement where requires [Role::Write]);
/// Creates a profile. Granting anything beyond `User` needs `SuperAdmin`, and staff profiles need strong passwords.
pub async fn create_profile<B>(
    claims: JwtClaims,
    body: web::Json<NewProfileRequest>,
    accounts: web::Data<AccountApi<B>>,
    auth: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: AccountManagement + AuthManagement,
{
    let request = body.into_inner();
    debug!("💻️ POST create_profile for {} by {}", request.username, claims.username);
    let elevated = request.roles.iter().any(|r| *r != Role::User);
    if elevated && !claims.has_role(Role::SuperAdmin) {
        return Err(ServerError::InsufficientPermissions("Only super admins can grant roles".into()));
    }
    validate_password(&request.password, &request.roles)?;
    let password = request.password;
    let hash = tokio::task::spawn_blocking(move || candb_engine::auth_api::hash_password(&password))
        .await
        .map_err(|e| ServerError::BackendError(format!("Password hashing task failed. {e}")))??;
    let mut profile = NewProfile::new(request.username, hash);
    profile.first_name = request.first_name;
    profile.last_name = request.last_name;
    profile.email = request.email;
    profile.phone = request.phone;
    let profile = accounts.create_profile(profile).await?;
    if elevated {
        auth.assign_roles(profile.id, &request.roles).await?;
    }
    Ok(HttpResponse::Created().json(profile))
}

route!(credit_profile => Post "/profiles/{id}/credit" impl AccountManagement where requires [Role::SuperAdmin]);
pub async fn credit_profile<B: AccountManagement>(
    path: web::Path<i64>,
    body: web::Json<AmountRequest>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST credit {} to profile #{id}", body.amount);
    let profile = api.credit_balance(id, body.amount).await?;
    Ok(HttpResponse::Ok().json(profile))
}

route!(debit_profile => Post "/profiles/{id}/debit" impl AccountManagement where requires [Role::SuperAdmin]);
pub async fn debit_profile<B: AccountManagement>(
    path: web::Path<i64>,
    body: web::Json<AmountRequest>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST debit {} from profile #{id}", body.amount);
    let profile = api.debit_balance(id, body.amount).await?;
    Ok(HttpResponse::Ok().json(profile))
}

route!(update_roles => Post "/roles" impl AuthManagement where requires [Role::SuperAdmin]);
pub async fn update_roles<B: AuthManagement>(
    body: web::Json<RoleUpdateRequest>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let RoleUpdateRequest { profile_id, apply, revoke } = body.into_inner();
    debug!("💻️ POST update roles for #{profile_id}. Apply {apply:?}, revoke {revoke:?}");
    if !apply.is_empty() {
        api.assign_roles(profile_id, &apply).await?;
    }
    if !revoke.is_empty() {
        let _ = api.remove_roles(profile_id, &revoke).await?;
    }
    let roles = api.roles_for_profile(profile_id).await?;
    Ok(HttpResponse::Ok().json(roles))
}

//----------------------------------------------   Products  ----------------------------------------------------
route!(products => Get "/products" impl ProductManagement where requires [Role::User]);
pub async fn products<B: ProductManagement>(
    query: web::Query<ProductQueryFilter>,
    api: web::Data<ProductApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET products [{query}]");
    let products = api.search_products(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(product_by_id => Get "/products/{id}" impl ProductManagement where requires [Role::User]);
pub async fn product_by_id<B: ProductManagement>(
    path: web::Path<ProductId>,
    api: web::Data<ProductApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET product {id}");
    let product = api.product(&id).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(create_product => Post "/products" impl ProductManagement where requires [Role::Write]);
pub async fn create_product<B: ProductManagement>(
    body: web::Json<NewProduct>,
    api: web::Data<ProductApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST create_product {}", body.name);
    let product = api.create_product(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(product))
}

route!(update_product => Patch "/products/{id}" impl ProductManagement where requires [Role::Write]);
pub async fn update_product<B: ProductManagement>(
    path: web::Path<ProductId>,
    body: web::Json<Versioned<ProductUpdate>>,
    api: web::Data<ProductApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let Versioned { version, data } = body.into_inner();
    debug!("💻️ PATCH product {id} (version {version:?})");
    if data.is_empty() {
        return Err(ServerError::InvalidRequestBody("Nothing to update".into()));
    }
    let product = api.update_product(&id, version, data).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(set_availability => Put "/products/{id}/availability" impl ProductManagement where requires [Role::Write]);
/// Replaces the availability map. The body is checked by decoding it, so a malformed map is rejected with 400 before
/// anything is stored.
pub async fn set_availability<B: ProductManagement>(
    path: web::Path<ProductId>,
    body: web::Json<Versioned<AvailabilityRequest>>,
    api: web::Data<ProductApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let Versioned { version, data } = body.into_inner();
    debug!("💻️ PUT availability for {id} (version {version:?})");
    let product = api.set_availability(&id, version, data.availability).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(set_stock => Put "/products/{id}/stock" impl ProductManagement where requires [Role::Write]);
pub async fn set_stock<B: ProductManagement>(
    path: web::Path<ProductId>,
    body: web::Json<Versioned<StockRequest>>,
    api: web::Data<ProductApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let Versioned { version, data } = body.into_inner();
    debug!("💻️ PUT stock for {id} (version {version:?}): {data:?}");
    let product = api.set_stock_levels(&id, version, data).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(delete_product => Delete "/products/{id}" impl ProductManagement where requires [Role::Write]);
pub async fn delete_product<B: ProductManagement>(
    path: web::Path<ProductId>,
    api: web::Data<ProductApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ DELETE product {id}");
    api.delete_product(&id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Product {id} deleted"))))
}

route!(check_stock => Get "/products/{id}/check_stock" impl ProductManagement where requires [Role::User]);
/// Asks whether the product can supply `quantity` units. Nothing is reserved.
pub async fn check_stock<B: ProductManagement>(
    path: web::Path<ProductId>,
    params: web::Query<StockCheckParams>,
    api: web::Data<ProductApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let StockCheckParams { quantity, at, search_until_found } = params.into_inner();
    debug!("💻️ GET check_stock for {quantity} of {id} at {at:?}");
    let mut query = StockQuery::new(quantity);
    if let Some(at) = at {
        query = query.at(at);
    }
    if search_until_found {
        query = query.search_until_found();
    }
    let result = api.check_stock(&id, &query).await?;
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl OrderManagement, ProductManagement where requires [Role::User]);
pub async fn create_order<B>(
    claims: JwtClaims,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + ProductManagement,
{
    let NewOrderRequest { profile_id, notes } = body.into_inner();
    let profile_id = profile_id.unwrap_or(claims.sub);
    debug!("💻️ POST create_order for #{profile_id} by {}", claims.username);
    if !claims.is_owner_or(profile_id, Role::Write) {
        return Err(ServerError::InsufficientPermissions(format!("Cannot place orders for profile #{profile_id}")));
    }
    let mut order = NewOrder::new(profile_id);
    order.notes = notes;
    let order = api.create_order(order).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(orders => Get "/orders" impl OrderManagement, ProductManagement where requires [Role::User]);
/// Searches orders. Without `ReadAll`, the search is limited to the caller's own orders.
pub async fn orders<B>(
    claims: JwtClaims,
    query: web::Query<OrderQueryFilter>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + ProductManagement,
{
    let mut query = query.into_inner();
    if !claims.has_role(Role::ReadAll) {
        query = query.with_profile_id(claims.sub);
    }
    debug!("💻️ GET orders [{query}]");
    let orders = api.search_orders(query).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl OrderManagement, ProductManagement where requires [Role::User]);
pub async fn order_by_id<B>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + ProductManagement,
{
    let id = path.into_inner();
    debug!("💻️ GET order {id}");
    let order = api.fetch_order(&id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Order {id}")))?;
    // Hide the order's existence from other profiles
    if !claims.is_owner_or(order.order.profile_id, Role::ReadAll) {
        return Err(ServerError::NoRecordFound(format!("Order {id}")));
    }
    Ok(HttpResponse::Ok().json(order))
}

route!(add_order_line => Post "/orders/{id}/lines" impl OrderManagement, ProductManagement where requires [Role::User]);
/// Adds a line to an order, if the product can supply the quantity. Refusals return 409.
pub async fn add_order_line<B>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    body: web::Json<NewLineRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + ProductManagement,
{
    let id = path.into_inner();
    let request = body.into_inner();
    debug!("💻️ POST {} of {} to order {id}", request.quantity, request.product_id);
    let order = api.fetch_order(&id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Order {id}")))?;
    if !claims.is_owner_or(order.order.profile_id, Role::Write) {
        return Err(ServerError::NoRecordFound(format!("Order {id}")));
    }
    let line = api.add_order_line(&id, request).await?;
    Ok(HttpResponse::Created().json(line))
}

route!(update_line_status => Patch "/order_lines/{id}/status" impl OrderManagement, ProductManagement where requires [Role::Write]);
pub async fn update_line_status<B>(
    path: web::Path<OrderLineId>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + ProductManagement,
{
    let id = path.into_inner();
    debug!("💻️ PATCH status of line {id} to {}", body.status);
    let line = api.update_line_status(&id, body.status).await?;
    Ok(HttpResponse::Ok().json(line))
}

route!(force_line_price => Patch "/order_lines/{id}/force_price" impl OrderManagement, ProductManagement where requires [Role::Write]);
pub async fn force_line_price<B>(
    path: web::Path<OrderLineId>,
    body: web::Json<ForcePriceRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + ProductManagement,
{
    let id = path.into_inner();
    debug!("💻️ PATCH forced price of line {id} to {:?}", body.price);
    let line = api.force_line_price(&id, body.price).await?;
    Ok(HttpResponse::Ok().json(line))
}

//----------------------------------------------   Audit  ----------------------------------------------------
route!(audit_log => Get "/audit" impl AuditLog where requires [Role::ReadAll]);
pub async fn audit_log<B: AuditLog>(
    query: web::Query<AuditQueryFilter>,
    api: web::Data<AuditApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let query = query.into_inner();
    debug!("💻️ GET audit log (limit {})", query.limit());
    let entries = api.entries(query).await?;
    Ok(HttpResponse::Ok().json(json!({ "max_severity": api.max_severity(), "entries": entries })))
}
