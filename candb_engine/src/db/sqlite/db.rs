use std::fmt::Debug;

use candb_common::Money;
use log::*;
use sqlx::SqlitePool;

use super::{audit, auth, db_url, new_pool, order_lines, orders, products, profiles, SqliteDatabaseError};
use crate::{
    audit_objects::AuditQueryFilter,
    availability::AvailabilityMap,
    db_types::{
        AuditEntry,
        NewAuditEntry,
        NewOrder,
        NewOrderLine,
        NewProduct,
        NewProfile,
        Order,
        OrderId,
        OrderLine,
        OrderLineId,
        OrderLineStatus,
        Product,
        ProductId,
        ProductUpdate,
        Profile,
        Role,
        StockLevels,
    },
    order_objects::OrderQueryFilter,
    product_objects::ProductQueryFilter,
    traits::{
        AccountApiError,
        AccountManagement,
        AuditLog,
        AuditLogError,
        AuthApiError,
        AuthManagement,
        CanDbDatabase,
        OrderFlowError,
        OrderManagement,
        ProductApiError,
        ProductManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `CANDB_DATABASE_URL`
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl CanDbDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }
}

//--------------------------------------   ProductManagement   ---------------------------------------------------------
impl ProductManagement for SqliteDatabase {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, ProductApiError> {
        product.validate()?;
        let mut tx = self.pool.begin().await?;
        let product = products::insert_product(product, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, ProductApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(id, &mut conn).await?;
        Ok(product)
    }

    async fn search_products(&self, query: ProductQueryFilter) -> Result<Vec<Product>, ProductApiError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::search_products(query, &mut conn).await?;
        Ok(products)
    }

    async fn update_product(
        &self,
        id: &ProductId,
        version: i64,
        update: ProductUpdate,
    ) -> Result<Product, ProductApiError> {
        update.validate()?;
        let mut tx = self.pool.begin().await?;
        let product = products::update_product(id, version, update, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn set_availability(
        &self,
        id: &ProductId,
        version: i64,
        availability: Option<AvailabilityMap>,
    ) -> Result<Product, ProductApiError> {
        let mut tx = self.pool.begin().await?;
        let product = products::set_availability(id, version, availability.as_ref(), &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Availability of {id} replaced. {} entries", availability.map(|m| m.len()).unwrap_or(0));
        Ok(product)
    }

    async fn set_stock_levels(
        &self,
        id: &ProductId,
        version: i64,
        levels: StockLevels,
    ) -> Result<Product, ProductApiError> {
        levels.validate()?;
        let mut tx = self.pool.begin().await?;
        let product = products::set_stock_levels(id, version, levels, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn delete_product(&self, id: &ProductId) -> Result<bool, ProductApiError> {
        let mut tx = self.pool.begin().await?;
        if products::product_has_order_lines(id, &mut tx).await? {
            return Err(ProductApiError::ProductInUse(id.clone()));
        }
        let deleted = products::delete_product(id, &mut tx).await?;
        tx.commit().await?;
        Ok(deleted)
    }
}

//--------------------------------------    OrderManagement    ---------------------------------------------------------
impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        order.validate()?;
        let mut tx = self.pool.begin().await?;
        if profiles::fetch_profile(order.profile_id, &mut tx).await?.is_none() {
            return Err(OrderFlowError::ProfileNotFound(order.profile_id));
        }
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(id, &mut conn).await?;
        Ok(order)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_order_lines(&self, order_id: &OrderId) -> Result<Vec<OrderLine>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let lines = order_lines::fetch_lines_for_order(order_id, &mut conn).await?;
        Ok(lines)
    }

    async fn fetch_order_line(&self, id: &OrderLineId) -> Result<Option<OrderLine>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let line = order_lines::fetch_order_line(id, &mut conn).await?;
        Ok(line)
    }

    async fn place_order_line(&self, product: &Product, line: NewOrderLine) -> Result<OrderLine, OrderFlowError> {
        line.validate()?;
        let mut tx = self.pool.begin().await?;
        if orders::fetch_order(&line.order_id, &mut tx).await?.is_none() {
            return Err(OrderFlowError::OrderNotFound(line.order_id));
        }
        if line.quantity_reserved > 0 {
            let updated =
                products::adjust_reserved_stock(&product.id, product.version, line.quantity_reserved, &mut tx).await?;
            trace!(
                "🗃️ {} units of {} reserved. {:?} of {:?} now reserved",
                line.quantity_reserved,
                product.id,
                updated.reserved_stock,
                updated.physical_stock
            );
        }
        let line = order_lines::insert_order_line(line, &mut tx).await?;
        tx.commit().await?;
        Ok(line)
    }

    async fn update_line_status(&self, id: &OrderLineId, status: OrderLineStatus) -> Result<OrderLine, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let line = order_lines::fetch_order_line(id, &mut tx)
            .await?
            .ok_or_else(|| OrderFlowError::OrderLineNotFound(id.clone()))?;
        if line.status.releases_stock() && !status.releases_stock() {
            return Err(OrderFlowError::InvalidStatusChange { id: id.clone(), from: line.status, to: status });
        }
        let reserved = if status.releases_stock() && line.quantity_reserved > 0 {
            products::release_reserved_stock(&line.product_id, line.quantity_reserved, &mut tx).await?;
            0
        } else {
            line.quantity_reserved
        };
        let updated = order_lines::update_status(&line, status, reserved, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order line {id} moved from {} to {}", line.status, updated.status);
        Ok(updated)
    }

    async fn force_line_price(&self, id: &OrderLineId, price: Option<Money>) -> Result<OrderLine, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let line = order_lines::fetch_order_line(id, &mut tx)
            .await?
            .ok_or_else(|| OrderFlowError::OrderLineNotFound(id.clone()))?;
        let updated = order_lines::update_force_price(&line, price, &mut tx).await?;
        tx.commit().await?;
        Ok(updated)
    }
}

//--------------------------------------   AccountManagement   ---------------------------------------------------------
impl AccountManagement for SqliteDatabase {
    async fn insert_profile(&self, profile: NewProfile) -> Result<Profile, AccountApiError> {
        profile.validate()?;
        let mut tx = self.pool.begin().await?;
        if profiles::username_exists(&profile.username, &mut tx).await? {
            return Err(AccountApiError::UsernameTaken(profile.username));
        }
        let profile = profiles::insert_profile(profile, &mut tx).await?;
        tx.commit().await?;
        Ok(profile)
    }

    async fn fetch_profile(&self, id: i64) -> Result<Option<Profile>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let profile = profiles::fetch_profile(id, &mut conn).await?;
        Ok(profile)
    }

    async fn fetch_profile_by_username(&self, username: &str) -> Result<Option<Profile>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let profile = profiles::fetch_profile_by_username(username, &mut conn).await?;
        Ok(profile)
    }

    async fn fetch_profiles(&self) -> Result<Vec<Profile>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let profiles = profiles::fetch_profiles(&mut conn).await?;
        Ok(profiles)
    }

    async fn adjust_balance(&self, id: i64, delta: Money) -> Result<Profile, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        let profile = profiles::fetch_profile(id, &mut tx).await?.ok_or(AccountApiError::ProfileNotFound(id))?;
        let balance = profile.balance + delta;
        if balance.is_negative() {
            return Err(AccountApiError::InsufficientFunds { balance: profile.balance, requested: -delta });
        }
        let updated =
            profiles::set_balance(&profile, balance, &mut tx).await?.ok_or(AccountApiError::StaleVersion(id))?;
        tx.commit().await?;
        debug!("🗃️ Balance of profile #{id} changed by {delta} to {}", updated.balance);
        Ok(updated)
    }
}

//--------------------------------------    AuthManagement     ---------------------------------------------------------
impl AuthManagement for SqliteDatabase {
    async fn fetch_credentials(&self, username: &str) -> Result<Option<(i64, String)>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let credentials = auth::fetch_credentials(username, &mut conn).await?;
        Ok(credentials)
    }

    async fn fetch_roles_for_profile(&self, profile_id: i64) -> Result<Vec<Role>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let roles = auth::roles_for_profile(profile_id, &mut conn).await?;
        Ok(roles)
    }

    async fn check_profile_has_roles(&self, profile_id: i64, roles: &[Role]) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        match auth::count_missing_roles(profile_id, roles, &mut conn).await? {
            0 => Ok(()),
            n => Err(AuthApiError::RoleNotAllowed(n)),
        }
    }

    async fn assign_roles(&self, profile_id: i64, roles: &[Role]) -> Result<(), AuthApiError> {
        let mut tx = self.pool.begin().await?;
        if profiles::fetch_profile(profile_id, &mut tx).await?.is_none() {
            return Err(AuthApiError::ProfileNotFound(profile_id));
        }
        auth::assign_roles(profile_id, roles, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn remove_roles(&self, profile_id: i64, roles: &[Role]) -> Result<u64, AuthApiError> {
        let mut tx = self.pool.begin().await?;
        let removed = auth::remove_roles(profile_id, roles, &mut tx).await?;
        tx.commit().await?;
        Ok(removed)
    }
}

//--------------------------------------       AuditLog        ---------------------------------------------------------
impl AuditLog for SqliteDatabase {
    async fn insert_audit_entry(&self, entry: NewAuditEntry) -> Result<i64, AuditLogError> {
        let mut tx = self.pool.begin().await?;
        let id = audit::insert_entry(entry.truncated(), &mut tx).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn fetch_audit_entries(&self, query: AuditQueryFilter) -> Result<Vec<AuditEntry>, AuditLogError> {
        let mut conn = self.pool.acquire().await?;
        let entries = audit::fetch_entries(query, &mut conn).await?;
        Ok(entries)
    }
}
