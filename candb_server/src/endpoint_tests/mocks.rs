use candb_common::Money;
use candb_engine::{
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
        OrderFlowError,
        OrderManagement,
        ProductApiError,
        ProductManagement,
    },
};
use mockall::mock;

mock! {
    pub ProductStore {}
    impl ProductManagement for ProductStore {
        async fn insert_product(&self, product: NewProduct) -> Result<Product, ProductApiError>;
        async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, ProductApiError>;
        async fn search_products(&self, query: ProductQueryFilter) -> Result<Vec<Product>, ProductApiError>;
        async fn update_product(&self, id: &ProductId, version: i64, update: ProductUpdate) -> Result<Product, ProductApiError>;
        async fn set_availability(&self, id: &ProductId, version: i64, availability: Option<AvailabilityMap>) -> Result<Product, ProductApiError>;
        async fn set_stock_levels(&self, id: &ProductId, version: i64, levels: StockLevels) -> Result<Product, ProductApiError>;
        async fn delete_product(&self, id: &ProductId) -> Result<bool, ProductApiError>;
    }
}

mock! {
    pub OrderStore {}
    impl OrderManagement for OrderStore {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderFlowError>;
        async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, OrderFlowError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError>;
        async fn fetch_order_lines(&self, order_id: &OrderId) -> Result<Vec<OrderLine>, OrderFlowError>;
        async fn fetch_order_line(&self, id: &OrderLineId) -> Result<Option<OrderLine>, OrderFlowError>;
        async fn place_order_line(&self, product: &Product, line: NewOrderLine) -> Result<OrderLine, OrderFlowError>;
        async fn update_line_status(&self, id: &OrderLineId, status: OrderLineStatus) -> Result<OrderLine, OrderFlowError>;
        async fn force_line_price(&self, id: &OrderLineId, price: Option<Money>) -> Result<OrderLine, OrderFlowError>;
    }
    impl ProductManagement for OrderStore {
        async fn insert_product(&self, product: NewProduct) -> Result<Product, ProductApiError>;
        async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, ProductApiError>;
        async fn search_products(&self, query: ProductQueryFilter) -> Result<Vec<Product>, ProductApiError>;
        async fn update_product(&self, id: &ProductId, version: i64, update: ProductUpdate) -> Result<Product, ProductApiError>;
        async fn set_availability(&self, id: &ProductId, version: i64, availability: Option<AvailabilityMap>) -> Result<Product, ProductApiError>;
        async fn set_stock_levels(&self, id: &ProductId, version: i64, levels: StockLevels) -> Result<Product, ProductApiError>;
        async fn delete_product(&self, id: &ProductId) -> Result<bool, ProductApiError>;
    }
}

mock! {
    pub ProfileStore {}
    impl AccountManagement for ProfileStore {
        async fn insert_profile(&self, profile: NewProfile) -> Result<Profile, AccountApiError>;
        async fn fetch_profile(&self, id: i64) -> Result<Option<Profile>, AccountApiError>;
        async fn fetch_profile_by_username(&self, username: &str) -> Result<Option<Profile>, AccountApiError>;
        async fn fetch_profiles(&self) -> Result<Vec<Profile>, AccountApiError>;
        async fn adjust_balance(&self, id: i64, delta: Money) -> Result<Profile, AccountApiError>;
    }
    impl AuthManagement for ProfileStore {
        async fn fetch_credentials(&self, username: &str) -> Result<Option<(i64, String)>, AuthApiError>;
        async fn fetch_roles_for_profile(&self, profile_id: i64) -> Result<Vec<Role>, AuthApiError>;
        async fn check_profile_has_roles(&self, profile_id: i64, roles: &[Role]) -> Result<(), AuthApiError>;
        async fn assign_roles(&self, profile_id: i64, roles: &[Role]) -> Result<(), AuthApiError>;
        async fn remove_roles(&self, profile_id: i64, roles: &[Role]) -> Result<u64, AuthApiError>;
    }
}

mock! {
    pub AuditStore {}
    impl AuditLog for AuditStore {
        async fn insert_audit_entry(&self, entry: NewAuditEntry) -> Result<i64, AuditLogError>;
        async fn fetch_audit_entries(&self, query: AuditQueryFilter) -> Result<Vec<AuditEntry>, AuditLogError>;
    }
}
