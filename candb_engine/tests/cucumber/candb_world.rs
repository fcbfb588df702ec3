use std::collections::HashMap;

use candb_engine::{
    availability::AvailabilityEngine,
    db_types::{Order, OrderLine, ProductId},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    AccountApi,
    OrderFlowApi,
    OrderFlowError,
    ProductApi,
    SqliteDatabase,
};
use cucumber::World;
use log::*;

#[derive(Default, Debug, World)]
pub struct CanDbWorld {
    pub system: Option<CanDbSystem>,
}

#[derive(Debug)]
pub struct CanDbSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub products: ProductApi<SqliteDatabase>,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub accounts: AccountApi<SqliteDatabase>,
    pub product_ids: HashMap<String, ProductId>,
    pub profile_ids: HashMap<String, i64>,
    pub current_order: Option<Order>,
    pub last_line: Option<OrderLine>,
    pub last_error: Option<OrderFlowError>,
}

impl CanDbWorld {
    pub fn system(&mut self) -> &mut CanDbSystem {
        self.system.as_mut().expect("System not initialised. Start the scenario with 'Given a fresh install'")
    }
}

impl CanDbSystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        let db = prepare_test_env(&url).await;
        debug!("🚀️ Created database: {url}");
        let engine = AvailabilityEngine::default();
        Self {
            db_path: url,
            products: ProductApi::new(db.clone(), engine),
            orders: OrderFlowApi::new(db.clone(), EventProducers::default(), engine),
            accounts: AccountApi::new(db.clone()),
            db,
            product_ids: HashMap::new(),
            profile_ids: HashMap::new(),
            current_order: None,
            last_line: None,
            last_error: None,
        }
    }

    pub fn product_id(&self, name: &str) -> ProductId {
        self.product_ids.get(name).cloned().unwrap_or_else(|| panic!("No product called {name}"))
    }

    pub fn profile_id(&self, username: &str) -> i64 {
        *self.profile_ids.get(username).unwrap_or_else(|| panic!("No profile called {username}"))
    }
}
