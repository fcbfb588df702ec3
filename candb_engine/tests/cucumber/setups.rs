use candb_common::Money;
use candb_engine::{
    auth_api::hash_password,
    db_types::{NewProduct, NewProfile},
};
use cucumber::given;

use crate::cucumber::{candb_world::CanDbSystem, CanDbWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut CanDbWorld) {
    let system = CanDbSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a customer '{word}' with a balance of {word}")]
async fn customer_with_balance(world: &mut CanDbWorld, username: String, balance: String) {
    let balance = balance.parse::<Money>().expect("Not a valid amount");
    let sys = world.system();
    let hash = hash_password("secret").expect("Error hashing password");
    let profile = sys.accounts.create_profile(NewProfile::new(username.clone(), hash)).await.expect("Error creating profile");
    sys.accounts.credit_balance(profile.id, balance).await.expect("Error crediting balance");
    sys.profile_ids.insert(username, profile.id);
}

#[given(expr = "a product '{word}' priced at {word} with {int} in stock and {int} reserved")]
async fn tracked_product(world: &mut CanDbWorld, name: String, price: String, physical: i64, reserved: i64) {
    let price = price.parse::<Money>().expect("Not a valid price");
    let product = NewProduct::new(name.clone(), price).with_stock(physical, reserved);
    let sys = world.system();
    let product = sys.products.create_product(product).await.expect("Error creating product");
    sys.product_ids.insert(name, product.id);
}

#[given(expr = "a product '{word}' priced at {word} with untracked stock")]
async fn untracked_product(world: &mut CanDbWorld, name: String, price: String) {
    let price = price.parse::<Money>().expect("Not a valid price");
    let sys = world.system();
    let product = sys.products.create_product(NewProduct::new(name.clone(), price)).await.expect("Error creating product");
    sys.product_ids.insert(name, product.id);
}
