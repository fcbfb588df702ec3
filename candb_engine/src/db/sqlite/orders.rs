use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewOrder, Order, OrderId},
    order_objects::OrderQueryFilter,
};

const ORDER_COLUMNS: &str = "id, profile_id, order_time, override_cost, total_cost, notes, version, updated_at";

/// Inserts a new order using the given connection. This is not atomic. Embed the call in a transaction and pass
/// `&mut *tx` if you need it to be.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, SqliteDatabaseError> {
    let id = OrderId::new_random();
    let sql = format!(
        "INSERT INTO orders (id, profile_id, override_cost, notes) VALUES ($1, $2, $3, $4) RETURNING {ORDER_COLUMNS}"
    );
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .bind(order.profile_id)
        .bind(order.override_cost)
        .bind(order.notes)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Order {} saved for profile #{}", order.id, order.profile_id);
    Ok(order)
}

pub async fn fetch_order(id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, SqliteDatabaseError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let order = sqlx::query_as::<_, Order>(&sql).bind(id).fetch_one(conn).await;
    match order {
        Err(sqlx::Error::RowNotFound) => Ok(None),
        Err(e) => Err(e.into()),
        Ok(o) => Ok(Some(o)),
    }
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `order_time` in ascending order
pub async fn search_orders(
    query: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders "));
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(profile_id) = query.profile_id {
        where_clause.push("profile_id = ");
        where_clause.push_bind_unseparated(profile_id);
    }
    if let Some(product_id) = query.product_id {
        where_clause.push("id IN (SELECT order_id FROM order_lines WHERE product_id = ");
        where_clause.push_bind_unseparated(product_id);
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("order_time >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("order_time <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY order_time ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {}", orders.len());
    Ok(orders)
}
