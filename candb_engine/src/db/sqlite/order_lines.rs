use candb_common::Money;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{line_cost, NewOrderLine, OrderId, OrderLine, OrderLineId, OrderLineStatus},
};

const LINE_COLUMNS: &str = "id, order_id, product_id, quantity, quantity_reserved, persistent_cost, item_cost, \
                            force_price, status, notes, availability_id, version, created_at, updated_at";

/// Inserts a new order line. The item cost is derived from the line's unit price and forced price. Stock reservation
/// is the caller's concern.
pub async fn insert_order_line(
    line: NewOrderLine,
    conn: &mut SqliteConnection,
) -> Result<OrderLine, SqliteDatabaseError> {
    let id = OrderLineId::new_random();
    let item_cost = line.item_cost().map_err(|e| SqliteDatabaseError::EncodingError(e.to_string()))?;
    let sql = format!(
        "INSERT INTO order_lines (id, order_id, product_id, quantity, quantity_reserved, persistent_cost, item_cost, \
         force_price, notes, availability_id) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {LINE_COLUMNS}"
    );
    let line = sqlx::query_as::<_, OrderLine>(&sql)
        .bind(id)
        .bind(line.order_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.quantity_reserved)
        .bind(line.persistent_cost)
        .bind(item_cost)
        .bind(line.force_price)
        .bind(line.notes)
        .bind(line.availability_id)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Order line {} saved: {} x {}", line.id, line.quantity, line.product_id);
    Ok(line)
}

pub async fn fetch_order_line(
    id: &OrderLineId,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderLine>, SqliteDatabaseError> {
    let sql = format!("SELECT {LINE_COLUMNS} FROM order_lines WHERE id = $1");
    let line = sqlx::query_as::<_, OrderLine>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(line)
}

pub async fn fetch_lines_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderLine>, SqliteDatabaseError> {
    let sql = format!("SELECT {LINE_COLUMNS} FROM order_lines WHERE order_id = $1 ORDER BY created_at ASC, rowid ASC");
    let lines = sqlx::query_as::<_, OrderLine>(&sql).bind(order_id).fetch_all(conn).await?;
    trace!("🗃️ {} lines fetched for order {order_id}", lines.len());
    Ok(lines)
}

/// Sets the status and reserved quantity of a line, provided the line is still at `version`.
pub async fn update_status(
    line: &OrderLine,
    status: OrderLineStatus,
    quantity_reserved: i64,
    conn: &mut SqliteConnection,
) -> Result<OrderLine, SqliteDatabaseError> {
    let sql = format!(
        "UPDATE order_lines SET status = $1, quantity_reserved = $2, version = version + 1, updated_at = \
         CURRENT_TIMESTAMP WHERE id = $3 AND version = $4 RETURNING {LINE_COLUMNS}"
    );
    let updated = sqlx::query_as::<_, OrderLine>(&sql)
        .bind(status)
        .bind(quantity_reserved)
        .bind(&line.id)
        .bind(line.version)
        .fetch_optional(conn)
        .await?;
    updated.ok_or_else(|| SqliteDatabaseError::StaleVersion(format!("Order line {}", line.id)))
}

pub async fn update_force_price(
    line: &OrderLine,
    force_price: Option<Money>,
    conn: &mut SqliteConnection,
) -> Result<OrderLine, SqliteDatabaseError> {
    let item_cost = line_cost(line.quantity, line.persistent_cost, force_price)
        .map_err(|e| SqliteDatabaseError::EncodingError(e.to_string()))?;
    let sql = format!(
        "UPDATE order_lines SET force_price = $1, item_cost = $2, version = version + 1, updated_at = \
         CURRENT_TIMESTAMP WHERE id = $3 AND version = $4 RETURNING {LINE_COLUMNS}"
    );
    let updated = sqlx::query_as::<_, OrderLine>(&sql)
        .bind(force_price)
        .bind(item_cost)
        .bind(&line.id)
        .bind(line.version)
        .fetch_optional(conn)
        .await?;
    updated.ok_or_else(|| SqliteDatabaseError::StaleVersion(format!("Order line {}", line.id)))
}
