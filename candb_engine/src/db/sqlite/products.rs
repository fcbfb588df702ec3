use log::{debug, trace, warn};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    availability::{encode_availability, AvailabilityMap},
    db::sqlite::SqliteDatabaseError,
    db_types::{NewProduct, Product, ProductId, ProductUpdate, StockLevels},
    product_objects::ProductQueryFilter,
};

const PRODUCT_COLUMNS: &str = "id, name, price, description, physical_stock, reserved_stock, availability, notes, tags, \
                               version, created_at, updated_at";

fn encode_tags(tags: &[String]) -> Result<String, SqliteDatabaseError> {
    serde_json::to_string(tags).map_err(|e| SqliteDatabaseError::EncodingError(format!("product tags. {e}")))
}

fn encode_map(availability: Option<&AvailabilityMap>) -> Result<Option<String>, SqliteDatabaseError> {
    Ok(availability.map(encode_availability).transpose()?)
}

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, SqliteDatabaseError> {
    let id = ProductId::new_random();
    let availability = encode_map(product.availability.as_ref())?;
    let tags = encode_tags(&product.tags)?;
    let sql = format!(
        "INSERT INTO products (id, name, price, description, physical_stock, reserved_stock, availability, notes, tags) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {PRODUCT_COLUMNS}"
    );
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .bind(product.name)
        .bind(product.price)
        .bind(product.description)
        .bind(product.physical_stock)
        .bind(product.reserved_stock)
        .bind(availability)
        .bind(product.notes)
        .bind(tags)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Product {} ({}) saved", product.id, product.name);
    Ok(product)
}

pub async fn fetch_product(id: &ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, SqliteDatabaseError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
    let product = sqlx::query_as::<_, Product>(&sql).bind(id).fetch_one(conn).await;
    match product {
        Err(sqlx::Error::RowNotFound) => Ok(None),
        Err(e) => Err(e.into()),
        Ok(p) => Ok(Some(p)),
    }
}

/// Fetches products according to the criteria in the `ProductQueryFilter`, ordered by name.
pub async fn search_products(
    query: ProductQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products "));
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(name) = query.name {
        where_clause.push("lower(name) LIKE ");
        where_clause.push_bind_unseparated(format!("%{}%", name.to_lowercase()));
    }
    if let Some(tag) = query.tag {
        where_clause.push("EXISTS (SELECT 1 FROM json_each(products.tags) WHERE json_each.value = ");
        where_clause.push_bind_unseparated(tag);
        where_clause.push_unseparated(")");
    }
    if let Some(price) = query.max_price {
        where_clause.push("price <= ");
        where_clause.push_bind_unseparated(price);
    }
    builder.push(" ORDER BY name ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let products = builder.build_query_as::<Product>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_products: {}", products.len());
    Ok(products)
}

fn stale(id: &ProductId) -> SqliteDatabaseError {
    SqliteDatabaseError::StaleVersion(id.to_string())
}

/// Runs a versioned update against a product and returns the new row. A missing row is reported as `NotFound`, and
/// a version mismatch as `StaleVersion`.
async fn finish_versioned_update(
    mut builder: QueryBuilder<'_, sqlx::Sqlite>,
    id: &ProductId,
    version: i64,
    conn: &mut SqliteConnection,
) -> Result<Product, SqliteDatabaseError> {
    builder.push(", version = version + 1, updated_at = CURRENT_TIMESTAMP WHERE id = ");
    builder.push_bind(id.as_str().to_string());
    builder.push(" AND version = ");
    builder.push_bind(version);
    builder.push(format!(" RETURNING {PRODUCT_COLUMNS}"));
    trace!("🗃️ Executing query: {}", builder.sql());
    let updated = builder.build_query_as::<Product>().fetch_optional(&mut *conn).await?;
    match updated {
        Some(p) => Ok(p),
        None => match fetch_product(id, conn).await? {
            Some(_) => Err(stale(id)),
            None => Err(SqliteDatabaseError::NotFound(id.to_string())),
        },
    }
}

pub async fn update_product(
    id: &ProductId,
    version: i64,
    update: ProductUpdate,
    conn: &mut SqliteConnection,
) -> Result<Product, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new("UPDATE products SET ");
    let mut set_clause = builder.separated(", ");
    // Keeps the statement valid when the update is empty; the version still moves on
    set_clause.push("id = id");
    if let Some(name) = update.name {
        set_clause.push("name = ");
        set_clause.push_bind_unseparated(name);
    }
    if let Some(price) = update.price {
        set_clause.push("price = ");
        set_clause.push_bind_unseparated(price);
    }
    if let Some(description) = update.description {
        set_clause.push("description = ");
        set_clause.push_bind_unseparated(description);
    }
    if let Some(notes) = update.notes {
        set_clause.push("notes = ");
        set_clause.push_bind_unseparated(notes);
    }
    if let Some(tags) = update.tags {
        set_clause.push("tags = ");
        set_clause.push_bind_unseparated(encode_tags(&tags)?);
    }
    finish_versioned_update(builder, id, version, conn).await
}

pub async fn set_availability(
    id: &ProductId,
    version: i64,
    availability: Option<&AvailabilityMap>,
    conn: &mut SqliteConnection,
) -> Result<Product, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new("UPDATE products SET availability = ");
    builder.push_bind(encode_map(availability)?);
    finish_versioned_update(builder, id, version, conn).await
}

pub async fn set_stock_levels(
    id: &ProductId,
    version: i64,
    levels: StockLevels,
    conn: &mut SqliteConnection,
) -> Result<Product, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new("UPDATE products SET physical_stock = ");
    builder.push_bind(levels.physical_stock);
    builder.push(", reserved_stock = ");
    builder.push_bind(levels.reserved_stock);
    finish_versioned_update(builder, id, version, conn).await
}

/// Adds `delta` units to the product's reserved stock, provided the product is still at `version` and the result stays
/// within the physical stock. Returns the updated product.
pub async fn adjust_reserved_stock(
    id: &ProductId,
    version: i64,
    delta: i64,
    conn: &mut SqliteConnection,
) -> Result<Product, SqliteDatabaseError> {
    let sql = format!(
        "UPDATE products SET reserved_stock = reserved_stock + $1, version = version + 1, updated_at = \
         CURRENT_TIMESTAMP WHERE id = $2 AND version = $3 AND physical_stock IS NOT NULL AND reserved_stock + $1 \
         BETWEEN 0 AND physical_stock RETURNING {PRODUCT_COLUMNS}"
    );
    let product =
        sqlx::query_as::<_, Product>(&sql).bind(delta).bind(id).bind(version).fetch_optional(conn).await?;
    product.ok_or_else(|| stale(id))
}

/// Hands `quantity` reserved units back to the product regardless of its version. Used when an order line gives up its
/// reservation. If the counters were reset in the meantime, the reserved count stops at zero.
pub async fn release_reserved_stock(
    id: &ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE products SET reserved_stock = MAX(reserved_stock - $1, 0), version = version + 1, updated_at = \
         CURRENT_TIMESTAMP WHERE id = $2 AND reserved_stock IS NOT NULL",
    )
    .bind(quantity)
    .bind(id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        warn!("🗃️ Product {id} no longer tracks reserved stock. {quantity} units were not handed back");
    } else {
        debug!("🗃️ Released {quantity} reserved units of {id}");
    }
    Ok(())
}

pub async fn product_has_order_lines(id: &ProductId, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let count: i64 =
        sqlx::query_scalar("SELECT count(*) FROM order_lines WHERE product_id = $1").bind(id).fetch_one(conn).await?;
    Ok(count > 0)
}

pub async fn delete_product(id: &ProductId, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
