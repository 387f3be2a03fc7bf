use log::*;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewProduct, Product, Variation},
    traits::StorefrontDbError,
};

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, StorefrontDbError> {
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (name, slug, price, stock) VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(product.name)
    .bind(product.slug)
    .bind(product.price)
    .bind(product.stock)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Product [{}] inserted with id {}", product.name, product.id);
    Ok(product)
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn insert_variation(
    product_id: i64,
    category: &str,
    value: &str,
    conn: &mut SqliteConnection,
) -> Result<Variation, StorefrontDbError> {
    let variation = sqlx::query_as(
        "INSERT INTO variations (product_id, category, value) VALUES ($1, $2, $3) RETURNING id, product_id, category, \
         value, is_active",
    )
    .bind(product_id)
    .bind(category)
    .bind(value)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref err) if err.is_foreign_key_violation() => {
            StorefrontDbError::ProductNotFound(product_id)
        },
        e => e.into(),
    })?;
    Ok(variation)
}

/// Returns the active variations of the product whose ids are in `ids`.
pub async fn fetch_variations(
    product_id: i64,
    ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<Vec<Variation>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new(
        "SELECT id, product_id, category, value, is_active FROM variations WHERE is_active = 1 AND product_id = ",
    );
    builder.push_bind(product_id);
    builder.push(" AND id IN (");
    let mut ids_clause = builder.separated(", ");
    for id in ids {
        ids_clause.push_bind(*id);
    }
    builder.push(") ORDER BY id");
    let variations = builder.build_query_as::<Variation>().fetch_all(conn).await?;
    Ok(variations)
}

/// Reduces the stock level of the product. The stock level is allowed to go negative.
///
/// Returns `false` if the product does not exist.
pub async fn decrement_stock(
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE products SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
            .bind(quantity)
            .bind(product_id)
            .execute(conn)
            .await?;
    let updated = result.rows_affected() > 0;
    if updated {
        trace!("🗃️ Stock for product {product_id} reduced by {quantity}");
    }
    Ok(updated)
}
