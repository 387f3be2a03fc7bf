use std::collections::HashMap;

use log::*;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{CartLine, NewOrder, Order, OrderLine, OrderNumber, Variation},
    traits::StorefrontDbError,
};

/// Inserts a new order and stamps its order number. This is not atomic. Embed the call inside a transaction so that
/// an order without a number is never visible, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, StorefrontDbError> {
    let NewOrder { user_id, billing, subtotal, tax, order_total, ip } = order;
    let inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                user_id,
                first_name,
                last_name,
                phone,
                email,
                address_line_1,
                address_line_2,
                country,
                state,
                city,
                order_note,
                subtotal,
                tax,
                order_total,
                ip
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(billing.first_name)
    .bind(billing.last_name)
    .bind(billing.phone)
    .bind(billing.email)
    .bind(billing.address_line_1)
    .bind(billing.address_line_2)
    .bind(billing.country)
    .bind(billing.state)
    .bind(billing.city)
    .bind(billing.order_note)
    .bind(subtotal)
    .bind(tax)
    .bind(order_total)
    .bind(ip.unwrap_or_default())
    .fetch_one(&mut *conn)
    .await?;
    let order_number = OrderNumber::new(inserted.created_at.date_naive(), inserted.id);
    let order = stamp_order_number(inserted.id, &order_number, conn).await?;
    debug!("🗃️ Order {order_number} inserted with id {} for user #{user_id}", order.id);
    Ok(order)
}

async fn stamp_order_number(
    id: i64,
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Order, StorefrontDbError> {
    sqlx::query_as("UPDATE orders SET order_number = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
        .bind(order_number)
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref err) if err.is_unique_violation() => {
                StorefrontDbError::OrderNumberCollision(order_number.clone())
            },
            e => e.into(),
        })?
        .ok_or(StorefrontDbError::OrderIdNotFound(id))
}

pub async fn fetch_order_by_number(
    user_id: i64,
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 AND order_number = $2")
        .bind(user_id)
        .bind(order_number)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Flips `is_ordered` from false to true for the user's order, in one conditional update.
///
/// Returns `None` if the order does not exist, belongs to someone else, or has already been marked as ordered. In
/// every case nothing is modified.
pub async fn mark_as_ordered(
    user_id: i64,
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET is_ordered = 1, updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $1 AND order_number = $2 AND is_ordered = 0
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(order_number)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn link_payment(
    order_id: i64,
    payment_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Order, StorefrontDbError> {
    sqlx::query_as("UPDATE orders SET payment_id = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
        .bind(payment_id)
        .bind(order_id)
        .fetch_optional(conn)
        .await?
        .ok_or(StorefrontDbError::OrderIdNotFound(order_id))
}

/// Snapshots a cart line into the order at the line's current product price.
pub async fn insert_order_line(
    order: &Order,
    payment_id: i64,
    line: &CartLine,
    conn: &mut SqliteConnection,
) -> Result<OrderLine, sqlx::Error> {
    let order_line = sqlx::query_as(
        r#"
            INSERT INTO order_lines (
                order_id, payment_id, user_id, product_id, product_name, quantity, product_price, ordered
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, 1)
            RETURNING *;
        "#,
    )
    .bind(order.id)
    .bind(payment_id)
    .bind(order.user_id)
    .bind(line.product_id)
    .bind(line.product_name.as_str())
    .bind(line.quantity)
    .bind(line.price)
    .fetch_one(conn)
    .await?;
    Ok(order_line)
}

/// Copies the variation selections of a cart line onto an order line.
pub async fn copy_line_variations(
    cart_item_id: i64,
    order_line_id: i64,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
            INSERT INTO order_line_variations (order_line_id, variation_id)
            SELECT $1, variation_id FROM cart_item_variations WHERE cart_item_id = $2;
        "#,
    )
    .bind(order_line_id)
    .bind(cart_item_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// The order's lines, in insertion order, with their variation selections.
pub async fn fetch_order_lines(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderLine>, sqlx::Error> {
    let mut lines: Vec<OrderLine> = sqlx::query_as("SELECT * FROM order_lines WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;
    let ids = lines.iter().map(|l| l.id).collect::<Vec<i64>>();
    let mut variations = fetch_order_line_variations(&ids, conn).await?;
    for line in &mut lines {
        line.variations = variations.remove(&line.id).unwrap_or_default();
    }
    Ok(lines)
}

async fn fetch_order_line_variations(
    order_line_ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<HashMap<i64, Vec<Variation>>, sqlx::Error> {
    let mut result = HashMap::<i64, Vec<Variation>>::new();
    if order_line_ids.is_empty() {
        return Ok(result);
    }
    let mut builder = QueryBuilder::new(
        r#"
    SELECT ov.order_line_id, v.id, v.product_id, v.category, v.value, v.is_active
    FROM order_line_variations ov JOIN variations v ON v.id = ov.variation_id
    WHERE ov.order_line_id IN ("#,
    );
    let mut ids = builder.separated(", ");
    for id in order_line_ids {
        ids.push_bind(*id);
    }
    builder.push(") ORDER BY v.id");
    let rows = builder.build_query_as::<(i64, i64, i64, String, String, bool)>().fetch_all(conn).await?;
    for (order_line_id, id, product_id, category, value, is_active) in rows {
        result.entry(order_line_id).or_default().push(Variation { id, product_id, category, value, is_active });
    }
    Ok(result)
}
