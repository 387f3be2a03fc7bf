use std::collections::HashMap;

use log::*;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::db_types::{Actor, CartItem, CartItemRemoval, CartLine, Variation};

/// Appends `user_id = ?` or `session_id = ?` for the actor, qualified with `table` when it is not empty.
fn push_owner_clause<'a>(builder: &mut QueryBuilder<'a, Sqlite>, table: &str, actor: &'a Actor) {
    let prefix = if table.is_empty() { String::new() } else { format!("{table}.") };
    match actor {
        Actor::User(id) => {
            builder.push(format!("{prefix}user_id = "));
            builder.push_bind(*id);
        },
        Actor::Session(token) => {
            builder.push(format!("{prefix}session_id = "));
            builder.push_bind(token.as_str());
        },
    }
}

/// Adds one unit of the product to the actor's active line, creating the line if it does not exist yet.
///
/// This is a single upsert against the partial unique indexes on `cart_items`, so concurrent adds for the same
/// (actor, product) cannot create two lines.
pub async fn upsert_line(actor: &Actor, product_id: i64, conn: &mut SqliteConnection) -> Result<CartItem, sqlx::Error> {
    let item: CartItem = match actor {
        Actor::User(user_id) => {
            sqlx::query_as(
                r#"
                INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, 1)
                ON CONFLICT (user_id, product_id) WHERE user_id IS NOT NULL AND is_active = 1
                DO UPDATE SET quantity = quantity + 1, updated_at = CURRENT_TIMESTAMP
                RETURNING *;
            "#,
            )
            .bind(user_id)
            .bind(product_id)
            .fetch_one(conn)
            .await?
        },
        Actor::Session(token) => {
            sqlx::query_as(
                r#"
                INSERT INTO cart_items (session_id, product_id, quantity) VALUES ($1, $2, 1)
                ON CONFLICT (session_id, product_id) WHERE session_id IS NOT NULL AND is_active = 1
                DO UPDATE SET quantity = quantity + 1, updated_at = CURRENT_TIMESTAMP
                RETURNING *;
            "#,
            )
            .bind(token.as_str())
            .bind(product_id)
            .fetch_one(conn)
            .await?
        },
    };
    trace!("🗃️ Cart line {} for {actor} now has quantity {}", item.id, item.quantity);
    Ok(item)
}

/// Records the variation selections on a line. A selection replaces whatever the line had in the same category, so a
/// line never carries two values for, say, colour. Categories that are not mentioned keep their current selection.
pub async fn attach_variations(
    cart_item_id: i64,
    variation_ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    if variation_ids.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::new("DELETE FROM cart_item_variations WHERE cart_item_id = ");
    builder.push_bind(cart_item_id);
    builder.push(
        " AND variation_id IN (SELECT v.id FROM variations v WHERE v.category IN (SELECT n.category FROM variations n          WHERE n.id IN (",
    );
    let mut ids = builder.separated(", ");
    for id in variation_ids {
        ids.push_bind(*id);
    }
    builder.push(")))");
    let replaced = builder.build().execute(&mut *conn).await?.rows_affected();
    if replaced > 0 {
        trace!("🗃️ Replaced {replaced} variation selections on cart line {cart_item_id}");
    }
    let mut builder = QueryBuilder::new("INSERT OR IGNORE INTO cart_item_variations (cart_item_id, variation_id) ");
    builder.push_values(variation_ids, |mut b, id| {
        b.push_bind(cart_item_id).push_bind(*id);
    });
    builder.build().execute(conn).await?;
    Ok(())
}

/// Takes one unit off the line, or deletes it if only one unit is left. This is not atomic on its own; call it
/// inside a transaction.
pub async fn decrement_or_delete(
    actor: &Actor,
    product_id: i64,
    cart_item_id: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItemRemoval, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        "UPDATE cart_items SET quantity = quantity - 1, updated_at = CURRENT_TIMESTAMP WHERE quantity > 1 AND id = ",
    );
    builder.push_bind(cart_item_id).push(" AND product_id = ").push_bind(product_id).push(" AND ");
    push_owner_clause(&mut builder, "", actor);
    builder.push(" RETURNING *");
    let decremented = builder.build_query_as::<CartItem>().fetch_optional(&mut *conn).await?;
    if let Some(item) = decremented {
        return Ok(CartItemRemoval::Decremented(item));
    }
    let deleted = delete_item(actor, product_id, cart_item_id, conn).await?;
    Ok(if deleted { CartItemRemoval::Deleted } else { CartItemRemoval::NotFound })
}

/// Deletes the line. Returns `false` if no line matched.
pub async fn delete_item(
    actor: &Actor,
    product_id: i64,
    cart_item_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let mut builder = QueryBuilder::new("DELETE FROM cart_items WHERE id = ");
    builder.push_bind(cart_item_id).push(" AND product_id = ").push_bind(product_id).push(" AND ");
    push_owner_clause(&mut builder, "", actor);
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

/// The actor's active lines joined with their products, with variation selections filled in.
pub async fn fetch_active_lines(actor: &Actor, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT c.id, c.product_id, p.name AS product_name, p.price, p.stock, c.quantity
    FROM cart_items c JOIN products p ON p.id = c.product_id
    WHERE c.is_active = 1 AND "#,
    );
    push_owner_clause(&mut builder, "c", actor);
    builder.push(" ORDER BY c.id");
    let mut lines = builder.build_query_as::<CartLine>().fetch_all(&mut *conn).await?;
    let ids = lines.iter().map(|l| l.id).collect::<Vec<i64>>();
    let mut variations = fetch_line_variations(&ids, conn).await?;
    for line in &mut lines {
        line.variations = variations.remove(&line.id).unwrap_or_default();
    }
    Ok(lines)
}

/// Variation selections for the given cart lines, keyed by cart line id.
pub async fn fetch_line_variations(
    cart_item_ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<HashMap<i64, Vec<Variation>>, sqlx::Error> {
    let mut result = HashMap::<i64, Vec<Variation>>::new();
    if cart_item_ids.is_empty() {
        return Ok(result);
    }
    let mut builder = QueryBuilder::new(
        r#"
    SELECT cv.cart_item_id, v.id, v.product_id, v.category, v.value, v.is_active
    FROM cart_item_variations cv JOIN variations v ON v.id = cv.variation_id
    WHERE cv.cart_item_id IN ("#,
    );
    let mut ids = builder.separated(", ");
    for id in cart_item_ids {
        ids.push_bind(*id);
    }
    builder.push(") ORDER BY v.id");
    let rows = builder.build_query_as::<(i64, i64, i64, String, String, bool)>().fetch_all(conn).await?;
    for (cart_item_id, id, product_id, category, value, is_active) in rows {
        result.entry(cart_item_id).or_default().push(Variation { id, product_id, category, value, is_active });
    }
    Ok(result)
}

/// Removes every cart line belonging to the user, active or not.
pub async fn clear_cart_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user_id).execute(conn).await?;
    trace!("🗃️ Cleared {} cart lines for user #{user_id}", result.rows_affected());
    Ok(result.rows_affected())
}
