//! `SqliteDatabase` is the SQLite implementation of the storefront engine backend.
//!
//! It implements all the traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{carts, db_url, new_pool, orders, payments, products};
use crate::{
    db_types::{
        Actor,
        CartItem,
        CartItemRemoval,
        CartLine,
        NewOrder,
        NewPayment,
        NewProduct,
        Order,
        OrderLine,
        OrderNumber,
        Payment,
        Product,
        Variation,
    },
    traits::{
        CartManagement,
        CatalogManagement,
        CheckoutDatabase,
        CommittedOrder,
        OrderManagement,
        StorefrontDbError,
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

impl CatalogManagement for SqliteDatabase {
    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_variations(&self, product_id: i64, ids: &[i64]) -> Result<Vec<Variation>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        let variations = products::fetch_variations(product_id, ids, &mut conn).await?;
        Ok(variations)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        products::insert_product(product, &mut conn).await
    }

    async fn insert_variation(
        &self,
        product_id: i64,
        category: &str,
        value: &str,
    ) -> Result<Variation, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        products::insert_variation(product_id, category, value, &mut conn).await
    }
}

impl CartManagement for SqliteDatabase {
    async fn add_to_cart(
        &self,
        actor: &Actor,
        product_id: i64,
        variation_ids: &[i64],
    ) -> Result<CartItem, StorefrontDbError> {
        let mut tx = self.pool.begin().await?;
        let item = carts::upsert_line(actor, product_id, &mut tx).await.map_err(|e| match e {
            sqlx::Error::Database(ref err) if err.is_foreign_key_violation() => {
                StorefrontDbError::ProductNotFound(product_id)
            },
            e => e.into(),
        })?;
        carts::attach_variations(item.id, variation_ids, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn remove_one(
        &self,
        actor: &Actor,
        product_id: i64,
        cart_item_id: i64,
    ) -> Result<CartItemRemoval, StorefrontDbError> {
        let mut tx = self.pool.begin().await?;
        let result = carts::decrement_or_delete(actor, product_id, cart_item_id, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn delete_cart_item(
        &self,
        actor: &Actor,
        product_id: i64,
        cart_item_id: i64,
    ) -> Result<bool, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = carts::delete_item(actor, product_id, cart_item_id, &mut conn).await?;
        Ok(deleted)
    }

    async fn fetch_cart(&self, actor: &Actor) -> Result<Vec<CartLine>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        let lines = carts::fetch_active_lines(actor, &mut conn).await?;
        Ok(lines)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StorefrontDbError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order_by_number(
        &self,
        user_id: i64,
        order_number: &OrderNumber,
    ) -> Result<Option<Order>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(user_id, order_number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        let lines = orders::fetch_order_lines(order_id, &mut conn).await?;
        Ok(lines)
    }

    async fn fetch_payment(&self, user_id: i64, payment_ref: &str) -> Result<Option<Payment>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment(user_id, payment_ref, &mut conn).await?;
        Ok(payment)
    }
}

impl CheckoutDatabase for SqliteDatabase {
    async fn commit_paid_order(
        &self,
        user_id: i64,
        order_number: &OrderNumber,
        payment: NewPayment,
    ) -> Result<CommittedOrder, StorefrontDbError> {
        let mut tx = self.pool.begin().await?;
        // Dropping `tx` on any early return rolls everything back.
        let order = orders::mark_as_ordered(user_id, order_number, &mut tx)
            .await?
            .ok_or_else(|| StorefrontDbError::OrderNotFound(order_number.clone()))?;
        trace!("🗃️ Order {order_number} marked as ordered");
        let payment = payments::insert_payment(user_id, payment, order.order_total, &mut tx).await?;
        let order = orders::link_payment(order.id, payment.id, &mut tx).await?;
        let cart = carts::fetch_active_lines(&Actor::User(user_id), &mut tx).await?;
        let mut lines = Vec::with_capacity(cart.len());
        for item in &cart {
            let mut line = orders::insert_order_line(&order, payment.id, item, &mut tx).await?;
            orders::copy_line_variations(item.id, line.id, &mut tx).await?;
            line.variations = item.variations.clone();
            if !products::decrement_stock(item.product_id, item.quantity, &mut tx).await? {
                warn!(
                    "🗃️ Product {} was not found while reducing stock for order {order_number}. Skipping.",
                    item.product_id
                );
            }
            lines.push(line);
        }
        let cleared = carts::clear_cart_for_user(user_id, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Order {order_number} committed with payment {}. {} lines, {cleared} cart items cleared",
            payment.payment_id,
            lines.len()
        );
        Ok(CommittedOrder { order, payment, lines })
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies any outstanding schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}
