use crate::{
    db_types::{Actor, CartItem, CartItemRemoval, CartLine},
    traits::StorefrontDbError,
};

/// Storage for cart lines. Every call is scoped to an [`Actor`]; a line belonging to someone else behaves exactly as
/// though it did not exist.
#[allow(async_fn_in_trait)]
pub trait CartManagement: Clone {
    /// Adds one unit of `product_id` to the actor's cart, creating the line if necessary. There is at most one active
    /// line per (actor, product), so repeated calls increment the quantity of the same line.
    ///
    /// The given variation ids are attached to the line. The caller is responsible for checking that they belong to
    /// the product.
    async fn add_to_cart(
        &self,
        actor: &Actor,
        product_id: i64,
        variation_ids: &[i64],
    ) -> Result<CartItem, StorefrontDbError>;

    /// Removes one unit from the line, deleting the line when it held a single unit.
    async fn remove_one(
        &self,
        actor: &Actor,
        product_id: i64,
        cart_item_id: i64,
    ) -> Result<CartItemRemoval, StorefrontDbError>;

    /// Deletes the line outright. Returns `false` if there was no such line for this actor.
    async fn delete_cart_item(
        &self,
        actor: &Actor,
        product_id: i64,
        cart_item_id: i64,
    ) -> Result<bool, StorefrontDbError>;

    /// The actor's active cart lines, with product prices and selected variations, ordered by line id. An actor who
    /// has never added anything simply has no lines.
    async fn fetch_cart(&self, actor: &Actor) -> Result<Vec<CartLine>, StorefrontDbError>;
}
