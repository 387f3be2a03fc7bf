use std::{collections::HashSet, fmt::Debug};

use log::*;

use crate::{
    db_types::{Actor, CartItem, CartItemRemoval},
    order_objects::CartSummary,
    sf_api::errors::CartApiError,
    traits::{CartManagement, CatalogManagement},
};

/// `CartApi` manages the shopping cart of a single actor per call: an authenticated user or an anonymous session.
pub struct CartApi<B> {
    db: B,
}

impl<B> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi")
    }
}

impl<B> CartApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CartApi<B>
where B: CatalogManagement + CartManagement
{
    /// Adds one unit of the product to the actor's cart.
    ///
    /// Variation ids that do not belong to the product are dropped, as are repeats of a category within one request.
    /// A selection replaces the line's earlier choice in the same category. Returns the updated cart line.
    pub async fn add_item(
        &self,
        actor: &Actor,
        product_id: i64,
        variation_ids: &[i64],
    ) -> Result<CartItem, CartApiError> {
        self.db.fetch_product(product_id).await?.ok_or(CartApiError::ProductNotFound(product_id))?;
        let variations = if variation_ids.is_empty() {
            Vec::new()
        } else {
            let found = self.db.fetch_variations(product_id, variation_ids).await?;
            if found.len() != variation_ids.len() {
                debug!("🛒️ Ignoring {} unknown variations for product {product_id}", variation_ids.len() - found.len());
            }
            let mut categories = HashSet::new();
            found
                .into_iter()
                .filter(|v| {
                    let first = categories.insert(v.category.clone());
                    if !first {
                        debug!("🛒️ Ignoring {} = {}, another {} was already chosen", v.category, v.value, v.category);
                    }
                    first
                })
                .map(|v| v.id)
                .collect()
        };
        let item = self.db.add_to_cart(actor, product_id, &variations).await?;
        debug!("🛒️ Added product {product_id} to cart of {actor}. Quantity is now {}", item.quantity);
        Ok(item)
    }

    /// Removes one unit from a cart line, deleting the line when it reaches zero.
    ///
    /// A line that does not exist (or belongs to someone else) is not an error: the request is a no-op. An unknown
    /// product is.
    pub async fn remove_one(
        &self,
        actor: &Actor,
        product_id: i64,
        cart_item_id: i64,
    ) -> Result<CartItemRemoval, CartApiError> {
        self.db.fetch_product(product_id).await?.ok_or(CartApiError::ProductNotFound(product_id))?;
        let result = self.db.remove_one(actor, product_id, cart_item_id).await?;
        match &result {
            CartItemRemoval::Decremented(item) => {
                debug!("🛒️ Cart line {cart_item_id} of {actor} reduced to {}", item.quantity)
            },
            CartItemRemoval::Deleted => debug!("🛒️ Cart line {cart_item_id} of {actor} removed"),
            CartItemRemoval::NotFound => {
                debug!("🛒️ Cart line {cart_item_id} for product {product_id} not found for {actor}. Nothing to do")
            },
        }
        Ok(result)
    }

    /// Deletes a cart line outright.
    pub async fn remove_line(&self, actor: &Actor, product_id: i64, cart_item_id: i64) -> Result<(), CartApiError> {
        if self.db.delete_cart_item(actor, product_id, cart_item_id).await? {
            debug!("🛒️ Cart line {cart_item_id} of {actor} deleted");
            Ok(())
        } else {
            Err(CartApiError::CartItemNotFound { product_id, cart_item_id })
        }
    }

    /// The actor's cart lines and totals. An actor with no lines gets an empty summary with zero totals.
    pub async fn cart(&self, actor: &Actor) -> Result<CartSummary, CartApiError> {
        let lines = self.db.fetch_cart(actor).await?;
        trace!("🛒️ Fetched {} cart lines for {actor}", lines.len());
        Ok(CartSummary::new(lines))
    }
}
