use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Actor, BillingDetails, NewOrder},
    order_objects::{CartSummary, PlacedOrder},
    sf_api::errors::CheckoutError,
    traits::{CartManagement, OrderManagement},
};

/// `CheckoutApi` turns a user's cart and billing details into a pending order.
pub struct CheckoutApi<B> {
    db: B,
}

impl<B> Debug for CheckoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi")
    }
}

impl<B> CheckoutApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CheckoutApi<B>
where B: CartManagement + OrderManagement
{
    /// Creates an unpaid order from the user's cart.
    ///
    /// * An empty cart fails with [`CheckoutError::EmptyCart`] and creates nothing.
    /// * Invalid billing details fail with [`CheckoutError::InvalidBilling`], which carries the field errors and the
    ///   cart summary so that the form can be shown again.
    ///
    /// Otherwise, the order is stored with the cart totals and its order number, and the amount to charge is
    /// returned along with it. The cart itself is left untouched until the payment is verified.
    pub async fn place_order(
        &self,
        user_id: i64,
        billing: BillingDetails,
        ip: Option<String>,
    ) -> Result<PlacedOrder, CheckoutError> {
        let actor = Actor::User(user_id);
        let summary = CartSummary::new(self.db.fetch_cart(&actor).await?);
        if summary.is_empty() {
            debug!("📝️ {actor} tried to check out with an empty cart");
            return Err(CheckoutError::EmptyCart);
        }
        if let Err(errors) = billing.validate() {
            debug!("📝️ Rejecting checkout form for {actor}. {errors}");
            return Err(CheckoutError::InvalidBilling { errors, summary });
        }
        let totals = summary.totals;
        let new_order = NewOrder {
            user_id,
            billing: billing.trimmed(),
            subtotal: totals.total,
            tax: totals.tax,
            order_total: totals.grand_total,
            ip,
        };
        let order = self.db.insert_order(new_order).await?;
        info!("📝️ Order {} placed by {actor} for {}", order.number(), order.order_total);
        let amount = order.order_total;
        Ok(PlacedOrder { order, summary, amount })
    }
}
