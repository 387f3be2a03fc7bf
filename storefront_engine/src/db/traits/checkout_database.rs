use serde::{Deserialize, Serialize};

use crate::{
    db_types::{NewPayment, Order, OrderLine, OrderNumber, Payment},
    traits::{OrderManagement, StorefrontDbError},
};

/// The outcome of a successful reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedOrder {
    pub order: Order,
    pub payment: Payment,
    pub lines: Vec<OrderLine>,
}

#[allow(async_fn_in_trait)]
pub trait CheckoutDatabase: OrderManagement {
    /// Turns a verified payment into a completed order. In a single atomic transaction:
    /// * Marks the user's order `order_number` as ordered, but only if it is not ordered yet. This compare-and-set is
    ///   the duplicate-submission guard: if no row changes, nothing else happens and
    ///   [`StorefrontDbError::OrderNotFound`] is returned. Concurrent calls for the same order therefore commit at
    ///   most once.
    /// * Creates the payment record. The amount paid is the order total stored on the order.
    /// * Links the payment to the order.
    /// * For each active cart line of the user: creates an order line snapshot at the current product price, copies
    ///   the line's variation selections and decrements the product's stock. Stock may go negative. A product that
    ///   has disappeared is logged and skipped.
    /// * Deletes all of the user's cart lines.
    ///
    /// Any failure rolls the whole transaction back, leaving the order pending.
    async fn commit_paid_order(
        &self,
        user_id: i64,
        order_number: &OrderNumber,
        payment: NewPayment,
    ) -> Result<CommittedOrder, StorefrontDbError>;
}
