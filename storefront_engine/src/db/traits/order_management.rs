use crate::{
    db_types::{NewOrder, Order, OrderLine, OrderNumber, Payment},
    traits::StorefrontDbError,
};

#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// Persists a new, unpaid order and stamps its order number, in a single atomic transaction.
    ///
    /// The order number is derived from the creation date and the row id, so it can only be assigned once the row
    /// exists. The returned record always carries its order number.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StorefrontDbError>;

    /// Fetches the user's order with the given number, whether or not it has been paid.
    async fn fetch_order_by_number(
        &self,
        user_id: i64,
        order_number: &OrderNumber,
    ) -> Result<Option<Order>, StorefrontDbError>;

    /// The line snapshots of the order, including their variation selections.
    async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, StorefrontDbError>;

    /// Fetches the user's payment with the given gateway payment reference.
    async fn fetch_payment(&self, user_id: i64, payment_ref: &str) -> Result<Option<Payment>, StorefrontDbError>;
}
