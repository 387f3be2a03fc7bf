use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Money, NewPayment, Payment},
    traits::StorefrontDbError,
};

/// Records a payment. Gateway payment references are unique; a second insert with the same reference fails with
/// [`StorefrontDbError::PaymentAlreadyExists`].
pub async fn insert_payment(
    user_id: i64,
    payment: NewPayment,
    amount_paid: Money,
    conn: &mut SqliteConnection,
) -> Result<Payment, StorefrontDbError> {
    let payment_ref = payment.payment_id.clone();
    let result: Payment = sqlx::query_as(
        r#"
            INSERT INTO payments (user_id, payment_id, payment_method, amount_paid, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(payment.payment_id)
    .bind(payment.payment_method)
    .bind(amount_paid)
    .bind(payment.status.to_string())
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref err) if err.is_unique_violation() => {
            StorefrontDbError::PaymentAlreadyExists(payment_ref.clone())
        },
        e => e.into(),
    })?;
    debug!("🗃️ Payment {payment_ref} of {amount_paid} recorded for user #{user_id} with id {}", result.id);
    Ok(result)
}

pub async fn fetch_payment(
    user_id: i64,
    payment_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE user_id = $1 AND payment_id = $2")
        .bind(user_id)
        .bind(payment_ref)
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}
