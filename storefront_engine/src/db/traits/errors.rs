use thiserror::Error;

use crate::db_types::OrderNumber;

#[derive(Debug, Clone, Error)]
pub enum StorefrontDbError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Order {0} not found or already processed")]
    OrderNotFound(OrderNumber),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("Cannot insert payment, since it already exists with reference {0}")]
    PaymentAlreadyExists(String),
    #[error("Order number {0} is already in use")]
    OrderNumberCollision(OrderNumber),
}

impl From<sqlx::Error> for StorefrontDbError {
    fn from(e: sqlx::Error) -> Self {
        StorefrontDbError::DatabaseError(e.to_string())
    }
}
