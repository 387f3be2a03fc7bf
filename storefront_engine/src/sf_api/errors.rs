use thiserror::Error;

use crate::{
    order_objects::{CartSummary, FieldErrors},
    traits::StorefrontDbError,
};

#[derive(Debug, Clone, Error)]
pub enum CartApiError {
    #[error("The requested product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Cart item {cart_item_id} for product {product_id} does not exist")]
    CartItemNotFound { product_id: i64, cart_item_id: i64 },
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StorefrontDbError> for CartApiError {
    fn from(e: StorefrontDbError) -> Self {
        match e {
            StorefrontDbError::ProductNotFound(id) => Self::ProductNotFound(id),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("The cart is empty")]
    EmptyCart,
    #[error("The billing details are invalid. {errors}")]
    InvalidBilling { errors: FieldErrors, summary: CartSummary },
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StorefrontDbError> for CheckoutError {
    fn from(e: StorefrontDbError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// Errors from the payment flow. The `Display` text of each variant is what the customer gets to see, so internal
/// details are carried in the variant but kept out of the message.
#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Amount must be greater than zero")]
    InvalidAmount,
    #[error("Receipt (order number) is required")]
    MissingReceipt,
    #[error("{0}")]
    ProviderRejected(String),
    #[error("An internal server error occurred while initiating payment.")]
    GatewayFailure(String),
    #[error("Missing required payment details")]
    MissingPaymentDetails,
    #[error("Payment signature verification failed")]
    InvalidSignature,
    #[error("Order not found or already processed")]
    OrderNotFoundOrProcessed(String),
    #[error("Error finalizing order. Please contact support.")]
    FinalizationFailed(String),
    #[error("Order {0} was not found")]
    OrderNotFound(String),
    #[error("Payment {0} was not found")]
    PaymentNotFound(String),
    #[error("Payment {payment} does not belong to order {order_number}")]
    PaymentMismatch { order_number: String, payment: String },
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StorefrontDbError> for OrderFlowError {
    fn from(e: StorefrontDbError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
