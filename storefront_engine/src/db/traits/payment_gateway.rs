use thiserror::Error;

use crate::db_types::Money;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The provider refused the request. The message is the provider's own description and is safe to show users.
    #[error("{0}")]
    Rejected(String),
    #[error("Payment gateway unavailable. {0}")]
    Unavailable(String),
}

/// The external payment provider.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// The public key id the browser checkout widget needs.
    fn key_id(&self) -> String;

    /// Creates a payment intent for `amount` (in minor units) and returns the provider's id for it.
    async fn create_payment_intent(&self, amount: Money, currency: &str, receipt: &str)
        -> Result<String, GatewayError>;

    /// Checks the signature the provider attached to a completed checkout.
    fn verify_payment_signature(&self, gateway_order_id: &str, gateway_payment_id: &str, signature: &str) -> bool;
}
