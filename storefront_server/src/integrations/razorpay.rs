//! Adapts the Razorpay REST client to the engine's [`PaymentGateway`] contract.
use log::*;
use razorpay_tools::{NewRazorpayOrder, RazorpayApi, RazorpayApiError, RazorpayConfig};
use storefront_engine::{db_types::Money, GatewayError, PaymentGateway};

#[derive(Clone)]
pub struct RazorpayGateway {
    api: RazorpayApi,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Result<Self, RazorpayApiError> {
        let api = RazorpayApi::new(config)?;
        Ok(Self { api })
    }
}

/// Razorpay's own refusals carry a description that is safe to show the customer. Anything else is an outage.
pub fn to_gateway_error(e: RazorpayApiError) -> GatewayError {
    match e {
        RazorpayApiError::BadRequest(description) => GatewayError::Rejected(description),
        e => GatewayError::Unavailable(e.to_string()),
    }
}

impl PaymentGateway for RazorpayGateway {
    fn key_id(&self) -> String {
        self.api.key_id().to_string()
    }

    async fn create_payment_intent(&self, amount: Money, currency: &str, receipt: &str) -> Result<String, GatewayError> {
        let request = NewRazorpayOrder::new(amount, currency, receipt);
        let order = self.api.create_order(&request).await.map_err(to_gateway_error)?;
        trace!("💳️ Razorpay order {} is in state '{}'", order.id, order.status);
        Ok(order.id)
    }

    fn verify_payment_signature(&self, gateway_order_id: &str, gateway_payment_id: &str, signature: &str) -> bool {
        self.api.verify_payment_signature(gateway_order_id, gateway_payment_id, signature)
    }
}
