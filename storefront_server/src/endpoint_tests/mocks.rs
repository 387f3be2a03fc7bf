use mockall::mock;
use storefront_engine::{db_types::Money, GatewayError, PaymentGateway};

mock! {
    pub PaymentGateway {}
    impl PaymentGateway for PaymentGateway {
        fn key_id(&self) -> String;
        async fn create_payment_intent(&self, amount: Money, currency: &str, receipt: &str) -> Result<String, GatewayError>;
        fn verify_payment_signature(&self, gateway_order_id: &str, gateway_payment_id: &str, signature: &str) -> bool;
    }
}

pub const GOOD_SIGNATURE: &str = "valid-signature";

/// A gateway that accepts [`GOOD_SIGNATURE`] and opens intents named after the receipt and amount.
pub fn accepting_gateway() -> MockPaymentGateway {
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_key_id().returning(|| "rzp_test_key".to_string());
    gateway
        .expect_create_payment_intent()
        .returning(|amount: Money, _currency: &str, receipt: &str| Ok(format!("order_{receipt}_{}", amount.value())));
    gateway
        .expect_verify_payment_signature()
        .returning(|_order_id: &str, _payment_id: &str, signature: &str| signature == GOOD_SIGNATURE);
    gateway
}

pub fn failing_gateway(error: GatewayError) -> MockPaymentGateway {
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_create_payment_intent().returning(move |_: Money, _: &str, _: &str| Err(error.clone()));
    gateway
}
