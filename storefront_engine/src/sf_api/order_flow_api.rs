use std::{fmt::Debug, str::FromStr};

use log::*;

use crate::{
    db_types::{Money, NewPayment, OrderNumber},
    events::{EventProducers, OrderCompletedEvent},
    order_objects::{OrderReceipt, PaymentIntentRequest, PaymentVerification},
    sf_api::errors::OrderFlowError,
    traits::{CheckoutDatabase, CommittedOrder, GatewayError, PaymentGateway, StorefrontDbError},
};

/// `OrderFlowApi` drives an order from payment intent, through signature verification, to a committed order.
///
/// The reconciliation step itself is delegated to [`CheckoutDatabase::commit_paid_order`], which is atomic. This API
/// adds the checks that must pass before funds are considered received, and notifies `on_order_completed`
/// subscribers once the commit has succeeded.
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<B, G> OrderFlowApi<B, G>
where G: PaymentGateway
{
    /// Opens a payment intent with the gateway and returns the gateway's order id for it.
    ///
    /// Nothing is stored. Each call creates a new intent, so callers should not retry blindly.
    pub async fn start_payment(&self, request: PaymentIntentRequest) -> Result<String, OrderFlowError> {
        let PaymentIntentRequest { amount, currency, receipt } = request;
        if amount <= 0 {
            return Err(OrderFlowError::InvalidAmount);
        }
        let receipt = receipt.trim();
        if receipt.is_empty() {
            return Err(OrderFlowError::MissingReceipt);
        }
        let amount = Money::from(amount);
        let id = self.gateway.create_payment_intent(amount, &currency, receipt).await.map_err(|e| match e {
            GatewayError::Rejected(msg) => {
                warn!("💳️ Gateway rejected payment intent for receipt {receipt}. {msg}");
                OrderFlowError::ProviderRejected(msg)
            },
            GatewayError::Unavailable(msg) => {
                error!("💳️ Could not create payment intent for receipt {receipt}. {msg}");
                OrderFlowError::GatewayFailure(msg)
            },
        })?;
        info!("💳️ Payment intent {id} created for receipt {receipt} ({amount} {currency})");
        Ok(id)
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: CheckoutDatabase,
    G: PaymentGateway,
{
    /// Verifies a completed gateway checkout and commits the order.
    ///
    /// The signature check is the only gate before the payment is accepted, so nothing is written unless it passes.
    /// A second submission for the same order, whether sequential or concurrent, fails with
    /// [`OrderFlowError::OrderNotFoundOrProcessed`] and changes nothing.
    pub async fn verify_payment(
        &self,
        user_id: i64,
        verification: PaymentVerification,
    ) -> Result<CommittedOrder, OrderFlowError> {
        if !verification.is_complete() {
            return Err(OrderFlowError::MissingPaymentDetails);
        }
        let PaymentVerification { razorpay_order_id, razorpay_payment_id, razorpay_signature, order_number } =
            verification;
        if !self.gateway.verify_payment_signature(&razorpay_order_id, &razorpay_payment_id, &razorpay_signature) {
            warn!(
                "🔄️ Signature check failed for payment {razorpay_payment_id} (gateway order {razorpay_order_id}), \
                 order {order_number}, user #{user_id}"
            );
            return Err(OrderFlowError::InvalidSignature);
        }
        let order_number = OrderNumber::from_str(&order_number).map_err(|e| {
            debug!("🔄️ {e}");
            OrderFlowError::OrderNotFoundOrProcessed(order_number.clone())
        })?;
        let payment = NewPayment::razorpay(&razorpay_payment_id);
        let committed = self.db.commit_paid_order(user_id, &order_number, payment).await.map_err(|e| match e {
            StorefrontDbError::OrderNotFound(n) => {
                info!("🔄️ Order {n} for user #{user_id} is unknown or has already been paid");
                OrderFlowError::OrderNotFoundOrProcessed(n.as_str().to_string())
            },
            StorefrontDbError::PaymentAlreadyExists(p) => {
                warn!("🔄️ Payment {p} has already been used for another order. Refusing to apply it to {order_number}");
                OrderFlowError::OrderNotFoundOrProcessed(order_number.as_str().to_string())
            },
            e => {
                error!(
                    "🔄️ Could not finalise order {order_number} after verifying payment {razorpay_payment_id}. The \
                     customer has paid, and the order is still pending. {e}"
                );
                OrderFlowError::FinalizationFailed(e.to_string())
            },
        })?;
        info!(
            "🔄️ Order {order_number} completed for user #{user_id} with payment {}. {} lines",
            committed.payment.payment_id,
            committed.lines.len()
        );
        self.call_order_completed_hook(&committed).await;
        Ok(committed)
    }

    async fn call_order_completed_hook(&self, committed: &CommittedOrder) {
        for emitter in &self.producers.order_completed_producer {
            debug!("🔄️ Notifying order completed hook subscribers");
            emitter.publish_event(OrderCompletedEvent::from(committed.clone())).await;
        }
    }
}

impl<B, G> OrderFlowApi<B, G>
where B: CheckoutDatabase
{
    /// Fetches a completed order for its confirmation page.
    ///
    /// The order must belong to the user and be ordered, and the payment must be the one linked to it.
    pub async fn order_receipt(
        &self,
        user_id: i64,
        order_number: &str,
        payment_ref: &str,
    ) -> Result<OrderReceipt, OrderFlowError> {
        let number =
            OrderNumber::from_str(order_number).map_err(|_| OrderFlowError::OrderNotFound(order_number.to_string()))?;
        let order = self
            .db
            .fetch_order_by_number(user_id, &number)
            .await?
            .filter(|o| o.is_ordered)
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_number.to_string()))?;
        let payment = self
            .db
            .fetch_payment(user_id, payment_ref)
            .await?
            .ok_or_else(|| OrderFlowError::PaymentNotFound(payment_ref.to_string()))?;
        if order.payment_id != Some(payment.id) {
            return Err(OrderFlowError::PaymentMismatch {
                order_number: order_number.to_string(),
                payment: payment_ref.to_string(),
            });
        }
        let lines = self.db.fetch_order_lines(order.id).await?;
        let subtotal = lines.iter().map(|l| l.line_total()).sum::<Money>();
        Ok(OrderReceipt { order, lines, payment, subtotal })
    }
}
