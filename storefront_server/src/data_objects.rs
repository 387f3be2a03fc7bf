use serde::{Deserialize, Serialize};
use serde_json::Value;
use storefront_engine::{
    db_types::{CartLine, Money, Order, OrderLine, Payment},
    order_objects::{
        CartSummary,
        CartTotals,
        FieldErrors,
        OrderReceipt,
        PaymentIntentRequest,
        PaymentVerification,
        PlacedOrder,
    },
};

use crate::errors::ServerError;

//--------------------------------------        Cart           ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddToCartParams {
    /// Comma-separated variation ids, e.g. `3,7`
    pub variations: Option<String>,
}

impl AddToCartParams {
    pub fn variation_ids(&self) -> Result<Vec<i64>, ServerError> {
        let Some(list) = self.variations.as_deref() else {
            return Ok(Vec::new());
        };
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>().map_err(|_| ServerError::InvalidRequestBody(format!("Invalid variation id: {s}")))
            })
            .collect()
    }
}

//--------------------------------------      Checkout         ---------------------------------------------------------
/// The checkout form, shown again with its field errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutFormErrors {
    pub errors: FieldErrors,
    pub cart: CartSummary,
}

/// Everything the payment page needs to open the browser checkout widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPage {
    pub order_number: String,
    pub order: Order,
    pub cart_items: Vec<CartLine>,
    pub totals: CartTotals,
    pub razorpay_key_id: String,
    pub currency: String,
    /// The grand total in minor units, as the checkout widget expects it
    pub grand_total_paisa: i64,
}

impl PaymentPage {
    pub fn new(placed: PlacedOrder, razorpay_key_id: &str, currency: &str) -> Self {
        let PlacedOrder { order, summary, amount } = placed;
        Self {
            order_number: order.number().to_string(),
            order,
            cart_items: summary.lines,
            totals: summary.totals,
            razorpay_key_id: razorpay_key_id.to_string(),
            currency: currency.to_string(),
            grand_total_paisa: amount.value(),
        }
    }
}

//--------------------------------------      Payments         ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartPaymentResponse {
    pub order_id: String,
}

/// Reads a start-payment request body. `amount` (minor units) and `receipt` are expected; `currency` falls back to the
/// store default.
///
/// Range checks on the values are left to the payment flow.
pub fn parse_start_payment(body: &[u8], default_currency: &str) -> Result<PaymentIntentRequest, ServerError> {
    let data = serde_json::from_slice::<Value>(body)
        .map_err(|_| ServerError::InvalidRequestBody("Invalid JSON data provided".to_string()))?;
    let amount = data.get("amount").ok_or_else(|| missing_key("amount"))?;
    let amount = json_to_minor_units(amount)
        .ok_or_else(|| ServerError::InvalidRequestBody("Amount must be a whole number of minor units".to_string()))?;
    let currency = data
        .get("currency")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default_currency.to_string());
    let receipt = json_to_text(data.get("receipt"));
    Ok(PaymentIntentRequest { amount, currency, receipt })
}

fn missing_key(key: &str) -> ServerError {
    ServerError::InvalidRequestBody(format!("Missing key: '{key}'"))
}

/// Strings are taken as they are and numbers are written out in decimal. Anything else reads as empty.
fn json_to_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn json_to_minor_units(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Reads the fields posted back by the checkout widget. Each may be a string or a number; a field that is absent or of
/// any other type reads as empty, so an incomplete post gets the "missing details" answer rather than a parse error.
/// The order number is posted as `django_order_number`, with `order_number` accepted as well.
pub fn parse_verify_payment(data: &Value) -> PaymentVerification {
    let order_number = data.get("django_order_number").or_else(|| data.get("order_number"));
    PaymentVerification {
        razorpay_order_id: json_to_text(data.get("razorpay_order_id")),
        razorpay_payment_id: json_to_text(data.get("razorpay_payment_id")),
        razorpay_signature: json_to_text(data.get("razorpay_signature")),
        order_number: json_to_text(order_number),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(rename = "transID", skip_serializing_if = "Option::is_none")]
    pub trans_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyPaymentResponse {
    pub fn completed(order_number: &str, trans_id: &str) -> Self {
        Self {
            success: true,
            order_number: Some(order_number.to_string()),
            trans_id: Some(trans_id.to_string()),
            error: None,
        }
    }

    pub fn failed<S: Into<String>>(error: S) -> Self {
        Self { success: false, error: Some(error.into()), ..Default::default() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderCompleteParams {
    pub order_number: Option<String>,
    pub payment_id: Option<String>,
}

/// The order confirmation page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCompletePage {
    pub order_number: String,
    #[serde(rename = "transID")]
    pub trans_id: String,
    pub order: Order,
    pub ordered_products: Vec<OrderLine>,
    pub payment: Payment,
    pub subtotal: Money,
}

impl From<OrderReceipt> for OrderCompletePage {
    fn from(receipt: OrderReceipt) -> Self {
        let OrderReceipt { order, lines, payment, subtotal } = receipt;
        Self {
            order_number: order.number().to_string(),
            trans_id: payment.payment_id.clone(),
            order,
            ordered_products: lines,
            payment,
            subtotal,
        }
    }
}
