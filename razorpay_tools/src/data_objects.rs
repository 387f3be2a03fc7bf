use serde::{Deserialize, Serialize};
use sfs_common::Money;

/// The body of a `POST /orders` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewRazorpayOrder {
    /// Amount in minor currency units
    pub amount: i64,
    pub currency: String,
    /// Our own order number, echoed back by Razorpay
    pub receipt: String,
    /// "1" asks Razorpay to capture the payment automatically once authorised
    pub payment_capture: String,
}

impl NewRazorpayOrder {
    pub fn new(amount: Money, currency: &str, receipt: &str) -> Self {
        Self {
            amount: amount.value(),
            currency: currency.to_string(),
            receipt: receipt.to_string(),
            payment_capture: "1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    #[serde(default)]
    pub entity: String,
    pub amount: i64,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
    #[serde(default)]
    pub attempts: i64,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RazorpayErrorDetail {
    pub code: String,
    pub description: String,
    pub field: Option<String>,
    pub source: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RazorpayErrorResponse {
    pub error: RazorpayErrorDetail,
}
