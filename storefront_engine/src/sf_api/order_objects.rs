use std::{collections::BTreeMap, fmt::Display};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::db_types::{BillingDetails, CartLine, Money, Order, OrderLine, Payment};

//--------------------------------------      CartTotals       ---------------------------------------------------------
/// Running totals over a set of cart lines. All amounts are in minor currency units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of price x quantity over the lines
    pub total: Money,
    /// Total number of units
    pub quantity: i64,
    pub tax: Money,
    pub grand_total: Money,
}

impl CartTotals {
    pub fn from_lines(lines: &[CartLine]) -> Self {
        let total = lines.iter().map(|l| l.line_total()).sum::<Money>();
        let quantity = lines.iter().map(|l| l.quantity).sum::<i64>();
        let tax = total.tax();
        Self { total, quantity, tax, grand_total: total + tax }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

impl CartSummary {
    pub fn new(lines: Vec<CartLine>) -> Self {
        let totals = CartTotals::from_lines(&lines);
        Self { lines, totals }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

//--------------------------------------     FieldErrors       ---------------------------------------------------------
/// Validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(|v| v.as_slice())
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msgs = self.0.iter().map(|(field, errs)| format!("{field}: {}", errs.join(" "))).collect::<Vec<_>>();
        write!(f, "{}", msgs.join("; "))
    }
}

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

// (field, max length, required)
const BILLING_FIELD_RULES: [(&str, usize, bool); 10] = [
    ("first_name", 50, true),
    ("last_name", 50, true),
    ("phone", 15, true),
    ("email", 50, true),
    ("address_line_1", 50, true),
    ("address_line_2", 50, false),
    ("country", 50, true),
    ("state", 50, true),
    ("city", 50, true),
    ("order_note", 100, false),
];

impl BillingDetails {
    fn field(&self, name: &str) -> &str {
        match name {
            "first_name" => &self.first_name,
            "last_name" => &self.last_name,
            "phone" => &self.phone,
            "email" => &self.email,
            "address_line_1" => &self.address_line_1,
            "address_line_2" => &self.address_line_2,
            "country" => &self.country,
            "state" => &self.state,
            "city" => &self.city,
            "order_note" => &self.order_note,
            _ => "",
        }
    }

    /// Returns a copy with surrounding whitespace removed from every field.
    pub fn trimmed(&self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            address_line_1: self.address_line_1.trim().to_string(),
            address_line_2: self.address_line_2.trim().to_string(),
            country: self.country.trim().to_string(),
            state: self.state.trim().to_string(),
            city: self.city.trim().to_string(),
            order_note: self.order_note.trim().to_string(),
        }
    }

    /// Checks the checkout form fields. Every problem is reported, not just the first.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        for (name, max_len, required) in BILLING_FIELD_RULES {
            let value = self.field(name).trim();
            if required && value.is_empty() {
                errors.add(name, "This field is required.");
            } else if value.chars().count() > max_len {
                errors.add(name, format!("Ensure this value has at most {max_len} characters."));
            }
        }
        let email = self.email.trim();
        if !email.is_empty() && !is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn is_valid_email(email: &str) -> bool {
    Regex::new(EMAIL_PATTERN).map(|re| re.is_match(email)).unwrap_or(false)
}

//--------------------------------------   Checkout results    ---------------------------------------------------------
/// A freshly placed, unpaid order, along with everything the payment page needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub summary: CartSummary,
    /// The amount to charge through the gateway, in minor units. This is the order's stored grand total.
    pub amount: Money,
}

/// A request to open a payment intent with the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    /// Amount in minor currency units
    pub amount: i64,
    pub currency: String,
    /// The internal order number the intent is for
    pub receipt: String,
}

/// The fields the browser checkout widget posts back after the customer has paid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    /// The internal order number. The checkout page posts this as `django_order_number`.
    #[serde(alias = "django_order_number")]
    pub order_number: String,
}

impl PaymentVerification {
    pub fn is_complete(&self) -> bool {
        [&self.razorpay_order_id, &self.razorpay_payment_id, &self.razorpay_signature, &self.order_number]
            .iter()
            .all(|s| !s.trim().is_empty())
    }
}

/// Everything the order confirmation page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub payment: Payment,
    /// Sum of the line totals, at the prices the lines were snapshotted at
    pub subtotal: Money,
}
