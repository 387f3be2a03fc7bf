use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use log::*;
use serde::{Deserialize, Serialize};
pub use sfs_common::Money;
use sqlx::{sqlite::SqliteRow, FromRow, Row, Type};
use thiserror::Error;

//--------------------------------------        Actor          ---------------------------------------------------------
/// The owner of cart and order state for a request.
///
/// Authenticated users are identified by their user id. Everyone else gets an anonymous session token, which is
/// created the first time the visitor touches their cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Actor {
    User(i64),
    Session(String),
}

impl Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::User(id) => write!(f, "user #{id}"),
            // Session tokens are bearer credentials. Only show enough to correlate log lines.
            Actor::Session(s) => write!(f, "session {}…", s.chars().take(6).collect::<String>()),
        }
    }
}

//--------------------------------------       Products        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub price: Money,
    pub stock: i64,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub price: Money,
    pub stock: i64,
}

impl NewProduct {
    pub fn new(name: &str, price: Money, stock: i64) -> Self {
        let slug = name.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-");
        Self { name: name.to_string(), slug, price, stock }
    }
}

/// A selectable product option, such as a colour or a size.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Variation {
    pub id: i64,
    pub product_id: i64,
    pub category: String,
    pub value: String,
    pub is_active: bool,
}

//--------------------------------------        Carts          ---------------------------------------------------------
/// A raw row from the `cart_items` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub user_id: Option<i64>,
    pub session_id: Option<String>,
    pub product_id: i64,
    pub quantity: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An active cart line joined with the product data needed to price it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub price: Money,
    pub stock: i64,
    pub quantity: i64,
    pub variations: Vec<Variation>,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

impl FromRow<'_, SqliteRow> for CartLine {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            product_name: row.try_get("product_name")?,
            price: row.try_get("price")?,
            stock: row.try_get("stock")?,
            quantity: row.try_get("quantity")?,
            variations: Vec::new(),
        })
    }
}

/// The result of decrementing a cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartItemRemoval {
    /// The line had more than one unit, and now has one fewer.
    Decremented(CartItem),
    /// The line had a single unit and has been deleted.
    Deleted,
    /// There is no such line for this actor.
    NotFound,
}

//--------------------------------------     OrderNumber       ---------------------------------------------------------
/// The customer-facing order reference: the 8-digit creation date followed by the order's row id, e.g. `2024061542`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl OrderNumber {
    pub fn new(date: NaiveDate, id: i64) -> Self {
        Self(format!("{}{id}", date.format("%Y%m%d")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderNumber {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() > 8 && s.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(ConversionError(format!("Invalid order number: {s}")))
        }
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------       Orders          ---------------------------------------------------------
/// Billing details captured by the checkout form. Missing fields deserialize as empty strings, and are reported by
/// validation instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingDetails {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub address_line_1: String,
    pub address_line_2: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub order_note: String,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub billing: BillingDetails,
    pub subtotal: Money,
    pub tax: Money,
    pub order_total: Money,
    /// The customer's IP address, if it could be determined
    pub ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    /// Internal id of the linked payment record. Set when the order completes.
    pub payment_id: Option<i64>,
    pub order_number: Option<OrderNumber>,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub address_line_1: String,
    pub address_line_2: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub order_note: String,
    pub subtotal: Money,
    pub tax: Money,
    pub order_total: Money,
    pub ip: String,
    pub is_ordered: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn full_address(&self) -> String {
        [self.address_line_1.as_str(), self.address_line_2.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The order number, or an empty string for the brief window before it is stamped.
    pub fn number(&self) -> &str {
        self.order_number.as_ref().map(|n| n.as_str()).unwrap_or_default()
    }
}

/// A snapshot of a cart line, taken when the order completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub payment_id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub product_price: Money,
    pub ordered: bool,
    pub created_at: DateTime<Utc>,
    pub variations: Vec<Variation>,
}

impl OrderLine {
    pub fn line_total(&self) -> Money {
        self.product_price * self.quantity
    }
}

impl FromRow<'_, SqliteRow> for OrderLine {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            payment_id: row.try_get("payment_id")?,
            user_id: row.try_get("user_id")?,
            product_id: row.try_get("product_id")?,
            product_name: row.try_get("product_name")?,
            quantity: row.try_get("quantity")?,
            product_price: row.try_get("product_price")?,
            ordered: row.try_get("ordered")?,
            created_at: row.try_get("created_at")?,
            variations: Vec::new(),
        })
    }
}

//--------------------------------------      Payments         ---------------------------------------------------------
pub const RAZORPAY_PAYMENT_METHOD: &str = "Razorpay";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// The gateway confirmed the payment and the order has been committed.
    Completed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Completed => write!(f, "Completed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Completed" => Ok(Self::Completed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to Completed");
            PaymentStatus::Completed
        })
    }
}

/// Details of a verified gateway payment, as supplied to the reconciliation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    /// The gateway's payment reference, e.g. `pay_IluGY4qh9gtWvG`
    pub payment_id: String,
    pub payment_method: String,
    pub status: PaymentStatus,
}

impl NewPayment {
    pub fn razorpay(payment_id: &str) -> Self {
        Self {
            payment_id: payment_id.to_string(),
            payment_method: RAZORPAY_PAYMENT_METHOD.to_string(),
            status: PaymentStatus::Completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub user_id: i64,
    pub payment_id: String,
    pub payment_method: String,
    pub amount_paid: Money,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl FromRow<'_, SqliteRow> for Payment {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            payment_id: row.try_get("payment_id")?,
            payment_method: row.try_get("payment_method")?,
            amount_paid: row.try_get("amount_paid")?,
            status: PaymentStatus::from(row.try_get::<String, _>("status")?),
            created_at: row.try_get("created_at")?,
        })
    }
}
