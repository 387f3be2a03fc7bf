//! # Backend contracts
//!
//! This module defines the behaviour that storage backends must expose in order to drive the storefront engine.
//!
//! * [`CatalogManagement`] looks up (and, for seeding and tests, creates) products and their variations.
//! * [`CartManagement`] maintains the per-actor cart lines.
//! * [`OrderManagement`] creates pending orders and reads back orders, order lines and payments.
//! * [`CheckoutDatabase`] performs the reconciliation step that turns a verified payment into a completed order. This
//!   must be a single atomic operation.
//!
//! [`PaymentGateway`] is not a storage contract. It is the seam to the external payment provider.
mod cart_management;
mod catalog_management;
mod checkout_database;
mod errors;
mod order_management;
mod payment_gateway;

pub use cart_management::CartManagement;
pub use catalog_management::CatalogManagement;
pub use checkout_database::{CheckoutDatabase, CommittedOrder};
pub use errors::StorefrontDbError;
pub use order_management::OrderManagement;
pub use payment_gateway::{GatewayError, PaymentGateway};
