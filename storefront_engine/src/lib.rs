//! Storefront Engine
//!
//! This library holds the core logic of the storefront: shopping carts, checkout and the reconciliation of gateway
//! payments into completed orders. It knows nothing about HTTP.
//!
//! The library is divided into two main sections:
//! 1. Database management and control. SQLite is the supported backend. You should never need to access the database
//!    directly; use the public API instead. The exception is the data types, defined in [`mod@db_types`], and the
//!    backend contracts in [`mod@traits`], which a new backend would implement.
//! 2. The public API: [`CartApi`], [`CheckoutApi`] and [`OrderFlowApi`]. Every call takes the acting user or
//!    anonymous session explicitly.
//!
//! The engine also emits events, which you can subscribe to via [`events::EventHooks`]. For example, when a payment
//! is verified and the order committed, an `OrderCompletedEvent` is emitted.
mod db;

pub mod db_types;
pub mod events;
mod sf_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use db::traits;
pub use sf_api::{
    cart_api::CartApi,
    checkout_api::CheckoutApi,
    errors::{CartApiError, CheckoutError, OrderFlowError},
    order_flow_api::OrderFlowApi,
    order_objects,
};
pub use traits::{
    CartManagement,
    CatalogManagement,
    CheckoutDatabase,
    CommittedOrder,
    GatewayError,
    OrderManagement,
    PaymentGateway,
    StorefrontDbError,
};
