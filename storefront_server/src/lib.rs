//! # Storefront server
//! This crate hosts the HTTP server for the storefront. It is responsible for:
//! * Managing shopping carts for logged-in users and anonymous visitors.
//! * Turning a cart and billing form into a pending order.
//! * Opening Razorpay payment intents, and verifying the signed result of a checkout before the order is committed.
//! * Sending the order confirmation email once an order completes.
//!
//! The business logic lives in `storefront_engine`; this crate only deals with HTTP, identity and configuration.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/cart/...`: Add to, decrement and remove lines from the cart, and view it.
//! * `/checkout/`: The checkout view. Requires a logged-in user.
//! * `/orders/place_order/`: Submits the checkout form.
//! * `/orders/start_payment/` and `/orders/verify_payment/`: The JSON endpoints used by the checkout widget.
//! * `/orders/order_complete/`: The order confirmation view.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod notifications;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
