//! Order confirmation emails.
//!
//! The email goes out from an `on_order_completed` hook, after the order has been committed. A failure to send is
//! logged and otherwise ignored: the customer has paid and the order stands either way.
use std::{fmt::Write, sync::Arc};

use chrono::{DateTime, Utc};
use log::*;
use storefront_engine::events::{EventHandlers, EventHooks, OrderCompletedEvent};
use thiserror::Error;

pub const CONFIRMATION_SUBJECT: &str = "Thank you for your order!";
const EVENT_BUFFER_SIZE: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Error)]
pub enum MailError {
    #[error("The recipient address '{0}' was refused")]
    RecipientRefused(String),
    #[error("The mail transport is unavailable. {0}")]
    TransportUnavailable(String),
}

/// Something that can deliver an email. Implementations may block; they are called from a blocking task.
pub trait MailTransport: Send + Sync {
    fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Writes emails to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LoggingMailTransport;

impl MailTransport for LoggingMailTransport {
    fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        info!("📧️ To: {}. Subject: {}", email.to, email.subject);
        debug!("📧️ From: {}\n{}", email.from, email.body);
        Ok(())
    }
}

/// Builds the confirmation email for a completed order.
pub fn confirmation_email(event: &OrderCompletedEvent, from: &str) -> OutgoingEmail {
    let OrderCompletedEvent { order, payment, lines } = event;
    let mut body = String::new();
    let _ = writeln!(body, "Hi {},\n", order.first_name);
    let _ = writeln!(body, "{CONFIRMATION_SUBJECT} Your order number is {}.", order.number());
    let _ = writeln!(body, "Placed on {}.", order_date(order.created_at));
    let _ = writeln!(body, "Payment: {} ({})\n", payment.payment_id, payment.payment_method);
    for line in lines {
        let options = line.variations.iter().map(|v| format!("{}: {}", v.category, v.value)).collect::<Vec<_>>();
        let options = if options.is_empty() { String::new() } else { format!(" ({})", options.join(", ")) };
        let _ = writeln!(
            body,
            "  {}{options} x {} @ {} = {}",
            line.product_name,
            line.quantity,
            line.product_price,
            line.line_total()
        );
    }
    let _ = writeln!(body, "\nSubtotal: {}", order.subtotal);
    let _ = writeln!(body, "Tax: {}", order.tax);
    let _ = writeln!(body, "Total: {}\n", order.order_total);
    let _ = writeln!(
        body,
        "Shipping to: {}, {}, {}, {}, {}",
        order.full_name(),
        order.full_address(),
        order.city,
        order.state,
        order.country
    );
    OutgoingEmail {
        from: from.to_string(),
        to: order.email.clone(),
        subject: CONFIRMATION_SUBJECT.to_string(),
        body,
    }
}

fn order_date(created_at: DateTime<Utc>) -> String {
    created_at.format("%d %B %Y").to_string()
}

pub fn create_notification_event_handlers(transport: Arc<dyn MailTransport>, from: &str) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let from = from.to_string();
    hooks.on_order_completed(move |ev| {
        let email = confirmation_email(&ev, &from);
        let transport = Arc::clone(&transport);
        let order_number = ev.order.number().to_string();
        Box::pin(async move {
            let to = email.to.clone();
            match tokio::task::spawn_blocking(move || transport.send(&email)).await {
                Ok(Ok(())) => info!("📧️ Confirmation email for order {order_number} sent to {to}"),
                Ok(Err(e)) => error!("📧️ Could not send the confirmation email for order {order_number}. {e}"),
                Err(e) => error!("📧️ The mail task for order {order_number} did not complete. {e}"),
            }
        })
    });
    EventHandlers::new(EVENT_BUFFER_SIZE, hooks)
}
