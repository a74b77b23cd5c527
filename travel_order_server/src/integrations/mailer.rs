//! Email notification of order status changes.
//!
//! The engine fires an [`OrderStatusChangedEvent`] after each status write that lands on
//! `approved` or `canceled`. [`StatusChangeMailer`] renders the message for the order's owner
//! and hands it to a [`MailTransport`]. Delivery is best-effort: the status change has already
//! committed by the time the event arrives, so a transport failure is logged and dropped, and
//! retries are the transport's own business.

use log::*;
use thiserror::Error;
use tos_common::format_display_date;
use travel_order_engine::{
    db_types::OrderStatus,
    events::{NotificationPayload, OrderStatusChangedEvent},
};

/// A rendered notification email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub greeting: String,
    pub lines: Vec<String>,
}

impl MailMessage {
    pub fn render_text(&self) -> String {
        let mut body = String::new();
        body.push_str(&self.greeting);
        body.push_str("\n\n");
        for line in &self.lines {
            body.push_str(line);
            body.push('\n');
        }
        body
    }
}

#[derive(Debug, Clone, Error)]
pub enum MailerError {
    #[error("Could not deliver mail. {0}")]
    DeliveryFailed(String),
}

/// The delivery half of the notifier. Implementations own their retry policy; the mailer never
/// retries.
#[allow(async_fn_in_trait)]
pub trait MailTransport: Clone + Send + Sync + 'static {
    async fn send(&self, mail: MailMessage) -> Result<(), MailerError>;
}

/// Transport that writes deliveries to the log. Stands in wherever no real mail relay is
/// configured (development, tests, CI).
#[derive(Debug, Clone, Default)]
pub struct LogTransport;

impl MailTransport for LogTransport {
    async fn send(&self, mail: MailMessage) -> Result<(), MailerError> {
        info!("📧️ To: {} | {}\n{}", mail.to, mail.subject, mail.render_text());
        Ok(())
    }
}

#[derive(Clone)]
pub struct StatusChangeMailer<T> {
    transport: T,
}

impl<T> StatusChangeMailer<T>
where T: MailTransport
{
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Event hook entry point; wired up in [`crate::server`].
    pub async fn handle(&self, event: OrderStatusChangedEvent) {
        let payload = NotificationPayload::for_order(&event.order);
        debug!("📧️ Dispatching status-change notification: {payload:?}");
        let mail = compose(&event);
        if let Err(e) = self.transport.send(mail).await {
            warn!("📧️ Could not notify {} about order #{}. {e}", event.owner.email, event.order.id);
        }
    }
}

fn compose(event: &OrderStatusChangedEvent) -> MailMessage {
    let order = &event.order;
    let status_message = if order.status == OrderStatus::Approved {
        "Your travel order has been approved"
    } else {
        "Your travel order has been canceled"
    };
    MailMessage {
        to: event.owner.email.clone(),
        subject: format!("Travel Order Status Update: {}", order.status),
        greeting: format!("Hello {}!", event.owner.name),
        lines: vec![
            status_message.to_string(),
            format!("Destination: {}", order.destination),
            format!("Departure Date: {}", format_display_date(order.departure_date)),
            format!("Return Date: {}", format_display_date(order.return_date)),
            "Thank you for using our application!".to_string(),
        ],
    }
}
