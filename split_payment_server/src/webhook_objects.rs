//! The gateway's webhook envelope and its classification into routable events.

use serde::{Deserialize, Serialize};
use spg_common::Money;

pub const EVENT_LINK_PAID: &str = "payment_link.paid";
pub const EVENT_LINK_CANCELLED: &str = "payment_link.cancelled";
pub const EVENT_LINK_EXPIRED: &str = "payment_link.expired";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub payment_link: Option<EntityWrapper<PaymentLinkEntity>>,
    #[serde(default)]
    pub payment: Option<EntityWrapper<PaymentEntity>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityWrapper<T> {
    pub entity: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLinkEntity {
    pub id: String,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub notes: Notes,
}

/// Free-form metadata attached to the link at creation time. Single-payment links carry the order
/// number in `order_id`; co-payment links carry nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Notes {
    #[serde(default)]
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEntity {
    pub id: String,
}

/// A webhook envelope reduced to what the settlement engine needs.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    LinkPaid { link_id: String, payment_id: Option<String>, order_note: Option<String> },
    LinkCancelled { link_id: String, order_note: Option<String> },
    /// An event kind this server does not act on. Acknowledged so the gateway stops redelivering.
    Ignored { kind: String },
}

impl WebhookEnvelope {
    /// Collapses the envelope into a [`WebhookEvent`]. Cancellation and expiry are the same thing
    /// from the settlement engine's point of view: the link is terminally dead.
    pub fn classify(self) -> WebhookEvent {
        let WebhookEnvelope { event, payload } = self;
        let link = payload.payment_link.map(|w| w.entity);
        let payment_id = payload.payment.map(|w| w.entity.id);
        match (event.as_str(), link) {
            (EVENT_LINK_PAID, Some(link)) => {
                WebhookEvent::LinkPaid { link_id: link.id, payment_id, order_note: link.notes.order_id }
            },
            (EVENT_LINK_CANCELLED | EVENT_LINK_EXPIRED, Some(link)) => {
                WebhookEvent::LinkCancelled { link_id: link.id, order_note: link.notes.order_id }
            },
            _ => WebhookEvent::Ignored { kind: event },
        }
    }
}
