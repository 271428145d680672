use serde::Serialize;
use shared::order::{Order, OrderStatus};

use super::ComposeError;
use super::phone::normalize_phone;
use super::templates;
use crate::core::Config;

/// A ready-to-send customer message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDraft {
    pub order_id: String,
    pub status: OrderStatus,
    /// Normalized, with country code
    pub phone: String,
    pub body: String,
    /// `https://<host>/<phone>?text=<encoded body>`
    pub uri: String,
}

/// Builds customer messages and their hand-off links
///
/// Pure: no store access and no delivery.
#[derive(Debug, Clone)]
pub struct OutboundMessageComposer {
    host: String,
    country_code: String,
}

impl OutboundMessageComposer {
    pub fn new(host: impl Into<String>, country_code: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            country_code: country_code.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.messaging_host, &config.phone_country_code)
    }

    pub fn compose(&self, order: &Order, status: OrderStatus) -> Result<MessageDraft, ComposeError> {
        let raw_phone = order.customer.phone().ok_or(ComposeError::MissingPhone)?;
        let phone = normalize_phone(raw_phone, &self.country_code)?;
        let body = templates::render(order, status)?;
        let uri = self.hand_off_uri(&phone, &body);

        Ok(MessageDraft {
            order_id: order.id.clone(),
            status,
            phone,
            body,
            uri,
        })
    }

    pub fn hand_off_uri(&self, phone: &str, body: &str) -> String {
        format!(
            "https://{}/{}?text={}",
            self.host,
            phone,
            urlencoding::encode(body)
        )
    }
}

impl Default for OutboundMessageComposer {
    fn default() -> Self {
        Self::new("wa.me", "55")
    }
}
