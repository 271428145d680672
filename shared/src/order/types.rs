//! Order record as stored in the document store
//!
//! Monetary fields are snapshots taken when the order was created and are
//! never recomputed from the items by the board.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderStatus, OrderType};
use crate::money::{checked_amount, round};

/// Recipient name that marks an item as shared by the whole table
pub const SHARED_RECIPIENT: &str = "Mesa";

/// Extra attached to a line item (e.g. "bacon extra")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddOn {
    pub name: String,
    /// Price per unit of the parent item
    #[serde(default)]
    pub price: f64,
}

/// Order line item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Sub-order owner within a shared table ticket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_ons: Vec<AddOn>,
}

impl OrderItem {
    /// `quantity × (unit_price + Σ add-on price)`, `None` on out-of-range amounts
    pub fn line_total(&self) -> Option<Decimal> {
        let unit = self
            .add_ons
            .iter()
            .try_fold(checked_amount(self.unit_price)?, |acc, a| {
                acc.checked_add(checked_amount(a.price)?)
            })?;
        unit.checked_mul(Decimal::from(self.quantity)).map(round)
    }

    /// Recipient this item belongs to, `None` for the shared block
    pub fn recipient(&self) -> Option<&str> {
        match self.recipient_name.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(name) if name.eq_ignore_ascii_case(SHARED_RECIPIENT) => None,
            Some(name) => Some(name),
        }
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Delivery address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl Address {
    /// `Rua X, 12 - Apto 3 - Centro - Cidade`
    pub fn one_line(&self) -> String {
        let mut street = self.street.trim().to_string();
        if !self.number.trim().is_empty() {
            street.push_str(", ");
            street.push_str(self.number.trim());
        }

        let parts = [
            Some(street.as_str()),
            self.complement.as_deref(),
            Some(self.neighborhood.as_str()),
            self.city.as_deref(),
        ];

        parts
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" - ")
    }
}

/// Customer block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Present only for delivery orders that are not picked up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

impl Customer {
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

/// Order record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Assigned by the store, immutable
    pub id: String,
    pub establishment_id: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub customer: Customer,
    /// Payment code (`dinheiro`, `pix`, `cartao_credito`, ...)
    #[serde(default)]
    pub payment_method: String,
    /// Cash only: amount the customer will hand over
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_for: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<u32>,
    /// Delivery picked up at the counter
    #[serde(default)]
    pub pickup: bool,
    #[serde(default)]
    pub delivery_fee: f64,
    #[serde(default)]
    pub coupon_discount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    pub subtotal: f64,
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Short reference shown to staff and customers: first 6 chars, upper-cased
    pub fn short_ref(&self) -> String {
        self.id.chars().take(6).collect::<String>().to_uppercase()
    }

    pub fn is_cash(&self) -> bool {
        self.payment_method.eq_ignore_ascii_case("dinheiro")
            || self.payment_method.eq_ignore_ascii_case("cash")
    }

    /// Change the courier must bring, when paying cash with `change_for`
    pub fn change_due(&self) -> Option<Decimal> {
        if !self.is_cash() {
            return None;
        }
        let change_for = checked_amount(self.change_for?)?;
        let due = round(change_for.checked_sub(checked_amount(self.total)?)?);
        (due > Decimal::ZERO).then_some(due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(name: &str, qty: u32, price: f64, recipient: Option<&str>) -> OrderItem {
        OrderItem {
            name: name.to_string(),
            quantity: qty,
            unit_price: price,
            note: None,
            recipient_name: recipient.map(str::to_string),
            add_ons: vec![],
        }
    }

    #[test]
    fn test_line_total_with_add_ons() {
        let mut i = item("X-Burger", 2, 18.5, None);
        i.add_ons.push(AddOn {
            name: "Bacon".into(),
            price: 3.0,
        });
        assert_eq!(i.line_total(), Some(Decimal::new(4300, 2)));
    }

    #[test]
    fn test_line_total_out_of_range() {
        assert_eq!(item("Pizza", 100, 1e27, None).line_total(), None);

        let mut i = item("Pizza", u32::MAX, 1e9, None);
        assert!(i.line_total().is_some());
        i.add_ons.push(AddOn {
            name: "Borda".into(),
            price: f64::MAX,
        });
        assert_eq!(i.line_total(), None);
    }

    #[test]
    fn test_recipient_shared_block() {
        assert_eq!(item("a", 1, 1.0, None).recipient(), None);
        assert_eq!(item("a", 1, 1.0, Some("Mesa")).recipient(), None);
        assert_eq!(item("a", 1, 1.0, Some("  ")).recipient(), None);
        assert_eq!(item("a", 1, 1.0, Some("Ana")).recipient(), Some("Ana"));
    }

    #[test]
    fn test_address_one_line() {
        let addr = Address {
            street: "Rua das Flores".into(),
            number: "120".into(),
            neighborhood: "Centro".into(),
            complement: Some("Apto 3".into()),
            reference: None,
            city: None,
        };
        assert_eq!(addr.one_line(), "Rua das Flores, 120 - Apto 3 - Centro");
    }

    #[test]
    fn test_deserialize_store_document() {
        let json = r#"{
            "id": "abc123xyz",
            "establishmentId": "est-1",
            "type": "delivery",
            "status": "recebido",
            "items": [{"name": "Pizza", "quantity": 1, "unitPrice": 40.0,
                       "addOns": [{"name": "Borda", "price": 5.0}]}],
            "customer": {"name": "João Silva", "phone": "(22) 99982-2324"},
            "paymentMethod": "dinheiro",
            "changeFor": 100.0,
            "deliveryFee": 5.0,
            "subtotal": 45.0,
            "total": 50.0,
            "createdAt": "2026-10-18T12:00:00Z"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.order_type, OrderType::Delivery);
        assert_eq!(order.customer.first_name(), "João");
        assert_eq!(order.short_ref(), "ABC123");
        assert_eq!(order.change_due(), Some(Decimal::new(5000, 2)));
        assert_eq!(order.coupon_discount, 0.0);
        assert!(!order.pickup);
        assert_eq!(
            order.created_at,
            Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
        );
    }
}
