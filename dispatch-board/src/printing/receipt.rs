//! Receipt document
//!
//! [`ReceiptRenderer::render`] is a pure function of the order and the
//! establishment. Everything is pre-formatted as text; fitting it to
//! the paper width happens in [`super::layout`].

use chrono_tz::Tz;
use serde::Serialize;
use shared::Establishment;
use rust_decimal::Decimal;
use shared::money::{AMOUNT_UNAVAILABLE, format_brl, format_brl_f64, receipt_total, to_decimal};
use shared::order::{Order, OrderItem, OrderType, SHARED_RECIPIENT, payment_label};

use crate::utils::time::format_local;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptHeader {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Customer block, delivery and pickup only
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBlock {
    pub name: String,
    pub phone: Option<String>,
    /// Formatted address, or the pickup notice
    pub address: String,
    pub payment: String,
    /// Cash only: amount to bring and change due
    pub change: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    /// `2x X-Burger`
    pub description: String,
    pub amount: String,
    pub note: Option<String>,
    pub add_ons: Option<String>,
}

/// Items of one recipient; delivery receipts have a single unlabeled block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBlock {
    pub label: Option<String>,
    pub lines: Vec<ReceiptLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalLine {
    pub label: String,
    pub amount: String,
    /// Rendered emphasised (grand total)
    pub emphasis: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDocument {
    pub order_id: String,
    pub header: ReceiptHeader,
    pub reference: String,
    pub timestamp: String,
    pub table: Option<String>,
    pub customer: Option<CustomerBlock>,
    pub blocks: Vec<ItemBlock>,
    pub totals: Vec<TotalLine>,
}

impl ReceiptDocument {
    /// Grand total line
    pub fn total(&self) -> Option<&TotalLine> {
        self.totals.iter().find(|t| t.emphasis)
    }
}

/// Builds [`ReceiptDocument`]s
#[derive(Debug, Clone)]
pub struct ReceiptRenderer {
    timezone: Tz,
}

impl ReceiptRenderer {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn render(&self, order: &Order, establishment: &Establishment) -> ReceiptDocument {
        ReceiptDocument {
            order_id: order.id.clone(),
            header: ReceiptHeader {
                name: establishment.name.clone(),
                address: Some(establishment.address.trim().to_string()).filter(|a| !a.is_empty()),
                phone: establishment.phone.clone(),
            },
            reference: format!("Pedido #{}", order.short_ref()),
            timestamp: format_local(order.created_at, self.timezone),
            table: match (order.order_type, order.table_number) {
                (OrderType::Table, Some(n)) => Some(format!("Mesa {}", n)),
                _ => None,
            },
            customer: customer_block(order),
            blocks: item_blocks(order),
            totals: totals(order),
        }
    }
}

impl Default for ReceiptRenderer {
    fn default() -> Self {
        Self::new(chrono_tz::America::Sao_Paulo)
    }
}

fn customer_block(order: &Order) -> Option<CustomerBlock> {
    if order.order_type != OrderType::Delivery {
        return None;
    }

    let address = if order.pickup {
        "Retirada no balcão".to_string()
    } else {
        order
            .customer
            .address
            .as_ref()
            .map(|a| a.one_line())
            .unwrap_or_else(|| "Endereço não informado".to_string())
    };

    let change = order.is_cash().then(|| match order.change_for.zip(order.change_due()) {
        Some((change_for, due)) => format!(
            "Troco para {} (levar {})",
            format_brl_f64(change_for),
            format_brl(due)
        ),
        None => "Sem troco".to_string(),
    });

    Some(CustomerBlock {
        name: order.customer.name.trim().to_string(),
        phone: order.customer.phone().map(str::to_string),
        address,
        payment: payment_label(&order.payment_method),
        change,
    })
}

fn receipt_line(item: &OrderItem) -> ReceiptLine {
    let add_ons = (!item.add_ons.is_empty()).then(|| {
        item.add_ons
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    });
    ReceiptLine {
        description: format!("{}x {}", item.quantity, item.name.trim()),
        amount: format_amount(item.line_total()),
        note: item.note().map(str::to_string),
        add_ons,
    }
}

/// Table orders: one block per recipient in first-appearance order, shared
/// items under "Mesa". Delivery orders: one flat block.
fn item_blocks(order: &Order) -> Vec<ItemBlock> {
    if order.order_type == OrderType::Delivery {
        return vec![ItemBlock {
            label: None,
            lines: order.items.iter().map(receipt_line).collect(),
        }];
    }

    let mut blocks: Vec<ItemBlock> = Vec::new();
    for item in &order.items {
        let label = item.recipient().unwrap_or(SHARED_RECIPIENT);
        match blocks.iter_mut().find(|b| b.label.as_deref() == Some(label)) {
            Some(block) => block.lines.push(receipt_line(item)),
            None => blocks.push(ItemBlock {
                label: Some(label.to_string()),
                lines: vec![receipt_line(item)],
            }),
        }
    }
    blocks
}

fn format_amount(amount: Option<Decimal>) -> String {
    amount
        .map(format_brl)
        .unwrap_or_else(|| AMOUNT_UNAVAILABLE.to_string())
}

fn totals(order: &Order) -> Vec<TotalLine> {
    let line = |label: String, amount: String| TotalLine {
        label,
        amount,
        emphasis: false,
    };

    let mut totals = vec![line("Subtotal".into(), format_brl_f64(order.subtotal))];
    if to_decimal(order.delivery_fee) > Decimal::ZERO {
        totals.push(line("Taxa de entrega".into(), format_brl_f64(order.delivery_fee)));
    }
    if to_decimal(order.coupon_discount) > Decimal::ZERO {
        let label = match order.coupon_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => format!("Desconto ({})", code),
            _ => "Desconto".to_string(),
        };
        totals.push(line(label, format_brl_f64(-order.coupon_discount)));
    }
    totals.push(TotalLine {
        label: "TOTAL".into(),
        amount: format_amount(receipt_total(
            order.subtotal,
            order.delivery_fee,
            order.coupon_discount,
        )),
        emphasis: true,
    });
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use shared::order::{AddOn, Address, Customer, OrderStatus};

    fn item(name: &str, price: f64, recipient: Option<&str>) -> OrderItem {
        OrderItem {
            name: name.into(),
            quantity: 1,
            unit_price: price,
            note: None,
            recipient_name: recipient.map(str::to_string),
            add_ons: vec![],
        }
    }

    fn order(order_type: OrderType, items: Vec<OrderItem>) -> Order {
        Order {
            id: "9f8e7d6c5b".into(),
            establishment_id: "est-1".into(),
            order_type,
            status: OrderStatus::Preparo,
            items,
            customer: Customer {
                name: "Ana Lima".into(),
                phone: Some("(22) 99982-2324".into()),
                address: Some(Address {
                    street: "Rua das Flores".into(),
                    number: "120".into(),
                    neighborhood: "Centro".into(),
                    complement: None,
                    reference: None,
                    city: None,
                }),
            },
            payment_method: "pix".into(),
            change_for: None,
            table_number: (order_type == OrderType::Table).then_some(12),
            pickup: false,
            delivery_fee: 0.0,
            coupon_discount: 0.0,
            coupon_code: None,
            subtotal: 30.0,
            total: 30.0,
            created_at: Utc.with_ymd_and_hms(2026, 10, 18, 22, 30, 0).unwrap(),
        }
    }

    fn establishment() -> Establishment {
        Establishment {
            id: "est-1".into(),
            name: "Cantina da Praça".into(),
            address: "Praça Central, 10".into(),
            phone: Some("(22) 2522-0000".into()),
        }
    }

    #[test]
    fn test_table_groups_by_recipient() {
        let o = order(
            OrderType::Table,
            vec![item("Suco", 10.0, Some("Ana")), item("Porção", 20.0, Some("Mesa"))],
        );
        let doc = ReceiptRenderer::default().render(&o, &establishment());
        assert_eq!(doc.blocks.len(), 2);
        assert_eq!(doc.blocks[0].label.as_deref(), Some("Ana"));
        assert_eq!(doc.blocks[1].label.as_deref(), Some("Mesa"));
        assert_eq!(doc.table.as_deref(), Some("Mesa 12"));
        assert!(doc.customer.is_none());
    }

    #[test]
    fn test_delivery_is_one_flat_block() {
        let o = order(
            OrderType::Delivery,
            vec![item("Suco", 10.0, Some("Ana")), item("Porção", 20.0, Some("Mesa"))],
        );
        let doc = ReceiptRenderer::default().render(&o, &establishment());
        assert_eq!(doc.blocks.len(), 1);
        assert!(doc.blocks[0].label.is_none());
        assert_eq!(doc.blocks[0].lines.len(), 2);

        let customer = doc.customer.unwrap();
        assert_eq!(customer.address, "Rua das Flores, 120 - Centro");
        assert_eq!(customer.payment, "Pix");
        assert!(customer.change.is_none());
    }

    #[test]
    fn test_empty_and_shared_recipients_merge() {
        let o = order(
            OrderType::Table,
            vec![
                item("Água", 5.0, None),
                item("Café", 6.0, Some("Bruno")),
                item("Pão", 4.0, Some("mesa")),
                item("Bolo", 9.0, Some("Bruno")),
            ],
        );
        let doc = ReceiptRenderer::default().render(&o, &establishment());
        let labels: Vec<_> = doc.blocks.iter().map(|b| b.label.clone().unwrap()).collect();
        assert_eq!(labels, vec!["Mesa", "Bruno"]);
        assert_eq!(doc.blocks[0].lines.len(), 2);
        assert_eq!(doc.blocks[1].lines.len(), 2);
    }

    #[test]
    fn test_total_uses_snapshot_fields() {
        let mut o = order(OrderType::Delivery, vec![item("Pizza", 999.0, None)]);
        o.subtotal = 50.0;
        o.delivery_fee = 7.5;
        o.coupon_discount = 10.0;
        o.coupon_code = Some("PROMO10".into());
        o.total = 1.0;

        let doc = ReceiptRenderer::default().render(&o, &establishment());
        let labels: Vec<_> = doc.totals.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["Subtotal", "Taxa de entrega", "Desconto (PROMO10)", "TOTAL"]);
        assert_eq!(doc.total().unwrap().amount, "R$ 47,50");
        assert_eq!(doc.totals[2].amount, "-R$ 10,00");
    }

    #[test]
    fn test_zero_fee_and_discount_are_omitted() {
        let o = order(OrderType::Table, vec![item("Suco", 10.0, None)]);
        let doc = ReceiptRenderer::default().render(&o, &establishment());
        let labels: Vec<_> = doc.totals.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["Subtotal", "TOTAL"]);
    }

    #[test]
    fn test_cash_change_line_and_pickup() {
        let mut o = order(OrderType::Delivery, vec![item("Pizza", 42.0, None)]);
        o.payment_method = "dinheiro".into();
        o.change_for = Some(50.0);
        o.total = 42.0;
        o.pickup = true;

        let customer = ReceiptRenderer::default()
            .render(&o, &establishment())
            .customer
            .unwrap();
        assert_eq!(customer.address, "Retirada no balcão");
        assert_eq!(customer.change.as_deref(), Some("Troco para R$ 50,00 (levar R$ 8,00)"));
    }

    #[test]
    fn test_line_details() {
        let mut it = item("X-Salada", 20.0, None);
        it.quantity = 2;
        it.note = Some("sem cebola".into());
        it.add_ons = vec![
            AddOn { name: "Bacon".into(), price: 4.0 },
            AddOn { name: "Ovo".into(), price: 2.0 },
        ];
        let o = order(OrderType::Delivery, vec![it]);
        let doc = ReceiptRenderer::default().render(&o, &establishment());
        let line = &doc.blocks[0].lines[0];
        assert_eq!(line.description, "2x X-Salada");
        assert_eq!(line.amount, "R$ 52,00");
        assert_eq!(line.note.as_deref(), Some("sem cebola"));
        assert_eq!(line.add_ons.as_deref(), Some("Bacon, Ovo"));
    }

    #[test]
    fn test_reference_and_local_timestamp() {
        let o = order(OrderType::Table, vec![]);
        let doc = ReceiptRenderer::default().render(&o, &establishment());
        assert_eq!(doc.reference, "Pedido #9F8E7D");
        assert_eq!(doc.timestamp, "18/10/2026 19:30");
    }

    #[test]
    fn test_render_does_not_mutate_order() {
        let o = order(OrderType::Table, vec![item("Suco", 10.0, Some("Ana"))]);
        let before = o.clone();
        ReceiptRenderer::default().render(&o, &establishment());
        assert_eq!(o, before);
    }

    #[test]
    fn test_huge_amounts_render_placeholders() {
        let mut it = item("Pizza", 1e27, None);
        it.quantity = 100;
        let mut o = order(OrderType::Delivery, vec![it, item("Suco", 10.0, None)]);
        o.subtotal = 1e27;

        let doc = ReceiptRenderer::default().render(&o, &establishment());
        assert_eq!(doc.blocks[0].lines[0].amount, AMOUNT_UNAVAILABLE);
        assert_eq!(doc.blocks[0].lines[1].amount, "R$ 10,00");
        assert_eq!(doc.totals[0].amount, AMOUNT_UNAVAILABLE);
        assert_eq!(doc.total().unwrap().amount, AMOUNT_UNAVAILABLE);

        let text = super::super::ReceiptLayout::new(48).to_text(&doc);
        assert!(text.contains(AMOUNT_UNAVAILABLE));
    }
}
