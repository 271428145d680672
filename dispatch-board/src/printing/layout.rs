//! Fits a [`ReceiptDocument`] to the paper width
//!
//! The document is first flattened into physical lines no wider than
//! the paper, then written either as ESC/POS bytes or as plain text.

use ticket_printer::{Align, EscPosBuilder, pad_text, text_width, wrap_text};

use super::receipt::{ItemBlock, ReceiptDocument};

#[derive(Debug, Clone, PartialEq)]
enum Line {
    Text {
        text: String,
        align: Align,
        bold: bool,
        large: bool,
    },
    Sep(char),
    Blank,
}

impl Line {
    fn plain(text: impl Into<String>) -> Self {
        Line::Text {
            text: text.into(),
            align: Align::Left,
            bold: false,
            large: false,
        }
    }

    fn bold(text: impl Into<String>) -> Self {
        Line::Text {
            text: text.into(),
            align: Align::Left,
            bold: true,
            large: false,
        }
    }

    fn centered(text: impl Into<String>) -> Self {
        Line::Text {
            text: text.into(),
            align: Align::Center,
            bold: false,
            large: false,
        }
    }
}

/// Receipt layout for a given paper width (in columns)
#[derive(Debug, Clone, Copy)]
pub struct ReceiptLayout {
    width: usize,
}

impl ReceiptLayout {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// ESC/POS bytes, WPC1252-encoded, ending with a cut
    pub fn to_escpos(&self, doc: &ReceiptDocument) -> Vec<u8> {
        let mut b = EscPosBuilder::new(self.width);
        for line in self.lines(doc) {
            match line {
                Line::Text {
                    text,
                    align,
                    bold,
                    large,
                } => {
                    b.align(align).bold(bold);
                    if large {
                        b.double_size();
                    }
                    b.line(&text);
                    if large {
                        b.reset_size();
                    }
                    if bold {
                        b.bold(false);
                    }
                }
                Line::Sep(c) => {
                    b.align(Align::Left).sep(c);
                }
                Line::Blank => {
                    b.newline();
                }
            }
        }
        b.cut_feed(4);
        b.build()
    }

    /// Plain text preview; every line is at most `width` columns
    pub fn to_text(&self, doc: &ReceiptDocument) -> String {
        let mut out = String::new();
        for line in self.lines(doc) {
            let text = match line {
                Line::Text { text, align, .. } => match align {
                    Align::Center => {
                        let pad = self.width.saturating_sub(text_width(&text)) / 2;
                        format!("{}{}", " ".repeat(pad), text)
                    }
                    Align::Right => pad_text(&text, self.width, true),
                    Align::Left => text,
                },
                Line::Sep(c) => std::iter::repeat_n(c, self.width).collect(),
                Line::Blank => String::new(),
            };
            out.push_str(text.trim_end());
            out.push('\n');
        }
        out
    }

    fn lines(&self, doc: &ReceiptDocument) -> Vec<Line> {
        let mut lines = Vec::new();

        // Header; double size halves the columns
        for text in wrap_text(&doc.header.name, self.width / 2) {
            lines.push(Line::Text {
                text,
                align: Align::Center,
                bold: true,
                large: true,
            });
        }
        for extra in [&doc.header.address, &doc.header.phone].into_iter().flatten() {
            lines.extend(wrap_text(extra, self.width).into_iter().map(Line::centered));
        }
        lines.push(Line::Sep('='));

        lines.extend(self.pair(&doc.reference, &doc.timestamp, true));
        if let Some(table) = &doc.table {
            lines.push(Line::bold(table.clone()));
        }

        if let Some(customer) = &doc.customer {
            lines.push(Line::Sep('-'));
            lines.extend(self.wrapped(&format!("Cliente: {}", customer.name), "", true));
            if let Some(phone) = &customer.phone {
                lines.extend(self.wrapped(&format!("Tel: {}", phone), "", false));
            }
            lines.extend(self.wrapped(&customer.address, "", false));
            lines.extend(self.wrapped(&format!("Pagamento: {}", customer.payment), "", false));
            if let Some(change) = &customer.change {
                lines.extend(self.wrapped(change, "", true));
            }
        }

        lines.push(Line::Sep('-'));
        for block in &doc.blocks {
            self.block(&mut lines, block);
        }

        lines.push(Line::Sep('-'));
        for total in &doc.totals {
            lines.extend(self.pair(&total.label, &total.amount, total.emphasis));
        }
        lines.push(Line::Blank);
        lines.push(Line::centered("Obrigado pela preferência!"));
        lines
    }

    fn block(&self, lines: &mut Vec<Line>, block: &ItemBlock) {
        if let Some(label) = &block.label {
            lines.push(Line::bold(format!("[{}]", label)));
        }
        for item in &block.lines {
            lines.extend(self.pair(&item.description, &item.amount, false));
            if let Some(add_ons) = &item.add_ons {
                lines.extend(self.wrapped(&format!("+ {}", add_ons), "   ", false));
            }
            if let Some(note) = &item.note {
                lines.extend(self.wrapped(&format!("Obs: {}", note), "   ", true));
            }
        }
        if block.label.is_some() {
            lines.push(Line::Blank);
        }
    }

    /// `left ......... right`; long left text wraps and the amount stays
    /// on the first line
    fn pair(&self, left: &str, right: &str, bold: bool) -> Vec<Line> {
        let right_w = text_width(right);
        let left_w = self.width.saturating_sub(right_w + 1).max(1);
        let mut wrapped = wrap_text(left, left_w).into_iter();
        let first = wrapped.next().unwrap_or_default();

        let mut out = vec![Line::Text {
            text: format!("{} {}", pad_text(&first, left_w, false), right),
            align: Align::Left,
            bold,
            large: false,
        }];
        out.extend(wrapped.map(|rest| Line::Text {
            text: rest,
            align: Align::Left,
            bold,
            large: false,
        }));
        out
    }

    fn wrapped(&self, text: &str, indent: &str, bold: bool) -> Vec<Line> {
        let avail = self.width.saturating_sub(text_width(indent)).max(1);
        wrap_text(text, avail)
            .into_iter()
            .map(|l| {
                let text = format!("{}{}", indent, l);
                if bold { Line::bold(text) } else { Line::plain(text) }
            })
            .collect()
    }
}

impl Default for ReceiptLayout {
    fn default() -> Self {
        Self::new(48)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printing::receipt::ReceiptRenderer;
    use chrono::Utc;
    use shared::Establishment;
    use shared::order::{Customer, Order, OrderItem, OrderStatus, OrderType};

    fn doc(order_type: OrderType) -> ReceiptDocument {
        let order = Order {
            id: "abcdef123".into(),
            establishment_id: "est-1".into(),
            order_type,
            status: OrderStatus::Recebido,
            items: vec![
                OrderItem {
                    name: "Pizza grande meia calabresa meia quatro queijos com borda recheada".into(),
                    quantity: 1,
                    unit_price: 79.9,
                    note: Some("cortar em 12 pedaços, por favor, e mandar guardanapos".into()),
                    recipient_name: Some("Ana".into()),
                    add_ons: vec![],
                },
                OrderItem {
                    name: "Guaraná 2L".into(),
                    quantity: 2,
                    unit_price: 12.0,
                    note: None,
                    recipient_name: None,
                    add_ons: vec![],
                },
            ],
            customer: Customer {
                name: "Ana Lima".into(),
                phone: Some("22999822324".into()),
                address: None,
            },
            payment_method: "pix".into(),
            change_for: None,
            table_number: Some(3),
            pickup: true,
            delivery_fee: 0.0,
            coupon_discount: 0.0,
            coupon_code: None,
            subtotal: 103.9,
            total: 103.9,
            created_at: Utc::now(),
        };
        let est = Establishment {
            id: "est-1".into(),
            name: "Pizzaria Forno a Lenha do Centro Histórico".into(),
            address: "Rua Direita, 1".into(),
            phone: None,
        };
        ReceiptRenderer::default().render(&order, &est)
    }

    #[test]
    fn test_text_is_width_bounded() {
        for width in [32, 48] {
            let layout = ReceiptLayout::new(width);
            for order_type in [OrderType::Table, OrderType::Delivery] {
                let text = layout.to_text(&doc(order_type));
                for line in text.lines() {
                    assert!(text_width(line) <= width, "{:?} wider than {}", line, width);
                }
            }
        }
    }

    #[test]
    fn test_text_contains_sections_in_order() {
        let text = ReceiptLayout::new(48).to_text(&doc(OrderType::Delivery));
        let pos = |needle: &str| text.find(needle).unwrap_or_else(|| panic!("missing {}", needle));
        assert!(pos("Pedido #ABCDEF") < pos("Cliente: Ana Lima"));
        assert!(pos("Cliente: Ana Lima") < pos("Retirada no balcão"));
        assert!(pos("Retirada no balcão") < pos("1x Pizza"));
        assert!(pos("1x Pizza") < pos("Subtotal"));
        assert!(pos("Subtotal") < pos("TOTAL"));
        assert!(text.contains("R$ 103,90"));
    }

    #[test]
    fn test_table_labels() {
        let text = ReceiptLayout::new(48).to_text(&doc(OrderType::Table));
        assert!(text.contains("[Ana]"));
        assert!(text.contains("[Mesa]"));
        assert!(text.contains("Mesa 3"));
        assert!(!text.contains("Cliente:"));
    }

    #[test]
    fn test_pair_keeps_amount_on_first_line() {
        let layout = ReceiptLayout::new(32);
        let lines = layout.pair("1x Pizza grande meia calabresa meia quatro", "R$ 79,90", false);
        assert!(lines.len() > 1);
        let Line::Text { text, .. } = &lines[0] else {
            panic!("expected text");
        };
        assert!(text.ends_with("R$ 79,90"));
        assert_eq!(text_width(text), 32);
    }

    #[test]
    fn test_escpos_output() {
        let bytes = ReceiptLayout::new(48).to_escpos(&doc(OrderType::Delivery));
        // INIT, then the code page it resets
        assert_eq!(&bytes[..5], &[0x1B, 0x40, 0x1B, 0x74, 16]);
        assert_eq!(bytes.windows(3).filter(|w| *w == [0x1B, 0x74, 16]).count(), 1);
        // partial cut with feed at the end
        assert_eq!(&bytes[bytes.len() - 4..], &[0x1D, 0x56, 0x42, 4]);
        // "ç" of "preferência"/"balcão" encoded as single bytes
        assert!(bytes.contains(&0xE3));
    }
}
