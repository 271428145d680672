//! Customer message templates, one per notifiable status

use shared::money::{checked_amount, format_brl, receipt_total};
use shared::order::{Order, OrderStatus, payment_label};

use super::ComposeError;

/// Headline and closing line wrapped around the order summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub headline: &'static str,
    pub closing: &'static str,
}

/// Template for `status`; `None` when the status is not notified
pub fn template_for(status: OrderStatus) -> Option<Template> {
    let template = match status {
        OrderStatus::Recebido => Template {
            headline: "Olá, {nome}! Recebemos seu pedido #{ref}.",
            closing: "Avisaremos assim que ele entrar em preparo.",
        },
        OrderStatus::Preparo => Template {
            headline: "Olá, {nome}! Seu pedido #{ref} está em preparo.",
            closing: "Logo ele sai para entrega.",
        },
        OrderStatus::EmEntrega => Template {
            headline: "Olá, {nome}! Seu pedido #{ref} saiu para entrega.",
            closing: "Nosso entregador já está a caminho.",
        },
        OrderStatus::Finalizado => Template {
            headline: "Olá, {nome}! Seu pedido #{ref} foi finalizado.",
            closing: "Obrigado pela preferência!",
        },
        _ => return None,
    };
    Some(template)
}

/// Message body for `order` entering `status`
pub fn render(order: &Order, status: OrderStatus) -> Result<String, ComposeError> {
    let template = template_for(status).ok_or(ComposeError::NoTemplate(status))?;
    let out_of_range = || ComposeError::AmountOutOfRange(order.id.clone());
    let first_name = order.customer.first_name();
    let name = if first_name.is_empty() { "cliente" } else { first_name };

    let mut lines = vec![
        template
            .headline
            .replace("{nome}", name)
            .replace("{ref}", &order.short_ref()),
        String::new(),
    ];

    for item in &order.items {
        lines.push(format!(
            "{}x {} - {}",
            item.quantity,
            item.name,
            format_brl(item.line_total().ok_or_else(out_of_range)?)
        ));
        for add_on in &item.add_ons {
            lines.push(format!("   + {}", add_on.name));
        }
    }

    let total = receipt_total(order.subtotal, order.delivery_fee, order.coupon_discount)
        .ok_or_else(out_of_range)?;
    lines.push(String::new());
    lines.push(format!("Total: {}", format_brl(total)));
    lines.push(format!("Pagamento: {}", payment_label(&order.payment_method)));
    if let Some(change_for) = order.change_for.filter(|_| order.is_cash()) {
        let change_for = checked_amount(change_for).ok_or_else(out_of_range)?;
        lines.push(format!("Troco para: {}", format_brl(change_for)));
    }
    lines.push(String::new());
    lines.push(template.closing.to_string());

    Ok(lines.join("\n"))
}
