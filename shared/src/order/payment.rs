//! Payment method display labels

/// Display label for a payment method code
///
/// Unknown codes are shown upper-cased as they are.
pub fn payment_label(code: &str) -> String {
    let label = match code.trim().to_lowercase().as_str() {
        "dinheiro" | "cash" => "Dinheiro",
        "pix" => "Pix",
        "cartao" | "cartão" => "Cartão",
        "cartao_credito" | "credito" | "credit_card" => "Cartão de Crédito",
        "cartao_debito" | "debito" | "debit_card" => "Cartão de Débito",
        "vale_refeicao" => "Vale-Refeição",
        "online" => "Pago online",
        _ => return code.trim().to_uppercase(),
    };
    label.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(payment_label("dinheiro"), "Dinheiro");
        assert_eq!(payment_label("PIX"), "Pix");
        assert_eq!(payment_label("cartao_credito"), "Cartão de Crédito");
        assert_eq!(payment_label("cartao_debito"), "Cartão de Débito");
    }

    #[test]
    fn test_unknown_code_is_uppercased() {
        assert_eq!(payment_label("boleto"), "BOLETO");
        assert_eq!(payment_label("ticket_vr"), "TICKET_VR");
    }
}
