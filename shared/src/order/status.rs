//! Order type and status graph
//!
//! Two graphs, keyed by [`OrderType`]:
//!
//! ```text
//! table:    recebido -> preparo -> pronto_para_servir -> finalizado
//! delivery: aguardando_pagamento -> recebido -> preparo -> em_entrega -> finalizado
//! ```
//!
//! Transitions are forward-only; `finalizado` is terminal for both.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order type (determines status graph and board grouping)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// In-house, tied to a table number
    Table,
    /// Off-premise, tied to a customer address (or counter pickup)
    Delivery,
}

impl OrderType {
    /// Live buckets shown on the board for this type, in display order
    pub const fn board_statuses(&self) -> [OrderStatus; 4] {
        match self {
            OrderType::Table => [
                OrderStatus::Recebido,
                OrderStatus::Preparo,
                OrderStatus::ProntoParaServir,
                OrderStatus::Finalizado,
            ],
            OrderType::Delivery => [
                OrderStatus::Recebido,
                OrderStatus::Preparo,
                OrderStatus::EmEntrega,
                OrderStatus::Finalizado,
            ],
        }
    }

    /// Full status graph, entry state first
    pub fn graph(&self) -> &'static [OrderStatus] {
        match self {
            OrderType::Table => &[
                OrderStatus::Recebido,
                OrderStatus::Preparo,
                OrderStatus::ProntoParaServir,
                OrderStatus::Finalizado,
            ],
            OrderType::Delivery => &[
                OrderStatus::AguardandoPagamento,
                OrderStatus::Recebido,
                OrderStatus::Preparo,
                OrderStatus::EmEntrega,
                OrderStatus::Finalizado,
            ],
        }
    }

    /// Position of `status` in this type's graph
    pub fn rank(&self, status: OrderStatus) -> Option<usize> {
        self.graph().iter().position(|s| *s == status)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderType::Table => "table",
            OrderType::Delivery => "delivery",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Cash/pix pending confirmation (delivery only)
    AguardandoPagamento,
    /// Received, not yet started
    Recebido,
    /// In the kitchen
    Preparo,
    /// Ready at the pass (table only)
    ProntoParaServir,
    /// Out with the courier (delivery only)
    EmEntrega,
    /// Done
    Finalizado,
}

impl OrderStatus {
    /// The single legal successor in the graph for `order_type`
    ///
    /// Returns `None` when the status is terminal or does not belong
    /// to that type's graph.
    pub fn next_for(&self, order_type: OrderType) -> Option<OrderStatus> {
        let graph = order_type.graph();
        let pos = graph.iter().position(|s| s == self)?;
        graph.get(pos + 1).copied()
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Finalizado)
    }

    /// Whether an explicit delete is allowed from this status
    ///
    /// `recebido` is always removable; `aguardando_pagamento` only when
    /// the establishment allows it.
    pub const fn is_removable(&self, allow_awaiting_payment: bool) -> bool {
        match self {
            OrderStatus::Recebido => true,
            OrderStatus::AguardandoPagamento => allow_awaiting_payment,
            _ => false,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::AguardandoPagamento => "aguardando_pagamento",
            OrderStatus::Recebido => "recebido",
            OrderStatus::Preparo => "preparo",
            OrderStatus::ProntoParaServir => "pronto_para_servir",
            OrderStatus::EmEntrega => "em_entrega",
            OrderStatus::Finalizado => "finalizado",
        }
    }

    /// Column title on the board
    pub const fn label(&self) -> &'static str {
        match self {
            OrderStatus::AguardandoPagamento => "Aguardando pagamento",
            OrderStatus::Recebido => "Recebidos",
            OrderStatus::Preparo => "Em preparo",
            OrderStatus::ProntoParaServir => "Pronto para servir",
            OrderStatus::EmEntrega => "Em entrega",
            OrderStatus::Finalizado => "Finalizados",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
