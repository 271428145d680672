use shared::error::{AppError, ErrorCode};
use shared::order::{OrderStatus, OrderType};
use thiserror::Error;

use crate::store::StoreError;

/// Action refused by the status rules; never retried
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PolicyViolation {
    #[error("Order {order_id} is already {status}")]
    Terminal { order_id: String, status: OrderStatus },

    #[error("Order {order_id} cannot be removed while {status}")]
    NotRemovable { order_id: String, status: OrderStatus },

    #[error("Status {status} is not part of the {order_type} flow")]
    OutsideGraph {
        status: OrderStatus,
        order_type: OrderType,
    },
}

/// Transition engine errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransitionError {
    #[error(transparent)]
    Policy(#[from] PolicyViolation),

    #[error("Store write failed: {0}")]
    Write(#[from] StoreError),
}

impl TransitionError {
    pub fn is_policy(&self) -> bool {
        matches!(self, TransitionError::Policy(_))
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        let message = err.to_string();
        let (code, order_id) = match &err {
            TransitionError::Policy(PolicyViolation::Terminal { order_id, .. }) => {
                (ErrorCode::OrderTerminal, Some(order_id.clone()))
            }
            TransitionError::Policy(PolicyViolation::NotRemovable { order_id, .. }) => {
                (ErrorCode::OrderNotRemovable, Some(order_id.clone()))
            }
            TransitionError::Policy(PolicyViolation::OutsideGraph { .. }) => {
                (ErrorCode::InvalidTransition, None)
            }
            TransitionError::Write(StoreError::NotFound(id)) => {
                (ErrorCode::OrderNotFound, Some(id.clone()))
            }
            TransitionError::Write(e) => {
                tracing::error!(error = %e, "Order write failed");
                (ErrorCode::OrderWriteFailed, None)
            }
        };

        let app = AppError::with_message(code, message);
        match order_id {
            Some(id) => app.with_detail("orderId", id),
            None => app,
        }
    }
}
