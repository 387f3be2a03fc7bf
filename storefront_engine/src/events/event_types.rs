use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderLine, Payment},
    traits::CommittedOrder,
};

/// Emitted once an order has been paid for and committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCompletedEvent {
    pub order: Order,
    pub payment: Payment,
    pub lines: Vec<OrderLine>,
}

impl From<CommittedOrder> for OrderCompletedEvent {
    fn from(committed: CommittedOrder) -> Self {
        let CommittedOrder { order, payment, lines } = committed;
        Self { order, payment, lines }
    }
}

