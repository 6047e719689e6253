//! Trade: the value record produced by each execution.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{price_to_f64, OrderId, Price, Quantity};

/// An executed trade between a buy order and a sell order.
///
/// Immutable once emitted; owned by the caller of `match_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub symbol: String,
    /// Execution price: always the resting (passive) order's price.
    pub price: Price,
    pub quantity: Quantity,
    pub timestamp_ns: u64,
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trade[buy={}, sell={}, symbol={}, price={:.4}, qty={}]",
            self.buy_order_id,
            self.sell_order_id,
            self.symbol,
            price_to_f64(self.price),
            self.quantity,
        )
    }
}
