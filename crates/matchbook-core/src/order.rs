//! Order record: immutable identity, mutable fill state.
//!
//! An order's id, symbol, side, type and timestamp never change after
//! construction. Price and quantity are mutable only through `set_price` /
//! `set_quantity`, which exist for modify (semantically a re-post).

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::types::{price_to_f64, timestamp_ns, OrderId, OrderStatus, OrderType, Price, Quantity, Side};

/// Shared handle to an order.
///
/// The book's order index and the price-level FIFO queues hold clones of the
/// same `Arc`, so a fill observed through one path is visible through the
/// other. Handles held by callers stay valid after the book drops its own.
pub type SharedOrder = Arc<Mutex<Order>>;

/// A single order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Price,
    pub quantity: Quantity,
    pub remaining_quantity: Quantity,
    /// Trigger price for stop variants; 0 for everything else.
    pub stop_price: Price,
    pub status: OrderStatus,
    /// Time-priority anchor, set at construction and never changed.
    pub timestamp_ns: u64,
    pub client_id: String,
}

impl Order {
    pub fn new(
        id: OrderId,
        symbol: impl Into<String>,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
        stop_price: Price,
    ) -> Self {
        Order {
            id,
            symbol: symbol.into(),
            side,
            order_type,
            price,
            quantity,
            remaining_quantity: quantity,
            stop_price,
            status: OrderStatus::Pending,
            timestamp_ns: timestamp_ns(),
            client_id: String::new(),
        }
    }

    /// Wrap into the shared handle used by the book.
    pub fn into_shared(self) -> SharedOrder {
        Arc::new(Mutex::new(self))
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.quantity - self.remaining_quantity
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity == 0
    }

    /// An order is active while it can still trade.
    pub fn is_active(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::PartialFill)
    }

    /// Fill up to `quantity` units, clamped to what remains.
    ///
    /// Transitions to `Filled` when nothing remains, otherwise to
    /// `PartialFill` once any fill has occurred.
    pub fn fill(&mut self, quantity: Quantity) {
        let filled = quantity.min(self.remaining_quantity);
        self.remaining_quantity -= filled;

        if self.remaining_quantity == 0 {
            self.status = OrderStatus::Filled;
        } else if self.remaining_quantity < self.quantity {
            self.status = OrderStatus::PartialFill;
        }
    }

    /// Whether a stop order should trigger at the given reference price.
    ///
    /// A buy stop triggers when the price has risen to the stop price; a
    /// sell stop when it has fallen to it. Non-stop types never trigger.
    pub fn should_trigger(&self, reference_price: Price) -> bool {
        match self.order_type {
            OrderType::StopLoss | OrderType::StopLimit => match self.side {
                Side::Buy => reference_price >= self.stop_price,
                Side::Sell => reference_price <= self.stop_price,
            },
            _ => false,
        }
    }

    pub fn set_price(&mut self, price: Price) {
        self.price = price;
    }

    /// Replace the quantity, resetting the unfilled remainder to match.
    pub fn set_quantity(&mut self, quantity: Quantity) {
        self.quantity = quantity;
        self.remaining_quantity = quantity;
    }

    pub fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
    }

    pub fn set_client_id(&mut self, client_id: impl Into<String>) {
        self.client_id = client_id.into();
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order[id={}, symbol={}, side={}, type={}, price={:.4}, qty={}, remaining={}, status={}]",
            self.id,
            self.symbol,
            self.side,
            self.order_type,
            price_to_f64(self.price),
            self.quantity,
            self.remaining_quantity,
            self.status,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::price_from_f64;

    fn limit_order(side: Side, price: f64, qty: Quantity) -> Order {
        Order::new(1, "AAPL", side, OrderType::Limit, price_from_f64(price), qty, 0)
    }

    #[test]
    fn new_order_starts_pending_with_full_remainder() {
        let order = limit_order(Side::Buy, 150.0, 100);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.remaining_quantity, 100);
        assert_eq!(order.filled_quantity(), 0);
        assert!(order.is_active());
    }

    #[test]
    fn partial_then_full_fill_walks_the_status_dag() {
        let mut order = limit_order(Side::Buy, 150.0, 100);

        order.fill(30);
        assert_eq!(order.status, OrderStatus::PartialFill);
        assert_eq!(order.remaining_quantity, 70);
        assert_eq!(order.filled_quantity(), 30);

        order.fill(70);
        assert_eq!(order.status, OrderStatus::Filled);
        assert!(order.is_filled());
        assert!(!order.is_active());
    }

    #[test]
    fn fill_clamps_to_remaining() {
        let mut order = limit_order(Side::Sell, 150.0, 100);
        order.fill(250);
        assert_eq!(order.remaining_quantity, 0);
        assert_eq!(order.status, OrderStatus::Filled);
    }

    #[test]
    fn buy_stop_triggers_when_price_rises_to_stop() {
        let mut order = Order::new(
            1,
            "AAPL",
            Side::Buy,
            OrderType::StopLoss,
            0,
            100,
            price_from_f64(155.0),
        );
        assert!(!order.should_trigger(price_from_f64(154.99)));
        assert!(order.should_trigger(price_from_f64(155.0)));
        assert!(order.should_trigger(price_from_f64(156.0)));

        order.side = Side::Sell;
        assert!(order.should_trigger(price_from_f64(154.0)));
        assert!(!order.should_trigger(price_from_f64(156.0)));
    }

    #[test]
    fn non_stop_types_never_trigger() {
        let order = limit_order(Side::Buy, 150.0, 100);
        assert!(!order.should_trigger(price_from_f64(150.0)));
    }

    #[test]
    fn set_quantity_resets_remaining() {
        let mut order = limit_order(Side::Buy, 150.0, 100);
        order.fill(40);
        order.set_quantity(80);
        assert_eq!(order.quantity, 80);
        assert_eq!(order.remaining_quantity, 80);
    }
}
