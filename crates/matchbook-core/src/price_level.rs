//! One price level: a FIFO queue of resting orders plus a maintained
//! aggregate quantity.
//!
//! Invariant: `total_quantity` equals the sum of `remaining_quantity` over
//! every queued order. The queue preserves insertion order (time priority);
//! the id index gives O(1) membership checks and lookup.

use std::collections::{HashMap, VecDeque};

use crate::order::SharedOrder;
use crate::types::{OrderId, Price, Quantity};

#[derive(Debug)]
pub struct PriceLevel {
    price: Price,
    total_quantity: Quantity,
    queue: VecDeque<SharedOrder>,
    index: HashMap<OrderId, SharedOrder>,
}

impl PriceLevel {
    pub fn new(price: Price) -> Self {
        PriceLevel {
            price,
            total_quantity: 0,
            queue: VecDeque::new(),
            index: HashMap::new(),
        }
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    pub fn order_count(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Append an order at the back of the queue.
    pub fn add_order(&mut self, order: SharedOrder) {
        let (id, remaining) = {
            let o = order.lock();
            (o.id, o.remaining_quantity)
        };
        self.queue.push_back(order.clone());
        self.index.insert(id, order);
        self.total_quantity += remaining;
    }

    /// Remove an order by id, subtracting its current remainder from the
    /// aggregate. Idempotent: absent ids are a no-op.
    pub fn remove_order(&mut self, order_id: OrderId) -> Option<SharedOrder> {
        let order = self.index.remove(&order_id)?;
        self.total_quantity -= order.lock().remaining_quantity;
        if let Some(pos) = self.queue.iter().position(|o| o.lock().id == order_id) {
            self.queue.remove(pos);
        }
        Some(order)
    }

    pub fn get_order(&self, order_id: OrderId) -> Option<SharedOrder> {
        self.index.get(&order_id).cloned()
    }

    /// The order at the front of the queue (oldest at this price).
    pub fn front_order(&self) -> Option<SharedOrder> {
        self.queue.front().cloned()
    }

    /// Drop the front order from queue and index.
    ///
    /// Used by the sweep after a head order fills completely; its remaining
    /// quantity is zero by then, so the aggregate has already been reduced
    /// fill by fill.
    pub fn pop_front(&mut self) -> Option<SharedOrder> {
        let order = self.queue.pop_front()?;
        let remaining = {
            let o = order.lock();
            self.index.remove(&o.id);
            o.remaining_quantity
        };
        self.total_quantity -= remaining;
        Some(order)
    }

    /// Reduce the aggregate after a partial fill of a queued order.
    pub fn reduce_quantity(&mut self, quantity: Quantity) {
        self.total_quantity -= quantity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Order;
    use crate::types::{price_from_f64, OrderType, Side};

    fn resting(id: OrderId, qty: Quantity) -> SharedOrder {
        Order::new(
            id,
            "AAPL",
            Side::Sell,
            OrderType::Limit,
            price_from_f64(150.0),
            qty,
            0,
        )
        .into_shared()
    }

    #[test]
    fn aggregate_tracks_adds_and_removes() {
        let mut level = PriceLevel::new(price_from_f64(150.0));
        level.add_order(resting(1, 100));
        level.add_order(resting(2, 50));
        assert_eq!(level.total_quantity(), 150);
        assert_eq!(level.order_count(), 2);

        level.remove_order(1);
        assert_eq!(level.total_quantity(), 50);
        assert_eq!(level.order_count(), 1);
    }

    #[test]
    fn remove_is_idempotent_on_absent_ids() {
        let mut level = PriceLevel::new(price_from_f64(150.0));
        level.add_order(resting(1, 100));
        assert!(level.remove_order(99).is_none());
        assert_eq!(level.total_quantity(), 100);
    }

    #[test]
    fn queue_preserves_insertion_order() {
        let mut level = PriceLevel::new(price_from_f64(150.0));
        level.add_order(resting(1, 100));
        level.add_order(resting(2, 50));
        level.add_order(resting(3, 25));

        let front = level.front_order().unwrap();
        assert_eq!(front.lock().id, 1);

        level.remove_order(1);
        let front = level.front_order().unwrap();
        assert_eq!(front.lock().id, 2);
    }

    #[test]
    fn remove_uses_current_remaining_not_original() {
        let mut level = PriceLevel::new(price_from_f64(150.0));
        let order = resting(1, 100);
        level.add_order(order.clone());

        order.lock().fill(60);
        level.reduce_quantity(60);
        assert_eq!(level.total_quantity(), 40);

        level.remove_order(1);
        assert_eq!(level.total_quantity(), 0);
    }

    #[test]
    fn pop_front_of_filled_head_leaves_aggregate_consistent() {
        let mut level = PriceLevel::new(price_from_f64(150.0));
        let order = resting(1, 100);
        level.add_order(order.clone());
        level.add_order(resting(2, 30));

        order.lock().fill(100);
        level.reduce_quantity(100);
        level.pop_front();

        assert_eq!(level.total_quantity(), 30);
        assert_eq!(level.order_count(), 1);
        assert!(level.get_order(1).is_none());
    }
}
