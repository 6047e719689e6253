//! Single-symbol order book with price-time priority.
//!
//! One instance per symbol. Bids and asks are `BTreeMap`s keyed by price;
//! the best bid is the highest key (`next_back`), the best ask the lowest
//! (`next`). FIFO within each price level yields strict price-time
//! priority. Empty levels are removed eagerly so best-price reads stay a
//! first-key access.
//!
//! A single mutex guards bids, asks and the order index; every public
//! operation, including market-data reads, acquires it. Matching is
//! therefore serialized per symbol.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;
use tracing::trace;

use crate::order::SharedOrder;
use crate::price_level::PriceLevel;
use crate::trade::Trade;
use crate::types::{timestamp_ns, OrderId, OrderStatus, OrderType, Price, Quantity, Side};

/// Order book for a single symbol.
#[derive(Debug)]
pub struct OrderBook {
    symbol: String,
    inner: Mutex<BookSides>,
}

#[derive(Debug, Default)]
struct BookSides {
    /// Price -> level. Iteration order is ascending; the best bid is the
    /// last key.
    bids: BTreeMap<Price, PriceLevel>,

    /// Price -> level. The best ask is the first key.
    asks: BTreeMap<Price, PriceLevel>,

    /// Resting orders only. An order is indexed here iff it sits in exactly
    /// one level on its side at its current price.
    orders: HashMap<OrderId, SharedOrder>,
}

impl OrderBook {
    pub fn new(symbol: impl Into<String>) -> Self {
        OrderBook {
            symbol: symbol.into(),
            inner: Mutex::new(BookSides::default()),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Insert an order onto its side at its price without matching.
    ///
    /// Matching flows go through [`OrderBook::match_order`]; this exists for
    /// direct book manipulation (and is what limit resting uses internally).
    pub fn add_order(&self, order: SharedOrder) {
        let mut book = self.inner.lock();
        book.rest(order);
    }

    /// Cancel a resting order.
    ///
    /// Sets its status to `Cancelled`, removes it from its level (erasing
    /// the level if emptied) and from the order index. Returns false when
    /// the id is not resting here; repeated cancels are no-ops.
    pub fn cancel_order(&self, order_id: OrderId) -> bool {
        let mut book = self.inner.lock();

        let order = match book.orders.get(&order_id) {
            Some(order) => order.clone(),
            None => return false,
        };

        let (side, price) = {
            let mut o = order.lock();
            o.set_status(OrderStatus::Cancelled);
            (o.side, o.price)
        };

        book.remove_from_level(side, price, order_id);
        book.orders.remove(&order_id);
        true
    }

    /// Re-price and re-size a resting order.
    ///
    /// The order is pulled from its current level, its quantity reset (the
    /// remainder becomes the new quantity), its status returned to
    /// `Pending`, and it is re-inserted at the new price on the same side —
    /// at the back of the queue. Modify never matches, even when the new
    /// price crosses the opposing best; it is a re-post and loses time
    /// priority.
    pub fn modify_order(&self, order_id: OrderId, new_price: Price, new_quantity: Quantity) -> bool {
        let mut book = self.inner.lock();

        let order = match book.orders.get(&order_id) {
            Some(order) => order.clone(),
            None => return false,
        };

        let (side, old_price) = {
            let o = order.lock();
            (o.side, o.price)
        };
        book.remove_from_level(side, old_price, order_id);

        {
            let mut o = order.lock();
            o.set_price(new_price);
            o.set_quantity(new_quantity);
            o.set_status(OrderStatus::Pending);
        }

        book.rest(order);
        true
    }

    /// Look up a resting order by id.
    pub fn get_order(&self, order_id: OrderId) -> Option<SharedOrder> {
        let book = self.inner.lock();
        book.orders.get(&order_id).cloned()
    }

    /// Match an incoming order against the book, dispatching on its type.
    ///
    /// Returns the trades produced, in execution order. Stop variants carry
    /// their stop price but are matched as limit orders; triggering on
    /// last-trade price is not implemented here.
    pub fn match_order(&self, order: &SharedOrder) -> Vec<Trade> {
        let mut book = self.inner.lock();

        let order_type = order.lock().order_type;
        match order_type {
            OrderType::Market => book.match_market(&self.symbol, order),
            OrderType::Limit | OrderType::StopLoss | OrderType::StopLimit => {
                book.match_limit(&self.symbol, order)
            }
            OrderType::Ioc => book.match_ioc(&self.symbol, order),
            OrderType::Fok => book.match_fok(&self.symbol, order),
        }
    }

    /// Best bid price, 0 when the bid side is empty.
    pub fn best_bid(&self) -> Price {
        let book = self.inner.lock();
        book.bids.keys().next_back().copied().unwrap_or(0)
    }

    /// Best ask price, 0 when the ask side is empty.
    pub fn best_ask(&self) -> Price {
        let book = self.inner.lock();
        book.asks.keys().next().copied().unwrap_or(0)
    }

    /// Aggregate resting quantity at an exact bid price (0 if no level).
    pub fn bid_quantity_at(&self, price: Price) -> Quantity {
        let book = self.inner.lock();
        book.bids.get(&price).map_or(0, PriceLevel::total_quantity)
    }

    /// Aggregate resting quantity at an exact ask price (0 if no level).
    pub fn ask_quantity_at(&self, price: Price) -> Quantity {
        let book = self.inner.lock();
        book.asks.get(&price).map_or(0, PriceLevel::total_quantity)
    }

    /// Up to `levels` bid levels as `(price, total_quantity)`, best first.
    pub fn bid_depth(&self, levels: usize) -> Vec<(Price, Quantity)> {
        let book = self.inner.lock();
        book.bids
            .iter()
            .rev()
            .take(levels)
            .map(|(price, level)| (*price, level.total_quantity()))
            .collect()
    }

    /// Up to `levels` ask levels as `(price, total_quantity)`, best first.
    pub fn ask_depth(&self, levels: usize) -> Vec<(Price, Quantity)> {
        let book = self.inner.lock();
        book.asks
            .iter()
            .take(levels)
            .map(|(price, level)| (*price, level.total_quantity()))
            .collect()
    }
}

impl BookSides {
    /// Insert an order into its side's level and the order index.
    fn rest(&mut self, order: SharedOrder) {
        let (id, side, price) = {
            let o = order.lock();
            (o.id, o.side, o.price)
        };

        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
            .add_order(order.clone());

        self.orders.insert(id, order);
    }

    /// Remove an order from the level at `price`, erasing the level if it
    /// empties. The order index is left to the caller.
    fn remove_from_level(&mut self, side: Side, price: Price, order_id: OrderId) {
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        if let Some(level) = levels.get_mut(&price) {
            level.remove_order(order_id);
            if level.is_empty() {
                levels.remove(&price);
            }
        }
    }

    fn match_market(&mut self, symbol: &str, taker: &SharedOrder) -> Vec<Trade> {
        let mut trades = Vec::new();
        self.sweep(symbol, taker, &mut trades);

        // Market orders never rest; the unfilled remainder is cancelled.
        let mut t = taker.lock();
        if t.remaining_quantity > 0 {
            t.set_status(OrderStatus::Cancelled);
        }
        trades
    }

    fn match_limit(&mut self, symbol: &str, taker: &SharedOrder) -> Vec<Trade> {
        let mut trades = Vec::new();
        self.sweep(symbol, taker, &mut trades);

        let should_rest = {
            let t = taker.lock();
            t.remaining_quantity > 0 && t.is_active()
        };
        if should_rest {
            self.rest(taker.clone());
        }
        trades
    }

    fn match_ioc(&mut self, symbol: &str, taker: &SharedOrder) -> Vec<Trade> {
        let mut trades = Vec::new();
        self.sweep(symbol, taker, &mut trades);

        let mut t = taker.lock();
        if t.remaining_quantity > 0 {
            t.set_status(OrderStatus::Cancelled);
        }
        trades
    }

    fn match_fok(&mut self, symbol: &str, taker: &SharedOrder) -> Vec<Trade> {
        let can_fill = {
            let t = taker.lock();
            self.can_fill_completely(&t)
        };

        if !can_fill {
            taker.lock().set_status(OrderStatus::Cancelled);
            return Vec::new();
        }

        // Sufficient at-or-better liquidity exists, so the sweep fills the
        // order completely.
        let mut trades = Vec::new();
        self.sweep(symbol, taker, &mut trades);
        trades
    }

    /// Walk opposite levels best-first under the limit price predicate and
    /// report whether the aggregate covers the taker's full remainder.
    fn can_fill_completely(&self, taker: &crate::order::Order) -> bool {
        let mut available: Quantity = 0;

        match taker.side {
            Side::Buy => {
                for (price, level) in self.asks.iter() {
                    if *price > taker.price {
                        break;
                    }
                    available += level.total_quantity();
                    if available >= taker.remaining_quantity {
                        return true;
                    }
                }
            }
            Side::Sell => {
                for (price, level) in self.bids.iter().rev() {
                    if *price < taker.price {
                        break;
                    }
                    available += level.total_quantity();
                    if available >= taker.remaining_quantity {
                        return true;
                    }
                }
            }
        }

        false
    }

    /// Shared sweep: execute crossing fills against the opposite side in
    /// best-price-first order, FIFO within each level.
    ///
    /// The trade price is always the resting order's price; price
    /// improvement goes to the aggressor. A resting order that fills
    /// completely is erased from its queue and the order index in the same
    /// step; a partial fill leaves it indexed with its reduced remainder.
    fn sweep(&mut self, symbol: &str, taker: &SharedOrder, trades: &mut Vec<Trade>) {
        loop {
            let (taker_side, taker_type, taker_price, taker_remaining) = {
                let t = taker.lock();
                (t.side, t.order_type, t.price, t.remaining_quantity)
            };
            if taker_remaining == 0 {
                break;
            }

            let best = match taker_side {
                Side::Buy => self.asks.keys().next().copied(),
                Side::Sell => self.bids.keys().next_back().copied(),
            };
            let level_price = match best {
                Some(price) => price,
                None => break,
            };
            if !price_crosses(taker_type, taker_side, taker_price, level_price) {
                break;
            }

            let levels = match taker_side {
                Side::Buy => &mut self.asks,
                Side::Sell => &mut self.bids,
            };
            let level = match levels.get_mut(&level_price) {
                Some(level) => level,
                None => break,
            };

            while let Some(maker) = level.front_order() {
                // Evict a zero-remainder head so it cannot wedge the queue.
                if maker.lock().remaining_quantity == 0 {
                    let stale_id = maker.lock().id;
                    level.pop_front();
                    self.orders.remove(&stale_id);
                    continue;
                }

                let (fill_qty, maker_id, maker_filled, buy_id, sell_id, trade_price) = {
                    let mut t = taker.lock();
                    if t.remaining_quantity == 0 {
                        break;
                    }
                    let mut m = maker.lock();

                    let fill_qty = t.remaining_quantity.min(m.remaining_quantity);

                    let (buy_id, sell_id) = match t.side {
                        Side::Buy => (t.id, m.id),
                        Side::Sell => (m.id, t.id),
                    };
                    let trade_price = m.price;

                    t.fill(fill_qty);
                    m.fill(fill_qty);

                    (fill_qty, m.id, m.is_filled(), buy_id, sell_id, trade_price)
                };

                trades.push(Trade {
                    buy_order_id: buy_id,
                    sell_order_id: sell_id,
                    symbol: symbol.to_string(),
                    price: trade_price,
                    quantity: fill_qty,
                    timestamp_ns: timestamp_ns(),
                });

                level.reduce_quantity(fill_qty);
                if maker_filled {
                    level.pop_front();
                    self.orders.remove(&maker_id);
                }

                trace!(
                    symbol,
                    maker = maker_id,
                    price = trade_price,
                    quantity = fill_qty,
                    "fill"
                );
            }

            let emptied = level.is_empty();
            if emptied {
                levels.remove(&level_price);
            }
        }
    }
}

/// Limit-style price predicate shared by the sweep and the FOK pre-check.
/// Market orders execute against any level.
fn price_crosses(taker_type: OrderType, side: Side, limit_price: Price, level_price: Price) -> bool {
    match taker_type {
        OrderType::Market => true,
        _ => match side {
            Side::Buy => level_price <= limit_price,
            Side::Sell => level_price >= limit_price,
        },
    }
}
