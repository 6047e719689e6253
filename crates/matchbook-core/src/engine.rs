//! Multi-symbol matching engine.
//!
//! Owns one [`OrderBook`] per symbol (created on first use), assigns order
//! ids, routes operations to the right book, fires order/trade callbacks
//! and aggregates statistics.
//!
//! Locking discipline: a single engine mutex guards the book registry and
//! the order-to-symbol index; each book has its own internal mutex. The
//! engine lock is always released before entering a book (engine → book
//! order, never reversed). Counters are atomics. Callbacks run on the
//! caller's thread with no engine or book lock held, so they may safely
//! call back into the engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::order::{Order, SharedOrder};
use crate::order_book::OrderBook;
use crate::trade::Trade;
use crate::types::{OrderId, OrderType, Price, Quantity, Side};

/// Notification for order-state changes (fired pre- and post-match).
pub type OrderCallback = Box<dyn Fn(&SharedOrder) + Send + Sync>;

/// Notification for each executed trade.
pub type TradeCallback = Box<dyn Fn(&Trade) + Send + Sync>;

/// Process-wide matching engine: symbol registry plus order id authority.
pub struct MatchingEngine {
    index: Mutex<EngineIndex>,

    next_order_id: AtomicU64,
    total_orders: AtomicU64,
    total_trades: AtomicU64,

    order_callback: RwLock<Option<OrderCallback>>,
    trade_callback: RwLock<Option<TradeCallback>>,
}

#[derive(Default)]
struct EngineIndex {
    /// Symbol -> book. Books are shared out as `Arc` so the engine lock can
    /// be dropped before book operations run.
    books: HashMap<String, Arc<OrderBook>>,

    /// Which symbol each known order id was routed to. Entries may outlive
    /// the order's presence in its book (fills don't signal back here);
    /// cancel is the only operation that prunes.
    order_to_symbol: HashMap<OrderId, String>,
}

impl MatchingEngine {
    pub fn new() -> Self {
        MatchingEngine {
            index: Mutex::new(EngineIndex::default()),
            next_order_id: AtomicU64::new(1),
            total_orders: AtomicU64::new(0),
            total_trades: AtomicU64::new(0),
            order_callback: RwLock::new(None),
            trade_callback: RwLock::new(None),
        }
    }

    /// Submit a new order and match it immediately.
    ///
    /// Allocates the next order id, creates the order, routes it to its
    /// symbol's book (creating the book on first use) and matches. The
    /// order callback fires twice: once with the pre-match state and once
    /// after matching settles; the trade callback fires per execution.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_order(
        &self,
        symbol: &str,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
        client_id: &str,
        stop_price: Price,
    ) -> OrderId {
        let order_id = self.next_order_id.fetch_add(1, Ordering::Relaxed);
        self.total_orders.fetch_add(1, Ordering::Relaxed);

        let mut order = Order::new(order_id, symbol, side, order_type, price, quantity, stop_price);
        order.set_client_id(client_id);
        let order = order.into_shared();

        let book = {
            let mut index = self.index.lock();
            index.order_to_symbol.insert(order_id, symbol.to_string());
            index
                .books
                .entry(symbol.to_string())
                .or_insert_with(|| Arc::new(OrderBook::new(symbol)))
                .clone()
        };

        debug!(order_id, symbol, %side, %order_type, price, quantity, "submit");

        self.notify_order(&order);

        let trades = book.match_order(&order);

        for trade in &trades {
            self.total_trades.fetch_add(1, Ordering::Relaxed);
            self.notify_trade(trade);
        }

        self.notify_order(&order);

        order_id
    }

    /// Cancel by id. Resolves the owning book through the symbol index;
    /// returns false for unknown ids. On success the index entry is pruned.
    pub fn cancel_order(&self, order_id: OrderId) -> bool {
        let book = match self.resolve_book(order_id) {
            Some(book) => book,
            None => return false,
        };

        let cancelled = book.cancel_order(order_id);
        if cancelled {
            let mut index = self.index.lock();
            index.order_to_symbol.remove(&order_id);
            debug!(order_id, "cancelled");
        }
        cancelled
    }

    /// Modify by id: re-price/re-size via the owning book. The symbol index
    /// entry is retained (the order lives on under the same id).
    pub fn modify_order(&self, order_id: OrderId, new_price: Price, new_quantity: Quantity) -> bool {
        let book = match self.resolve_book(order_id) {
            Some(book) => book,
            None => return false,
        };

        let modified = book.modify_order(order_id, new_price, new_quantity);
        if modified {
            debug!(order_id, new_price, new_quantity, "modified");
        }
        modified
    }

    /// Look up an order that is still resting in its book.
    pub fn get_order(&self, order_id: OrderId) -> Option<SharedOrder> {
        self.resolve_book(order_id)?.get_order(order_id)
    }

    pub fn best_bid(&self, symbol: &str) -> Price {
        self.book(symbol).map_or(0, |book| book.best_bid())
    }

    pub fn best_ask(&self, symbol: &str) -> Price {
        self.book(symbol).map_or(0, |book| book.best_ask())
    }

    pub fn bid_depth(&self, symbol: &str, levels: usize) -> Vec<(Price, Quantity)> {
        self.book(symbol)
            .map_or_else(Vec::new, |book| book.bid_depth(levels))
    }

    pub fn ask_depth(&self, symbol: &str, levels: usize) -> Vec<(Price, Quantity)> {
        self.book(symbol)
            .map_or_else(Vec::new, |book| book.ask_depth(levels))
    }

    pub fn set_order_callback(&self, callback: OrderCallback) {
        *self.order_callback.write() = Some(callback);
    }

    pub fn set_trade_callback(&self, callback: TradeCallback) {
        *self.trade_callback.write() = Some(callback);
    }

    pub fn total_orders(&self) -> u64 {
        self.total_orders.load(Ordering::Relaxed)
    }

    pub fn total_trades(&self) -> u64 {
        self.total_trades.load(Ordering::Relaxed)
    }

    /// Resolve the book owning `order_id`, holding the engine lock only for
    /// the index lookup.
    fn resolve_book(&self, order_id: OrderId) -> Option<Arc<OrderBook>> {
        let index = self.index.lock();
        let symbol = index.order_to_symbol.get(&order_id)?;
        index.books.get(symbol).cloned()
    }

    fn book(&self, symbol: &str) -> Option<Arc<OrderBook>> {
        self.index.lock().books.get(symbol).cloned()
    }

    fn notify_order(&self, order: &SharedOrder) {
        if let Some(callback) = self.order_callback.read().as_ref() {
            callback(order);
        }
    }

    fn notify_trade(&self, trade: &Trade) {
        if let Some(callback) = self.trade_callback.read().as_ref() {
            callback(trade);
        }
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        MatchingEngine::new()
    }
}
