//! matchbook-core
//!
//! Pure matching-engine logic:
//! - primitive types (fixed-point prices, sides, order types, statuses)
//! - order representation with shared ownership
//! - per-symbol order book with price-time priority matching
//! - multi-symbol engine with id assignment, callbacks and statistics
//!
//! The crate is synchronous and thread-safe: submit/cancel/modify may be
//! called from many threads concurrently. Operations on one symbol are
//! serialized by that book's mutex; nothing is ordered across symbols.

pub mod engine;
pub mod order;
pub mod order_book;
pub mod price_level;
pub mod trade;
pub mod types;

pub use engine::{MatchingEngine, OrderCallback, TradeCallback};
pub use order::{Order, SharedOrder};
pub use order_book::OrderBook;
pub use price_level::PriceLevel;
pub use trade::Trade;
pub use types::{
    price_from_f64, price_to_f64, timestamp_ns, OrderId, OrderStatus, OrderType, Price, Quantity,
    Side, PRICE_SCALE,
};
