//! Shared primitive types for the matching engine.
//!
//! Prices are signed fixed-point integers: the human price multiplied by
//! [`PRICE_SCALE`] (four fractional decimals). All matching arithmetic is
//! integer; the float conversions exist only at the edges (CLI input,
//! display).

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Engine-assigned order identifier, unique process-wide, starting at 1.
pub type OrderId = u64;

/// Fixed-point price: human price × 10,000.
pub type Price = i64;

/// Order quantity in whole units.
pub type Quantity = u64;

/// Fixed-point scale factor (four decimal places).
pub const PRICE_SCALE: i64 = 10_000;

/// Convert a human-readable price to its fixed-point representation.
pub fn price_from_f64(price: f64) -> Price {
    (price * PRICE_SCALE as f64).round() as Price
}

/// Convert a fixed-point price back to a human-readable value.
pub fn price_to_f64(price: Price) -> f64 {
    price as f64 / PRICE_SCALE as f64
}

/// Current wall-clock reading in nanoseconds since the Unix epoch.
///
/// Used as the time-priority anchor on orders and the stamp on trades.
pub fn timestamp_ns() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    now.as_secs()
        .saturating_mul(1_000_000_000)
        .saturating_add(now.subsec_nanos() as u64)
}

/// Order side: Buy or Sell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type.
///
/// Six types with distinct flows; the per-type behavior reduces to a price
/// predicate plus a residual policy (rest, cancel, or all-or-nothing
/// pre-check). Stop variants are accepted and bookkept but matched as limit
/// orders; trigger-on-last-trade is a planned extension.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Execute immediately at the best available price.
    Market,
    /// Execute at the specified price or better; residual rests.
    Limit,
    /// Becomes a market order when the stop price is reached.
    StopLoss,
    /// Becomes a limit order when the stop price is reached.
    StopLimit,
    /// Immediate-or-cancel: fill what crosses, cancel the rest.
    Ioc,
    /// Fill-or-kill: fill the entire quantity atomically or do nothing.
    Fok,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::StopLoss => "STOP_LOSS",
            OrderType::StopLimit => "STOP_LIMIT",
            OrderType::Ioc => "IOC",
            OrderType::Fok => "FOK",
        };
        f.write_str(s)
    }
}

/// Order lifecycle status.
///
/// Transitions form a DAG: Pending → {PartialFill, Filled, Cancelled,
/// Rejected}; PartialFill → {Filled, Cancelled}. Filled, Cancelled and
/// Rejected are terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    PartialFill,
    Filled,
    Cancelled,
    Rejected,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::PartialFill => "PARTIAL_FILL",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_conversion_is_exact_at_four_decimals() {
        assert_eq!(price_from_f64(150.0), 1_500_000);
        assert_eq!(price_from_f64(150.5), 1_505_000);
        assert_eq!(price_from_f64(0.0001), 1);
        assert_eq!(price_to_f64(1_515_000), 151.5);
    }

    #[test]
    fn side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }
}
