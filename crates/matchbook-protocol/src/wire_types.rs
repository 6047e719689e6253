//! Wire-level constants and enum encodings.
//!
//! Every frame starts with the 16-byte header: message type (u32), total
//! frame length in bytes (u32), and an opaque timestamp (u64). All integer
//! fields travel little-endian. Text fields are fixed-width, ASCII,
//! null-padded.
//!
//! The encode/decode logic lives in [`crate::binary_codec`].

use matchbook_core::{OrderStatus, OrderType, Side};

/// Header size: type (4) + length (4) + timestamp (8).
pub const HEADER_LEN: usize = 16;

/// Upper bound on a single frame; anything larger is malformed.
pub const MAX_FRAME_LEN: usize = 4096;

pub const SYMBOL_LEN: usize = 16;
pub const CLIENT_ID_LEN: usize = 32;
pub const ACK_MESSAGE_LEN: usize = 128;
pub const REJECT_REASON_LEN: usize = 256;

/// Frame type discriminants, in wire order.
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MessageType {
    NewOrder = 0,
    CancelOrder = 1,
    ModifyOrder = 2,
    OrderAck = 3,
    OrderReject = 4,
    ExecutionReport = 5,
    MarketData = 6,
    Heartbeat = 7,
}

impl MessageType {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(MessageType::NewOrder),
            1 => Some(MessageType::CancelOrder),
            2 => Some(MessageType::ModifyOrder),
            3 => Some(MessageType::OrderAck),
            4 => Some(MessageType::OrderReject),
            5 => Some(MessageType::ExecutionReport),
            6 => Some(MessageType::MarketData),
            7 => Some(MessageType::Heartbeat),
            _ => None,
        }
    }
}

pub fn side_to_u32(side: Side) -> u32 {
    match side {
        Side::Buy => 0,
        Side::Sell => 1,
    }
}

pub fn side_from_u32(value: u32) -> Option<Side> {
    match value {
        0 => Some(Side::Buy),
        1 => Some(Side::Sell),
        _ => None,
    }
}

pub fn order_type_to_u32(order_type: OrderType) -> u32 {
    match order_type {
        OrderType::Market => 0,
        OrderType::Limit => 1,
        OrderType::StopLoss => 2,
        OrderType::StopLimit => 3,
        OrderType::Ioc => 4,
        OrderType::Fok => 5,
    }
}

pub fn order_type_from_u32(value: u32) -> Option<OrderType> {
    match value {
        0 => Some(OrderType::Market),
        1 => Some(OrderType::Limit),
        2 => Some(OrderType::StopLoss),
        3 => Some(OrderType::StopLimit),
        4 => Some(OrderType::Ioc),
        5 => Some(OrderType::Fok),
        _ => None,
    }
}

pub fn status_to_u32(status: OrderStatus) -> u32 {
    match status {
        OrderStatus::Pending => 0,
        OrderStatus::PartialFill => 1,
        OrderStatus::Filled => 2,
        OrderStatus::Cancelled => 3,
        OrderStatus::Rejected => 4,
    }
}

pub fn status_from_u32(value: u32) -> Option<OrderStatus> {
    match value {
        0 => Some(OrderStatus::Pending),
        1 => Some(OrderStatus::PartialFill),
        2 => Some(OrderStatus::Filled),
        3 => Some(OrderStatus::Cancelled),
        4 => Some(OrderStatus::Rejected),
        _ => None,
    }
}
