//! Binary encoding/decoding for the matchbook wire protocol.
//!
//! Frame layouts (all integers little-endian; offsets relative to the start
//! of the frame, header included):
//!
//! ```text
//! Header (every frame)
//! --------------------
//! [0..4]    type (u32)
//! [4..8]    length (u32, total frame length including header)
//! [8..16]   timestamp (u64, opaque)
//!
//! NewOrder (type=0, 104 bytes)
//!   [16..24]   client_order_id (u64)
//!   [24..40]   symbol[16]
//!   [40..44]   side (u32)
//!   [44..48]   order_type (u32)
//!   [48..56]   price (i64)
//!   [56..64]   quantity (u64)
//!   [64..72]   stop_price (i64)
//!   [72..104]  client_id[32]
//!
//! CancelOrder (type=1, 56 bytes)
//!   [16..24]   order_id (u64)
//!   [24..56]   client_id[32]
//!
//! ModifyOrder (type=2, 72 bytes)
//!   [16..24]   order_id (u64)
//!   [24..32]   new_price (i64)
//!   [32..40]   new_quantity (u64)
//!   [40..72]   client_id[32]
//!
//! OrderAck (type=3, 164 bytes)
//!   [16..24]   client_order_id (u64)
//!   [24..32]   order_id (u64)
//!   [32..36]   status (u32)
//!   [36..164]  message[128]
//!
//! OrderReject (type=4, 280 bytes)
//!   [16..24]   client_order_id (u64)
//!   [24..280]  reason[256]
//!
//! ExecutionReport (type=5, 80 bytes)
//!   [16..24]   order_id (u64)
//!   [24..40]   symbol[16]
//!   [40..44]   side (u32)
//!   [44..52]   execution_price (i64)
//!   [52..60]   execution_quantity (u64)
//!   [60..68]   remaining_quantity (u64)
//!   [68..72]   status (u32)
//!   [72..80]   trade_id (u64)
//!
//! MarketData (type=6, 64 bytes)
//!   [16..32]   symbol[16]
//!   [32..40]   best_bid (i64)
//!   [40..48]   best_ask (i64)
//!   [48..56]   bid_quantity (u64)
//!   [56..64]   ask_quantity (u64)
//!
//! Heartbeat (type=7, 24 bytes)
//!   [16..24]   sequence_number (u64)
//! ```
//!
//! Receivers read the 16-byte header, then `length - 16` more bytes, then
//! dispatch on `type`. Fixed-width text fields are null-padded; values
//! longer than the field are truncated on encode.

use thiserror::Error;

use matchbook_core::{OrderStatus, OrderType, Price, Quantity, Side};

use crate::wire_types::{
    order_type_from_u32, order_type_to_u32, side_from_u32, side_to_u32, status_from_u32,
    status_to_u32, MessageType, ACK_MESSAGE_LEN, CLIENT_ID_LEN, HEADER_LEN, MAX_FRAME_LEN,
    REJECT_REASON_LEN, SYMBOL_LEN,
};

/// Errors arising while decoding a frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("frame truncated: need {expected} bytes, have {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("unknown message type: {0}")]
    UnknownMessageType(u32),

    #[error("frame length {0} out of bounds")]
    BadLength(u32),

    #[error("invalid field: {0}")]
    InvalidField(&'static str),
}

/// Decoded frame header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub msg_type: MessageType,
    pub length: u32,
    pub timestamp: u64,
}

impl FrameHeader {
    /// Bytes remaining after the header for this frame.
    pub fn body_len(&self) -> usize {
        self.length as usize - HEADER_LEN
    }
}

/// A decoded protocol message, either direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    NewOrder(NewOrder),
    CancelOrder(CancelOrder),
    ModifyOrder(ModifyOrder),
    OrderAck(OrderAck),
    OrderReject(OrderReject),
    ExecutionReport(ExecutionReport),
    MarketData(MarketData),
    Heartbeat(Heartbeat),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Client-generated id; a namespace distinct from engine order ids.
    pub client_order_id: u64,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Price,
    pub quantity: Quantity,
    pub stop_price: Price,
    pub client_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelOrder {
    pub order_id: u64,
    pub client_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyOrder {
    pub order_id: u64,
    pub new_price: Price,
    pub new_quantity: Quantity,
    pub client_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAck {
    pub client_order_id: u64,
    /// Engine-assigned id.
    pub order_id: u64,
    pub status: OrderStatus,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReject {
    pub client_order_id: u64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub order_id: u64,
    pub symbol: String,
    pub side: Side,
    pub execution_price: Price,
    pub execution_quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub status: OrderStatus,
    pub trade_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketData {
    pub symbol: String,
    pub best_bid: Price,
    pub best_ask: Price,
    pub bid_quantity: Quantity,
    pub ask_quantity: Quantity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heartbeat {
    pub sequence_number: u64,
}

impl Message {
    pub fn msg_type(&self) -> MessageType {
        match self {
            Message::NewOrder(_) => MessageType::NewOrder,
            Message::CancelOrder(_) => MessageType::CancelOrder,
            Message::ModifyOrder(_) => MessageType::ModifyOrder,
            Message::OrderAck(_) => MessageType::OrderAck,
            Message::OrderReject(_) => MessageType::OrderReject,
            Message::ExecutionReport(_) => MessageType::ExecutionReport,
            Message::MarketData(_) => MessageType::MarketData,
            Message::Heartbeat(_) => MessageType::Heartbeat,
        }
    }

    /// Total encoded frame length, header included.
    pub fn frame_len(&self) -> usize {
        frame_len(self.msg_type())
    }
}

/// Total frame length for each message type.
pub fn frame_len(msg_type: MessageType) -> usize {
    HEADER_LEN
        + match msg_type {
            MessageType::NewOrder => 8 + SYMBOL_LEN + 4 + 4 + 8 + 8 + 8 + CLIENT_ID_LEN,
            MessageType::CancelOrder => 8 + CLIENT_ID_LEN,
            MessageType::ModifyOrder => 8 + 8 + 8 + CLIENT_ID_LEN,
            MessageType::OrderAck => 8 + 8 + 4 + ACK_MESSAGE_LEN,
            MessageType::OrderReject => 8 + REJECT_REASON_LEN,
            MessageType::ExecutionReport => 8 + SYMBOL_LEN + 4 + 8 + 8 + 8 + 4 + 8,
            MessageType::MarketData => SYMBOL_LEN + 8 + 8 + 8 + 8,
            MessageType::Heartbeat => 8,
        }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a complete frame (header + body) into a fresh buffer.
pub fn encode(message: &Message) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.frame_len());

    out.extend_from_slice(&(message.msg_type() as u32).to_le_bytes());
    out.extend_from_slice(&(message.frame_len() as u32).to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes()); // timestamp, opaque

    match message {
        Message::NewOrder(m) => {
            out.extend_from_slice(&m.client_order_id.to_le_bytes());
            put_fixed_str(&mut out, &m.symbol, SYMBOL_LEN);
            out.extend_from_slice(&side_to_u32(m.side).to_le_bytes());
            out.extend_from_slice(&order_type_to_u32(m.order_type).to_le_bytes());
            out.extend_from_slice(&m.price.to_le_bytes());
            out.extend_from_slice(&m.quantity.to_le_bytes());
            out.extend_from_slice(&m.stop_price.to_le_bytes());
            put_fixed_str(&mut out, &m.client_id, CLIENT_ID_LEN);
        }
        Message::CancelOrder(m) => {
            out.extend_from_slice(&m.order_id.to_le_bytes());
            put_fixed_str(&mut out, &m.client_id, CLIENT_ID_LEN);
        }
        Message::ModifyOrder(m) => {
            out.extend_from_slice(&m.order_id.to_le_bytes());
            out.extend_from_slice(&m.new_price.to_le_bytes());
            out.extend_from_slice(&m.new_quantity.to_le_bytes());
            put_fixed_str(&mut out, &m.client_id, CLIENT_ID_LEN);
        }
        Message::OrderAck(m) => {
            out.extend_from_slice(&m.client_order_id.to_le_bytes());
            out.extend_from_slice(&m.order_id.to_le_bytes());
            out.extend_from_slice(&status_to_u32(m.status).to_le_bytes());
            put_fixed_str(&mut out, &m.message, ACK_MESSAGE_LEN);
        }
        Message::OrderReject(m) => {
            out.extend_from_slice(&m.client_order_id.to_le_bytes());
            put_fixed_str(&mut out, &m.reason, REJECT_REASON_LEN);
        }
        Message::ExecutionReport(m) => {
            out.extend_from_slice(&m.order_id.to_le_bytes());
            put_fixed_str(&mut out, &m.symbol, SYMBOL_LEN);
            out.extend_from_slice(&side_to_u32(m.side).to_le_bytes());
            out.extend_from_slice(&m.execution_price.to_le_bytes());
            out.extend_from_slice(&m.execution_quantity.to_le_bytes());
            out.extend_from_slice(&m.remaining_quantity.to_le_bytes());
            out.extend_from_slice(&status_to_u32(m.status).to_le_bytes());
            out.extend_from_slice(&m.trade_id.to_le_bytes());
        }
        Message::MarketData(m) => {
            put_fixed_str(&mut out, &m.symbol, SYMBOL_LEN);
            out.extend_from_slice(&m.best_bid.to_le_bytes());
            out.extend_from_slice(&m.best_ask.to_le_bytes());
            out.extend_from_slice(&m.bid_quantity.to_le_bytes());
            out.extend_from_slice(&m.ask_quantity.to_le_bytes());
        }
        Message::Heartbeat(m) => {
            out.extend_from_slice(&m.sequence_number.to_le_bytes());
        }
    }

    out
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode the 16-byte frame header.
pub fn decode_header(buf: &[u8]) -> Result<FrameHeader, ProtocolError> {
    if buf.len() < HEADER_LEN {
        return Err(ProtocolError::Truncated {
            expected: HEADER_LEN,
            actual: buf.len(),
        });
    }

    let raw_type = read_u32(buf, 0);
    let length = read_u32(buf, 4);
    let timestamp = read_u64(buf, 8);

    let msg_type =
        MessageType::from_u32(raw_type).ok_or(ProtocolError::UnknownMessageType(raw_type))?;

    if (length as usize) < HEADER_LEN || (length as usize) > MAX_FRAME_LEN {
        return Err(ProtocolError::BadLength(length));
    }

    Ok(FrameHeader {
        msg_type,
        length,
        timestamp,
    })
}

/// Decode a frame body (the bytes after the header) into a message.
pub fn decode_body(header: &FrameHeader, body: &[u8]) -> Result<Message, ProtocolError> {
    let expected = frame_len(header.msg_type) - HEADER_LEN;
    if body.len() < expected {
        return Err(ProtocolError::Truncated {
            expected,
            actual: body.len(),
        });
    }

    match header.msg_type {
        MessageType::NewOrder => {
            let side = side_from_u32(read_u32(body, 24)).ok_or(ProtocolError::InvalidField("side"))?;
            let order_type = order_type_from_u32(read_u32(body, 28))
                .ok_or(ProtocolError::InvalidField("order_type"))?;
            Ok(Message::NewOrder(NewOrder {
                client_order_id: read_u64(body, 0),
                symbol: get_fixed_str(&body[8..8 + SYMBOL_LEN])?,
                side,
                order_type,
                price: read_i64(body, 32),
                quantity: read_u64(body, 40),
                stop_price: read_i64(body, 48),
                client_id: get_fixed_str(&body[56..56 + CLIENT_ID_LEN])?,
            }))
        }
        MessageType::CancelOrder => Ok(Message::CancelOrder(CancelOrder {
            order_id: read_u64(body, 0),
            client_id: get_fixed_str(&body[8..8 + CLIENT_ID_LEN])?,
        })),
        MessageType::ModifyOrder => Ok(Message::ModifyOrder(ModifyOrder {
            order_id: read_u64(body, 0),
            new_price: read_i64(body, 8),
            new_quantity: read_u64(body, 16),
            client_id: get_fixed_str(&body[24..24 + CLIENT_ID_LEN])?,
        })),
        MessageType::OrderAck => {
            let status =
                status_from_u32(read_u32(body, 16)).ok_or(ProtocolError::InvalidField("status"))?;
            Ok(Message::OrderAck(OrderAck {
                client_order_id: read_u64(body, 0),
                order_id: read_u64(body, 8),
                status,
                message: get_fixed_str(&body[20..20 + ACK_MESSAGE_LEN])?,
            }))
        }
        MessageType::OrderReject => Ok(Message::OrderReject(OrderReject {
            client_order_id: read_u64(body, 0),
            reason: get_fixed_str(&body[8..8 + REJECT_REASON_LEN])?,
        })),
        MessageType::ExecutionReport => {
            let side = side_from_u32(read_u32(body, 24)).ok_or(ProtocolError::InvalidField("side"))?;
            let status =
                status_from_u32(read_u32(body, 52)).ok_or(ProtocolError::InvalidField("status"))?;
            Ok(Message::ExecutionReport(ExecutionReport {
                order_id: read_u64(body, 0),
                symbol: get_fixed_str(&body[8..8 + SYMBOL_LEN])?,
                side,
                execution_price: read_i64(body, 28),
                execution_quantity: read_u64(body, 36),
                remaining_quantity: read_u64(body, 44),
                status,
                trade_id: read_u64(body, 56),
            }))
        }
        MessageType::MarketData => Ok(Message::MarketData(MarketData {
            symbol: get_fixed_str(&body[0..SYMBOL_LEN])?,
            best_bid: read_i64(body, 16),
            best_ask: read_i64(body, 24),
            bid_quantity: read_u64(body, 32),
            ask_quantity: read_u64(body, 40),
        })),
        MessageType::Heartbeat => Ok(Message::Heartbeat(Heartbeat {
            sequence_number: read_u64(body, 0),
        })),
    }
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

/// Write a null-padded fixed-width text field, truncating if necessary.
fn put_fixed_str(out: &mut Vec<u8>, value: &str, width: usize) {
    let bytes = value.as_bytes();
    let n = bytes.len().min(width);
    out.extend_from_slice(&bytes[..n]);
    out.resize(out.len() + (width - n), 0);
}

/// Read a fixed-width text field up to the first null byte.
fn get_fixed_str(field: &[u8]) -> Result<String, ProtocolError> {
    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    std::str::from_utf8(&field[..end])
        .map(str::to_owned)
        .map_err(|_| ProtocolError::InvalidField("text"))
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

fn read_u64(buf: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

fn read_i64(buf: &[u8], offset: usize) -> i64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    i64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchbook_core::price_from_f64;

    fn sample_new_order() -> Message {
        Message::NewOrder(NewOrder {
            client_order_id: 7,
            symbol: "AAPL".to_string(),
            side: Side::Buy,
            order_type: OrderType::Limit,
            price: price_from_f64(150.0),
            quantity: 100,
            stop_price: 0,
            client_id: "desk-7".to_string(),
        })
    }

    fn decode(frame: &[u8]) -> Message {
        let header = decode_header(frame).expect("header");
        assert_eq!(header.length as usize, frame.len());
        decode_body(&header, &frame[HEADER_LEN..]).expect("body")
    }

    #[test]
    fn frame_lengths_match_the_layout() {
        assert_eq!(frame_len(MessageType::NewOrder), 104);
        assert_eq!(frame_len(MessageType::CancelOrder), 56);
        assert_eq!(frame_len(MessageType::ModifyOrder), 72);
        assert_eq!(frame_len(MessageType::OrderAck), 164);
        assert_eq!(frame_len(MessageType::OrderReject), 280);
        assert_eq!(frame_len(MessageType::ExecutionReport), 80);
        assert_eq!(frame_len(MessageType::MarketData), 64);
        assert_eq!(frame_len(MessageType::Heartbeat), 24);
    }

    #[test]
    fn encoded_frame_carries_type_and_length() {
        let frame = encode(&sample_new_order());
        assert_eq!(frame.len(), 104);

        let header = decode_header(&frame).unwrap();
        assert_eq!(header.msg_type, MessageType::NewOrder);
        assert_eq!(header.length, 104);
        assert_eq!(header.body_len(), 88);
    }

    #[test]
    fn new_order_survives_the_wire() {
        let msg = sample_new_order();
        assert_eq!(decode(&encode(&msg)), msg);
    }

    #[test]
    fn execution_report_survives_the_wire() {
        let msg = Message::ExecutionReport(ExecutionReport {
            order_id: 12,
            symbol: "MSFT".to_string(),
            side: Side::Sell,
            execution_price: price_from_f64(300.25),
            execution_quantity: 40,
            remaining_quantity: 60,
            status: OrderStatus::PartialFill,
            trade_id: 3,
        });
        assert_eq!(decode(&encode(&msg)), msg);
    }

    #[test]
    fn heartbeat_echo_is_byte_identical() {
        let msg = Message::Heartbeat(Heartbeat {
            sequence_number: 41,
        });
        let frame = encode(&msg);
        assert_eq!(frame, encode(&decode(&frame)));
    }

    #[test]
    fn symbol_field_is_null_padded_and_truncated() {
        let mut long = sample_new_order();
        if let Message::NewOrder(ref mut m) = long {
            m.symbol = "ABCDEFGHIJKLMNOPQRSTUVWXYZ".to_string();
        }
        let frame = encode(&long);
        assert_eq!(frame.len(), 104);

        match decode(&frame) {
            Message::NewOrder(m) => assert_eq!(m.symbol, "ABCDEFGHIJKLMNOP"),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut frame = encode(&sample_new_order());
        frame[0..4].copy_from_slice(&99u32.to_le_bytes());
        assert_eq!(
            decode_header(&frame),
            Err(ProtocolError::UnknownMessageType(99))
        );
    }

    #[test]
    fn short_header_and_short_body_are_truncation_errors() {
        let frame = encode(&sample_new_order());
        assert!(matches!(
            decode_header(&frame[..10]),
            Err(ProtocolError::Truncated { .. })
        ));

        let header = decode_header(&frame).unwrap();
        assert!(matches!(
            decode_body(&header, &frame[HEADER_LEN..frame.len() - 1]),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn oversized_length_is_rejected() {
        let mut frame = encode(&sample_new_order());
        frame[4..8].copy_from_slice(&(MAX_FRAME_LEN as u32 + 1).to_le_bytes());
        assert_eq!(
            decode_header(&frame),
            Err(ProtocolError::BadLength(MAX_FRAME_LEN as u32 + 1))
        );
    }

    #[test]
    fn invalid_side_is_rejected() {
        let mut frame = encode(&sample_new_order());
        // side lives at frame offset 40
        frame[40..44].copy_from_slice(&9u32.to_le_bytes());
        let header = decode_header(&frame).unwrap();
        assert_eq!(
            decode_body(&header, &frame[HEADER_LEN..]),
            Err(ProtocolError::InvalidField("side"))
        );
    }
}
