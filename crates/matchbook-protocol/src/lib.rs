//! matchbook-protocol
//!
//! Fixed-layout binary framing for client/server traffic: every frame is a
//! 16-byte header (type, length, timestamp) followed by a type-specific
//! body. [`binary_codec`] holds the encode/decode logic, [`wire_types`] the
//! constants and enum encodings.

pub mod binary_codec;
pub mod wire_types;

pub use binary_codec::{
    decode_body, decode_header, encode, frame_len, CancelOrder, ExecutionReport, FrameHeader,
    Heartbeat, MarketData, Message, ModifyOrder, NewOrder, OrderAck, OrderReject, ProtocolError,
};
pub use wire_types::{MessageType, HEADER_LEN, MAX_FRAME_LEN};
