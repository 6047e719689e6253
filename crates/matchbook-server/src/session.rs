//! Per-connection frame loop.
//!
//! Each connection gets one task that reads length-prefixed frames (the
//! 16-byte header carries the total length), dispatches into the shared
//! engine and writes replies back on the same socket. Requests from one
//! connection are handled strictly in order; concurrency comes from having
//! one task per connection, all submitting into the same engine.
//!
//! A malformed frame (unknown type, bad length, short read) terminates the
//! connection; the engine itself is never exposed to undecoded input.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{info, warn};

use matchbook_core::OrderStatus;
use matchbook_protocol::{
    decode_body, decode_header, encode, CancelOrder, Message, ModifyOrder, NewOrder, OrderAck,
    OrderReject, HEADER_LEN,
};

use crate::server::ServerState;

/// Drive one client connection until it disconnects or misbehaves.
pub async fn run_session(
    mut stream: TcpStream,
    peer: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let mut header_buf = [0u8; HEADER_LEN];

    loop {
        match stream.read_exact(&mut header_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e).context("header read"),
        }

        let header = decode_header(&header_buf).context("frame header")?;
        let mut body = vec![0u8; header.body_len()];
        stream.read_exact(&mut body).await.context("frame body")?;

        let message = decode_body(&header, &body).context("frame body decode")?;

        match message {
            Message::NewOrder(new_order) => {
                handle_new_order(&mut stream, &state, new_order).await?;
            }
            Message::CancelOrder(cancel) => {
                handle_cancel(&mut stream, &state, cancel).await?;
            }
            Message::ModifyOrder(modify) => {
                handle_modify(&mut stream, &state, modify).await?;
            }
            Message::Heartbeat(hb) => {
                // Echo the original bytes back unchanged, header included.
                info!(peer = %peer, sequence = hb.sequence_number, "heartbeat");
                stream.write_all(&header_buf).await?;
                stream.write_all(&body).await?;
                stream.flush().await?;
            }
            other => {
                warn!(peer = %peer, ?other, "client sent a server-side frame; closing");
                anyhow::bail!("unexpected frame from client");
            }
        }
    }
}

async fn handle_new_order(
    stream: &mut TcpStream,
    state: &ServerState,
    msg: NewOrder,
) -> anyhow::Result<()> {
    info!(
        symbol = %msg.symbol,
        side = %msg.side,
        order_type = %msg.order_type,
        price = msg.price,
        quantity = msg.quantity,
        "new order"
    );

    // Input validation lives here, at the protocol edge; the core accepts
    // what it is given.
    if msg.quantity == 0 {
        let reject = Message::OrderReject(OrderReject {
            client_order_id: msg.client_order_id,
            reason: "zero quantity".to_string(),
        });
        return write_message(stream, &reject).await;
    }

    let order_id = state.engine.submit_order(
        &msg.symbol,
        msg.side,
        msg.order_type,
        msg.price,
        msg.quantity,
        &msg.client_id,
        msg.stop_price,
    );

    let ack = Message::OrderAck(OrderAck {
        client_order_id: msg.client_order_id,
        order_id,
        status: OrderStatus::Pending,
        message: "Order accepted".to_string(),
    });
    write_message(stream, &ack).await?;

    // If the order is still resting with progress made, report it. Orders
    // that left the book entirely (filled or cancelled on match) are no
    // longer addressable by id and produce no report here.
    if let Some(order) = state.engine.get_order(order_id) {
        let report = {
            let o = order.lock();
            if o.status == OrderStatus::Pending {
                None
            } else {
                Some(Message::ExecutionReport(matchbook_protocol::ExecutionReport {
                    order_id,
                    symbol: o.symbol.clone(),
                    side: o.side,
                    execution_price: o.price,
                    execution_quantity: o.filled_quantity(),
                    remaining_quantity: o.remaining_quantity,
                    status: o.status,
                    trade_id: 0,
                }))
            }
        };
        if let Some(report) = report {
            write_message(stream, &report).await?;
        }
    }

    Ok(())
}

async fn handle_cancel(
    stream: &mut TcpStream,
    state: &ServerState,
    msg: CancelOrder,
) -> anyhow::Result<()> {
    info!(order_id = msg.order_id, "cancel order");

    let success = state.engine.cancel_order(msg.order_id);

    let ack = Message::OrderAck(OrderAck {
        client_order_id: 0,
        order_id: msg.order_id,
        status: if success {
            OrderStatus::Cancelled
        } else {
            OrderStatus::Rejected
        },
        message: if success {
            "Order cancelled".to_string()
        } else {
            "Order not found".to_string()
        },
    });
    write_message(stream, &ack).await
}

async fn handle_modify(
    stream: &mut TcpStream,
    state: &ServerState,
    msg: ModifyOrder,
) -> anyhow::Result<()> {
    info!(
        order_id = msg.order_id,
        new_price = msg.new_price,
        new_quantity = msg.new_quantity,
        "modify order"
    );

    let success = state
        .engine
        .modify_order(msg.order_id, msg.new_price, msg.new_quantity);

    let ack = Message::OrderAck(OrderAck {
        client_order_id: 0,
        order_id: msg.order_id,
        status: if success {
            OrderStatus::Pending
        } else {
            OrderStatus::Rejected
        },
        message: if success {
            "Order modified".to_string()
        } else {
            "Failed to modify order".to_string()
        },
    });
    write_message(stream, &ack).await
}

async fn write_message(stream: &mut TcpStream, message: &Message) -> anyhow::Result<()> {
    let frame = encode(message);
    stream.write_all(&frame).await?;
    stream.flush().await?;
    Ok(())
}
