//! Socket plumbing: outbound frame writer and the inbound event printer.

use anyhow::Context;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::warn;

use matchbook_core::{price_to_f64, OrderType, Price, Quantity, Side};
use matchbook_protocol::{
    decode_body, decode_header, encode, CancelOrder, Message, ModifyOrder, NewOrder, HEADER_LEN,
};

/// Write side of the connection plus the client-local order id sequence.
pub struct Connection {
    writer: OwnedWriteHalf,
    next_client_order_id: u64,
    client_id: String,
}

impl Connection {
    pub fn new(writer: OwnedWriteHalf) -> Self {
        Connection {
            writer,
            next_client_order_id: 1,
            client_id: "matchbook-cli".to_string(),
        }
    }

    /// Send a new order; returns the client order id it was tagged with.
    pub async fn submit_order(
        &mut self,
        symbol: &str,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
    ) -> anyhow::Result<u64> {
        let client_order_id = self.next_client_order_id;
        self.next_client_order_id += 1;

        let message = Message::NewOrder(NewOrder {
            client_order_id,
            symbol: symbol.to_string(),
            side,
            order_type,
            price,
            quantity,
            stop_price: 0,
            client_id: self.client_id.clone(),
        });
        self.send(&message).await?;
        println!(
            "Submitted {side} {order_type} {symbol} qty={quantity} (client order id {client_order_id})"
        );
        Ok(client_order_id)
    }

    pub async fn cancel_order(&mut self, order_id: u64) -> anyhow::Result<()> {
        let message = Message::CancelOrder(CancelOrder {
            order_id,
            client_id: self.client_id.clone(),
        });
        self.send(&message).await
    }

    pub async fn modify_order(
        &mut self,
        order_id: u64,
        new_price: Price,
        new_quantity: Quantity,
    ) -> anyhow::Result<()> {
        let message = Message::ModifyOrder(ModifyOrder {
            order_id,
            new_price,
            new_quantity,
            client_id: self.client_id.clone(),
        });
        self.send(&message).await
    }

    async fn send(&mut self, message: &Message) -> anyhow::Result<()> {
        let frame = encode(message);
        self.writer.write_all(&frame).await.context("send frame")?;
        self.writer.flush().await.context("flush")?;
        Ok(())
    }
}

/// Read frames off the socket and print them until the server goes away.
pub async fn read_loop(mut reader: OwnedReadHalf) {
    let mut buf = BytesMut::with_capacity(64 * 1024);

    loop {
        match reader.read_buf(&mut buf).await {
            Ok(0) => {
                println!("Server closed the connection");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "read error");
                return;
            }
        }

        // Drain every complete frame in the buffer.
        while buf.len() >= HEADER_LEN {
            let header = match decode_header(&buf[..HEADER_LEN]) {
                Ok(header) => header,
                Err(e) => {
                    warn!(error = %e, "protocol error; dropping connection");
                    return;
                }
            };

            let frame_len = header.length as usize;
            if buf.len() < frame_len {
                break;
            }

            let frame = buf.split_to(frame_len);
            match decode_body(&header, &frame[HEADER_LEN..]) {
                Ok(message) => print_event(&message),
                Err(e) => {
                    warn!(error = %e, "undecodable frame; dropping connection");
                    return;
                }
            }
        }
    }
}

fn print_event(message: &Message) {
    let now = chrono::Local::now().format("%H:%M:%S%.3f");
    match message {
        Message::OrderAck(ack) => {
            println!(
                "[{now}] ACK    client_order_id={} order_id={} status={} ({})",
                ack.client_order_id, ack.order_id, ack.status, ack.message
            );
        }
        Message::OrderReject(reject) => {
            println!(
                "[{now}] REJECT client_order_id={} reason: {}",
                reject.client_order_id, reject.reason
            );
        }
        Message::ExecutionReport(report) => {
            println!(
                "[{now}] EXEC   order_id={} {} {} filled={} remaining={} status={} @ {:.4}",
                report.order_id,
                report.symbol,
                report.side,
                report.execution_quantity,
                report.remaining_quantity,
                report.status,
                price_to_f64(report.execution_price),
            );
        }
        Message::MarketData(md) => {
            println!(
                "[{now}] MKT    {} bid {:.4} x {} / ask {:.4} x {}",
                md.symbol,
                price_to_f64(md.best_bid),
                md.bid_quantity,
                price_to_f64(md.best_ask),
                md.ask_quantity,
            );
        }
        Message::Heartbeat(hb) => {
            println!("[{now}] HEARTBEAT seq={}", hb.sequence_number);
        }
        other => {
            warn!(?other, "server sent a client-side frame");
        }
    }
}
