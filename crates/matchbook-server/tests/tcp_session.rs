//! End-to-end exercises of the TCP session loop: framing, acks, rejects,
//! execution reports and heartbeat echo over a real socket.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use matchbook_core::{price_from_f64, OrderStatus, OrderType, Side};
use matchbook_protocol::{
    decode_body, decode_header, encode, CancelOrder, Heartbeat, Message, NewOrder, HEADER_LEN,
};
use matchbook_server::server::{serve, ServerState};

async fn start_server() -> SocketAddr {
    let state = ServerState::new();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, state, 16));
    addr
}

async fn send(stream: &mut TcpStream, message: &Message) {
    stream.write_all(&encode(message)).await.unwrap();
}

async fn recv(stream: &mut TcpStream) -> Message {
    let mut header_buf = [0u8; HEADER_LEN];
    stream.read_exact(&mut header_buf).await.unwrap();
    let header = decode_header(&header_buf).unwrap();

    let mut body = vec![0u8; header.body_len()];
    stream.read_exact(&mut body).await.unwrap();
    decode_body(&header, &body).unwrap()
}

fn limit_order(client_order_id: u64, side: Side, price: f64, quantity: u64) -> Message {
    Message::NewOrder(NewOrder {
        client_order_id,
        symbol: "AAPL".to_string(),
        side,
        order_type: OrderType::Limit,
        price: price_from_f64(price),
        quantity,
        stop_price: 0,
        client_id: "itest".to_string(),
    })
}

#[tokio::test]
async fn resting_order_is_acked_as_pending() {
    let addr = start_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    send(&mut stream, &limit_order(11, Side::Buy, 150.0, 100)).await;

    match recv(&mut stream).await {
        Message::OrderAck(ack) => {
            assert_eq!(ack.client_order_id, 11);
            assert_eq!(ack.order_id, 1);
            assert_eq!(ack.status, OrderStatus::Pending);
            assert_eq!(ack.message, "Order accepted");
        }
        other => panic!("expected ack, got {other:?}"),
    }
}

#[tokio::test]
async fn partial_fill_produces_an_execution_report() {
    let addr = start_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    // Resting sell of 50, then a buy of 100 that crosses and rests partially.
    send(&mut stream, &limit_order(1, Side::Sell, 150.0, 50)).await;
    match recv(&mut stream).await {
        Message::OrderAck(_) => {}
        other => panic!("expected ack, got {other:?}"),
    }

    send(&mut stream, &limit_order(2, Side::Buy, 150.0, 100)).await;
    match recv(&mut stream).await {
        Message::OrderAck(ack) => assert_eq!(ack.client_order_id, 2),
        other => panic!("expected ack, got {other:?}"),
    }

    match recv(&mut stream).await {
        Message::ExecutionReport(report) => {
            assert_eq!(report.order_id, 2);
            assert_eq!(report.symbol, "AAPL");
            assert_eq!(report.status, OrderStatus::PartialFill);
            assert_eq!(report.execution_quantity, 50);
            assert_eq!(report.remaining_quantity, 50);
        }
        other => panic!("expected execution report, got {other:?}"),
    }
}

#[tokio::test]
async fn zero_quantity_is_rejected() {
    let addr = start_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    send(&mut stream, &limit_order(5, Side::Buy, 150.0, 0)).await;

    match recv(&mut stream).await {
        Message::OrderReject(reject) => {
            assert_eq!(reject.client_order_id, 5);
            assert_eq!(reject.reason, "zero quantity");
        }
        other => panic!("expected reject, got {other:?}"),
    }

    // The connection stays usable after a reject.
    send(&mut stream, &limit_order(6, Side::Buy, 150.0, 10)).await;
    match recv(&mut stream).await {
        Message::OrderAck(ack) => assert_eq!(ack.client_order_id, 6),
        other => panic!("expected ack, got {other:?}"),
    }
}

#[tokio::test]
async fn cancel_acks_reflect_success_and_not_found() {
    let addr = start_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    send(&mut stream, &limit_order(1, Side::Buy, 150.0, 100)).await;
    let order_id = match recv(&mut stream).await {
        Message::OrderAck(ack) => ack.order_id,
        other => panic!("expected ack, got {other:?}"),
    };

    send(
        &mut stream,
        &Message::CancelOrder(CancelOrder {
            order_id,
            client_id: "itest".to_string(),
        }),
    )
    .await;
    match recv(&mut stream).await {
        Message::OrderAck(ack) => {
            assert_eq!(ack.status, OrderStatus::Cancelled);
            assert_eq!(ack.message, "Order cancelled");
        }
        other => panic!("expected ack, got {other:?}"),
    }

    send(
        &mut stream,
        &Message::CancelOrder(CancelOrder {
            order_id: 9999,
            client_id: "itest".to_string(),
        }),
    )
    .await;
    match recv(&mut stream).await {
        Message::OrderAck(ack) => {
            assert_eq!(ack.status, OrderStatus::Rejected);
            assert_eq!(ack.message, "Order not found");
        }
        other => panic!("expected ack, got {other:?}"),
    }
}

#[tokio::test]
async fn heartbeat_is_echoed_unchanged() {
    let addr = start_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let heartbeat = Message::Heartbeat(Heartbeat {
        sequence_number: 42,
    });
    let sent = encode(&heartbeat);
    stream.write_all(&sent).await.unwrap();

    let mut echoed = vec![0u8; sent.len()];
    stream.read_exact(&mut echoed).await.unwrap();
    assert_eq!(echoed, sent);
}

#[tokio::test]
async fn orders_from_two_connections_cross() {
    let addr = start_server().await;
    let mut buyer = TcpStream::connect(addr).await.unwrap();
    let mut seller = TcpStream::connect(addr).await.unwrap();

    send(&mut seller, &limit_order(1, Side::Sell, 150.0, 60)).await;
    match recv(&mut seller).await {
        Message::OrderAck(ack) => assert_eq!(ack.status, OrderStatus::Pending),
        other => panic!("expected ack, got {other:?}"),
    }

    send(&mut buyer, &limit_order(2, Side::Buy, 150.0, 100)).await;
    match recv(&mut buyer).await {
        Message::OrderAck(_) => {}
        other => panic!("expected ack, got {other:?}"),
    }

    // The buyer's order crossed the seller's 60 and rests with 40.
    match recv(&mut buyer).await {
        Message::ExecutionReport(report) => {
            assert_eq!(report.execution_quantity, 60);
            assert_eq!(report.remaining_quantity, 40);
            assert_eq!(report.status, OrderStatus::PartialFill);
        }
        other => panic!("expected execution report, got {other:?}"),
    }
}
