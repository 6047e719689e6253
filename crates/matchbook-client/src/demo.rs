//! Scripted demo: builds a small AAPL book, crosses it, then fires a
//! market order. Pauses between steps so the event stream reads naturally.

use std::time::Duration;

use tokio::time::sleep;

use matchbook_core::{price_from_f64, OrderType, Side};

use crate::connection::Connection;

pub async fn run(conn: &mut Connection) -> anyhow::Result<()> {
    println!("\nRunning demo mode...\n");
    sleep(Duration::from_millis(500)).await;

    println!("Submitting buy orders...");
    for (price, qty) in [(150.00, 100), (149.50, 200), (149.00, 150)] {
        conn.submit_order("AAPL", Side::Buy, OrderType::Limit, price_from_f64(price), qty)
            .await?;
        sleep(Duration::from_millis(100)).await;
    }

    println!("\nSubmitting sell orders...");
    for (price, qty) in [(151.00, 100), (151.50, 200)] {
        conn.submit_order("AAPL", Side::Sell, OrderType::Limit, price_from_f64(price), qty)
            .await?;
        sleep(Duration::from_millis(100)).await;
    }

    println!("\nSubmitting matching order (should create trades)...");
    conn.submit_order("AAPL", Side::Buy, OrderType::Limit, price_from_f64(151.50), 150)
        .await?;
    sleep(Duration::from_millis(500)).await;

    println!("\nSubmitting market order...");
    conn.submit_order("AAPL", Side::Sell, OrderType::Market, 0, 50)
        .await?;
    sleep(Duration::from_millis(500)).await;

    println!("\nDemo completed.\n");
    Ok(())
}
