//! Interactive CLI client for the matchbook server.

mod commands;
mod connection;
mod demo;

use std::io::Write as _;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tracing_subscriber::EnvFilter;

use matchbook_core::{OrderType, Side};

use crate::commands::Command;
use crate::connection::Connection;

#[derive(Debug, Parser)]
#[command(name = "matchbook-client", about = "Interactive trading client for the matchbook server")]
struct Cli {
    /// Server hostname.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port.
    #[arg(long, default_value_t = 8888)]
    port: u16,

    /// Run the scripted demo before entering interactive mode.
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let addr = format!("{}:{}", cli.host, cli.port);

    println!("========================================");
    println!("  matchbook client");
    println!("========================================");
    println!("\nConnecting to {addr}...");

    let stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {addr}; is the server running?"))?;
    stream.set_nodelay(true)?;
    println!("Connected.\n");

    let (read_half, write_half) = stream.into_split();
    let reader = tokio::spawn(connection::read_loop(read_half));
    let mut conn = Connection::new(write_half);

    if cli.demo {
        demo::run(&mut conn).await?;
    }

    interactive(&mut conn).await?;

    reader.abort();
    println!("Goodbye!");
    Ok(())
}

async fn interactive(conn: &mut Connection) -> anyhow::Result<()> {
    println!("{}", commands::USAGE);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            prompt()?;
            continue;
        }

        match commands::parse(&line) {
            Ok(Command::Quit) => {
                println!("Disconnecting...");
                break;
            }
            Ok(Command::Help) => println!("{}", commands::USAGE),
            Ok(Command::Buy {
                symbol,
                quantity,
                price,
            }) => {
                conn.submit_order(&symbol, Side::Buy, OrderType::Limit, price, quantity)
                    .await?;
            }
            Ok(Command::Sell {
                symbol,
                quantity,
                price,
            }) => {
                conn.submit_order(&symbol, Side::Sell, OrderType::Limit, price, quantity)
                    .await?;
            }
            Ok(Command::MarketBuy { symbol, quantity }) => {
                conn.submit_order(&symbol, Side::Buy, OrderType::Market, 0, quantity)
                    .await?;
            }
            Ok(Command::MarketSell { symbol, quantity }) => {
                conn.submit_order(&symbol, Side::Sell, OrderType::Market, 0, quantity)
                    .await?;
            }
            Ok(Command::Cancel { order_id }) => {
                conn.cancel_order(order_id).await?;
            }
            Ok(Command::Modify {
                order_id,
                price,
                quantity,
            }) => {
                conn.modify_order(order_id, price, quantity).await?;
            }
            Err(message) if message.is_empty() => {}
            Err(message) => println!("{message}"),
        }

        prompt()?;
    }

    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}
