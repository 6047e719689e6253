//! Interactive command parsing.

use matchbook_core::{price_from_f64, Price, Quantity};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Buy {
        symbol: String,
        quantity: Quantity,
        price: Price,
    },
    Sell {
        symbol: String,
        quantity: Quantity,
        price: Price,
    },
    MarketBuy {
        symbol: String,
        quantity: Quantity,
    },
    MarketSell {
        symbol: String,
        quantity: Quantity,
    },
    Cancel {
        order_id: u64,
    },
    Modify {
        order_id: u64,
        price: Price,
        quantity: Quantity,
    },
    Help,
    Quit,
}

pub const USAGE: &str = "\
Available commands:
  buy <symbol> <quantity> <price>       - Submit a buy limit order
  sell <symbol> <quantity> <price>      - Submit a sell limit order
  market-buy <symbol> <quantity>        - Submit a market buy order
  market-sell <symbol> <quantity>       - Submit a market sell order
  cancel <order_id>                     - Cancel an order
  modify <order_id> <price> <quantity>  - Modify an order
  help                                  - Show this help message
  quit                                  - Disconnect and exit
";

/// Parse one input line into a command; the error is a message to show.
pub fn parse(line: &str) -> Result<Command, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let command = match tokens.first() {
        Some(c) => *c,
        None => return Err(String::new()),
    };

    match command {
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "buy" | "sell" => {
            if tokens.len() != 4 {
                return Err(format!("Usage: {command} <symbol> <quantity> <price>"));
            }
            let symbol = tokens[1].to_string();
            let quantity = parse_quantity(tokens[2])?;
            let price = parse_price(tokens[3])?;
            if command == "buy" {
                Ok(Command::Buy {
                    symbol,
                    quantity,
                    price,
                })
            } else {
                Ok(Command::Sell {
                    symbol,
                    quantity,
                    price,
                })
            }
        }
        "market-buy" | "market-sell" => {
            if tokens.len() != 3 {
                return Err(format!("Usage: {command} <symbol> <quantity>"));
            }
            let symbol = tokens[1].to_string();
            let quantity = parse_quantity(tokens[2])?;
            if command == "market-buy" {
                Ok(Command::MarketBuy { symbol, quantity })
            } else {
                Ok(Command::MarketSell { symbol, quantity })
            }
        }
        "cancel" => {
            if tokens.len() != 2 {
                return Err("Usage: cancel <order_id>".to_string());
            }
            let order_id = parse_id(tokens[1])?;
            Ok(Command::Cancel { order_id })
        }
        "modify" => {
            if tokens.len() != 4 {
                return Err("Usage: modify <order_id> <price> <quantity>".to_string());
            }
            let order_id = parse_id(tokens[1])?;
            let price = parse_price(tokens[2])?;
            let quantity = parse_quantity(tokens[3])?;
            Ok(Command::Modify {
                order_id,
                price,
                quantity,
            })
        }
        other => Err(format!(
            "Unknown command: {other}\nType 'help' for available commands"
        )),
    }
}

fn parse_quantity(token: &str) -> Result<Quantity, String> {
    token
        .parse::<Quantity>()
        .map_err(|_| format!("Invalid quantity: {token}"))
}

fn parse_price(token: &str) -> Result<Price, String> {
    token
        .parse::<f64>()
        .map(price_from_f64)
        .map_err(|_| format!("Invalid price: {token}"))
}

fn parse_id(token: &str) -> Result<u64, String> {
    token
        .parse::<u64>()
        .map_err(|_| format!("Invalid order id: {token}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_limit_orders() {
        assert_eq!(
            parse("buy AAPL 100 150.25"),
            Ok(Command::Buy {
                symbol: "AAPL".to_string(),
                quantity: 100,
                price: price_from_f64(150.25),
            })
        );
        assert_eq!(
            parse("sell MSFT 50 300"),
            Ok(Command::Sell {
                symbol: "MSFT".to_string(),
                quantity: 50,
                price: price_from_f64(300.0),
            })
        );
    }

    #[test]
    fn parses_market_orders_without_price() {
        assert_eq!(
            parse("market-sell AAPL 25"),
            Ok(Command::MarketSell {
                symbol: "AAPL".to_string(),
                quantity: 25,
            })
        );
    }

    #[test]
    fn parses_cancel_and_modify() {
        assert_eq!(parse("cancel 7"), Ok(Command::Cancel { order_id: 7 }));
        assert_eq!(
            parse("modify 7 151.5 80"),
            Ok(Command::Modify {
                order_id: 7,
                price: price_from_f64(151.5),
                quantity: 80,
            })
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse("buy AAPL 100").is_err());
        assert!(parse("cancel notanumber").is_err());
        assert!(parse("frobnicate").is_err());
    }
}
