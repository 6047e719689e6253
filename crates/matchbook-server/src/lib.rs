//! matchbook-server
//!
//! Multi-client async TCP server over the binary protocol. Glues together
//! `matchbook-core` and `matchbook-protocol` and exposes
//! [`server::run`] as the entrypoint.

pub mod config;
pub mod server;
pub mod session;
