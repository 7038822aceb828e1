//! HTTP listener bootstrap.

mod server;

pub use server::{listen_addr, serve, start_server, ServerError};
