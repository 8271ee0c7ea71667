//! JSON-RPC API Layer
//!
//! Exposes the sweeps and lifecycle operations as JSON-RPC 2.0 methods over
//! HTTP on localhost.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use server::{RpcServer, RpcServerConfig};
