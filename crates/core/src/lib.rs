// Futon Core - Drying lifecycle domain, ports and sweeps
// NO infrastructure dependencies (stores, notifiers and identity are ports)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
