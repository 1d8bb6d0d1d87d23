//! PostgreSQL database layer for Gantry

pub mod pool;
pub mod repositories;

pub use pool::{create_pool, DatabaseConfig};
pub use repositories::*;
