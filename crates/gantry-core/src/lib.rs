//! Gantry Core - Domain types and traits for the template service

pub mod authz;
pub mod error;
pub mod ids;
pub mod models;
pub mod traits;

#[cfg(test)]
mod tests;

pub use authz::*;
pub use error::*;
pub use ids::*;
pub use models::*;
pub use traits::*;
