//! Gantry API - HTTP route layer for the template service
//!
//! Thin handlers: authenticate the caller, validate input, load the target,
//! run the authorization resolver before anything destructive, delegate
//! persistence to the repositories, and translate outcomes to HTTP.

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod validation;

pub use routes::create_router_with_state;
pub use state::AppState;
