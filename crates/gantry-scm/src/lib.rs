//! Gantry SCM - connector facade for delegated permission lookups

pub mod client;

pub use client::{ScmClient, ScmConfig};
