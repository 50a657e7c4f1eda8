//! API endpoint handlers.
//!
//! Handlers move the blocking pipeline onto tokio's blocking pool.

pub mod ask;
pub mod diagnose;
pub mod health;
