//! Kenni login server.
//!
//! Wires [`kenni_auth`] to PostgreSQL storage and serves the auth routes
//! alongside a few guarded demo pages.

pub mod config;
pub mod observability;
pub mod pages;
pub mod server;

pub use server::{KenniServer, build_app};
