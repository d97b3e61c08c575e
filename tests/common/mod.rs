//! Integration test common infrastructure.
//!
//! Provides utilities for spawning the compiled server against a scratch
//! SQLite database and talking to it over real HTTP.

pub mod server;

#[allow(unused_imports)]
pub use server::{ADMIN_PASS, ADMIN_USER, TestServer};
