//! Repofolio Library
//!
//! This module exposes the cache, upstream client and HTTP surface for use in
//! the binary and in integration tests.

pub mod cache;
pub mod cli;
pub mod data;
pub mod error;
pub mod handlers;
pub mod observability;
pub mod server;
