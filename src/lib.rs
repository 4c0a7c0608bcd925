//! plexsync - administrative jobs against Plex Media Server
//!
//! This library crate exposes the core functionality for integration testing.

pub mod cleanup;
pub mod config;
pub mod error;
pub mod filter;
pub mod migrate;
pub mod plex;
pub mod scanner;
pub mod shares;
