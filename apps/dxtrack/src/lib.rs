//! # dxtrack Library
//!
//! This library exposes the dxtrack modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod config;
pub mod feed;
pub mod narrative;

// Re-export dxtrack_core for convenience
pub use dxtrack_core;
