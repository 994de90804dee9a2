//! Shared utilities for liq-rs
//!
//! This crate provides common functionality used across the liq-rs workspace,
//! including logging setup and runtime environment detection.

pub mod config;
pub mod logging;

pub use config::{AppConfig, Environment};
pub use logging::{LogFormat, init_tracing};
