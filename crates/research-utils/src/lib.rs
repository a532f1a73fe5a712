//! Shared utilities for stock-research
//!
//! This crate provides common functionality used across the stock-research
//! workspace: tracing setup and typed lookups of environment configuration.

pub mod config;
pub mod logging;

pub use config::{EnvError, flag_from, parse_from, process_env, string_from};
pub use logging::{LogFormat, init_tracing, init_tracing_with, subscriber};
