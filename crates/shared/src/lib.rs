//! Shared configuration for Stowage.
//!
//! This crate provides the configuration types used across the other crates:
//! - Cache medium settings
//! - Storage provider selection
//! - Layered configuration loading

pub mod config;

pub use config::{AppConfig, CacheConfig, StorageProvider};
