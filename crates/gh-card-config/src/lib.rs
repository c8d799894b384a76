//! Configuration and file management for gh-card
//!
//! This crate provides:
//! - File path utilities for the data and cache files
//! - Configuration file loading (TOML)
//! - Application configuration (AppConfig)

pub mod app_config;
pub mod config_file;
pub mod paths;

pub use app_config::{AppConfig, CacheConfig};
pub use config_file::load_config_file;
pub use paths::{data_dir, default_database_path, default_remote_cache_path};
