//! # NDV Common Library
//!
//! Shared code for the neurodevelopment video tooling:
//! - Bootstrap configuration loading (TOML) and config file resolution
//! - SQLite pool initialization
//! - Raw row models and read queries for videos and the milestone catalog

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
