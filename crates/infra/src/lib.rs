//! # calfeed infrastructure
//!
//! Infrastructure implementations of the `calfeed-core` ports, and the feeds
//! themselves.
//!
//! This crate contains:
//! - The reqwest-backed HTTP gateway
//! - In-memory (moka) and JSON file caches
//! - The OpenAI text generator and Jina page reader
//! - Configuration loading
//! - Every feed integration
//!
//! ## Architecture
//! - Implements traits defined in `calfeed-core`
//! - Contains all "impure" code (network, files, environment)

pub mod cache;
pub mod config;
pub mod dates;
pub mod errors;
pub mod http;
pub mod integrations;

pub use cache::{FileCache, MemoryCache};
pub use dates::LocalDateFormatter;
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::default_feeds;
