//! # calfeed app
//!
//! Host layer: builds the feed registry and the shared feed context from the
//! host configuration, and exposes the commands the CLI runs.
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires concrete adapters into the ports `core` defines
//! - `main.rs` is a thin front end over [`cli`] and [`commands`]

pub mod cli;
pub mod commands;
pub mod context;
pub mod utils;

pub use commands::{list_feeds, parse_setting, run_feed, FeedSummary};
pub use context::AppContext;
