//! # calfeed domain
//!
//! Domain types shared by every calfeed crate.
//!
//! This crate contains:
//! - The [`CalendarEvent`] record and its validating builder
//! - The [`CalFeedError`] taxonomy and [`Result`] alias
//! - Configuration ([`HostConfig`], [`PluginConfig`], [`ErrorPolicy`], [`Language`])
//! - Shared constants
//!
//! ## Architecture
//! - No dependencies on other calfeed crates
//! - Pure data and validation, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod event;
pub mod language;
pub mod macros;

pub use config::{
    ErrorPolicy, HostConfig, PluginConfig, TextGenerationConfig, ERROR_POLICY_KEY,
};
pub use errors::{CalFeedError, Result};
pub use event::{CalendarEvent, EventBuilder};
pub use language::Language;
