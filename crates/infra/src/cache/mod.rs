//! Key/value cache adapters
//!
//! Both adapters store entries with their absolute expiry and hand them back
//! as-is; freshness is decided by the pipeline against its own clock.

mod file;
mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;
