//! Domain constants
//!
//! Colours and defaults shared by several feeds.

// Event defaults
pub const DEFAULT_EVENT_COLOR: &str = "#1E90FF";
pub const PLACEHOLDER_COLOR: &str = "#666666";

// Discount tiers, highest first: (minimum percent, colour)
pub const DISCOUNT_COLOR_TIERS: [(u32, &str); 3] =
    [(75, "#E74C3C"), (50, "#E67E22"), (25, "#F39C12")];
pub const DISCOUNT_COLOR_DEFAULT: &str = "#3498DB";

// HTTP defaults
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const USER_AGENT: &str = concat!("calfeed/", env!("CARGO_PKG_VERSION"));

// Cache defaults
pub const MIN_END_OF_DAY_TTL_MINUTES: i64 = 5;
pub const DEFAULT_MEMORY_CACHE_CAPACITY: u64 = 1_000;

/// Colour for a discount percentage
pub fn discount_color(percent: u32) -> &'static str {
    DISCOUNT_COLOR_TIERS
        .iter()
        .find(|(min, _)| percent >= *min)
        .map(|(_, color)| *color)
        .unwrap_or(DISCOUNT_COLOR_DEFAULT)
}
