//! Macro for implementing Display and FromStr for small string-backed enums
//!
//! Settings such as the error policy or the display language arrive as plain
//! strings in feed configuration. This macro gives each such enum a single
//! source of truth for its string form.
//!
//! # Example
//!
//! ```rust
//! use calfeed_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum SortOrder {
//!     Newest,
//!     Oldest,
//! }
//!
//! impl_domain_status_conversions!(SortOrder {
//!     Newest => "newest",
//!     Oldest => "oldest",
//! });
//!
//! assert_eq!("NEWEST".parse::<SortOrder>().unwrap(), SortOrder::Newest);
//! assert_eq!(SortOrder::Oldest.to_string(), "oldest");
//! ```

/// Implements Display and FromStr traits for string-backed enums
///
/// This macro generates:
/// - Display trait: converts enum variants to their lowercase strings
/// - FromStr trait: parses case-insensitive, whitespace-trimmed strings
///
/// Parse errors name the enum and echo the rejected input.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
