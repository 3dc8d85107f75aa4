//! Infrastructure error conversions

mod conversions;

pub use conversions::{gateway_error, InfraError};
