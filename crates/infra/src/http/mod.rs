//! HTTP client and gateway adapter

mod client;

pub use client::{HttpClient, HttpClientBuilder};
