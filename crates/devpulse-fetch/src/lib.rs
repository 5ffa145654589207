//! Shared HTTP fetch layer for DevPulse collectors and the enrichment client.
//!
//! Provides [`FetchClient`] (bounded timeout, classified status handling,
//! typed JSON GETs with automatic retry), the [`retry_with_backoff`] helper,
//! and [`Pacer`] — the explicit inter-request pacing policy collectors use as
//! backpressure against shared platform rate limits.

pub mod client;
pub mod error;
pub mod pacer;
pub mod retry;

pub use client::FetchClient;
pub use error::FetchError;
pub use pacer::Pacer;
pub use retry::retry_with_backoff;
