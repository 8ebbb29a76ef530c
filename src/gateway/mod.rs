//! Model Gateway — one completion call over any supported provider.
//!
//! This module unifies the providers behind a single "send conversation,
//! get completion text" operation:
//! - Closed provider set, selected once at construction
//! - Per-provider URL/header/payload construction (pure mapping)
//! - Rate-limit-aware retry with provider-hinted or exponential backoff
//! - Degraded-text failure mode: callers never see a raw provider error

pub mod client;
pub mod errors;
pub mod provider;
pub mod types;

// Re-exports for convenience
pub use client::{ModelClient, ModelGateway, FALLBACK_MESSAGE};
pub use errors::GatewayError;
pub use provider::Provider;
pub use types::{ChatMessage, ProviderRequest, Role};
