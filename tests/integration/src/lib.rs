//! Integration tests for the llm-mux adapter
//!
//! This crate exercises the adapter end to end against wiremock provider
//! doubles, covering:
//! - Credential rotation and the retryable/terminal failure partition
//! - Wire-format decoding for all three stream shapes
//! - Request bodies as they reach the wire
//! - Bedrock relay routing and SigV4 signing
//! - Vertex service-account token minting, caching, and invalidation
//! - Settings hygiene through the persistence path

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items
pub use fixtures::*;
pub use helpers::*;
pub use mock_providers::*;

#[cfg(test)]
mod bedrock_tests;
#[cfg(test)]
mod rotation_tests;
#[cfg(test)]
mod settings_tests;
#[cfg(test)]
mod streaming_tests;
#[cfg(test)]
mod vertex_tests;
