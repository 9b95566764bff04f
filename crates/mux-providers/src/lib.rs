//! # Mux Providers
//!
//! Provider integration for llm-mux: the per-provider profile table, the
//! request-body formatter, the auth schemes, and the [`Mux`] adapter facade
//! that runs a completion end to end.
//!
//! Seven providers share four wire formats and five auth schemes. A
//! [`ProviderProfile`] captures everything that differs between them; the
//! adapter code itself is provider-agnostic and branches only on profile
//! fields.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod auth;
pub mod format;
pub mod profile;

pub use adapter::Mux;
pub use auth::AwsCredential;
pub use format::{format_body, GenerationConfig};
pub use profile::{AuthScheme, ProviderKind, ProviderProfile, WireFormat};
