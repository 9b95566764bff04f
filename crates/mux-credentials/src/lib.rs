//! # Mux Credentials
//!
//! Credential handling for llm-mux:
//! - The host-provided key-value settings store abstraction
//! - Credential pools parsed from delimited store values
//! - The process-wide rotation cursor
//! - The rotation orchestrator that retries transient failures across a pool
//! - Short-lived token minting for service-account credentials

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cursor;
pub mod pool;
pub mod rotation;
pub mod store;
pub mod token;

// Re-export commonly used types
pub use cursor::{CursorStore, InMemoryCursors};
pub use pool::{CredentialPool, Separator};
pub use rotation::with_rotation;
pub use store::{store_credential, MemoryStore, SettingsStore};
pub use token::{ServiceAccountKey, TokenBroker};
