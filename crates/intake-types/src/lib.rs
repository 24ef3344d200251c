//! Common types module for the order-intake bot.
//!
//! This module defines the data model shared by every other crate: orders and
//! their status, inbound transport events, outbound messages with their
//! keyboards, and the configuration validation primitives used by pluggable
//! backends.

/// Inbound transport events and user identity.
pub mod events;
/// Outbound messages, text formatting and keyboard layouts.
pub mod message;
/// Order records and their lifecycle status.
pub mod order;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Redacting wrapper for credentials.
pub mod secret_string;
/// Configuration validation types for pluggable backends.
pub mod validation;

// Re-export all types for convenient access
pub use events::*;
pub use message::*;
pub use order::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use validation::*;
