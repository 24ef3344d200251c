//! Registry trait for self-registering implementations.
//!
//! Every pluggable backend module exposes a `Registry` struct implementing
//! this trait so the service can look it up by its configuration name.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. "postgres" for `[storage.implementations.postgres]`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
