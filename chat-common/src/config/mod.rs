//! Configuration shared across crates.
//!
//! Kept small and composed by value into each component's own config struct
//! (see `SpoolConfig`-style enums in `chat-store`/`chat-cache`/`chat-queue`)
//! rather than a single god-object, so each crate can be configured and
//! tested independently.

pub mod timeouts;

pub use timeouts::SessionTimeouts;
