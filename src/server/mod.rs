//! Connection acceptance and lifetime tracking.

pub mod listener;
pub mod registry;
pub mod shutdown;

pub use registry::{ConnectionRegistry, RegistryError};
