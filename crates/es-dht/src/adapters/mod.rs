//! Adapters Layer - concrete implementations of the outbound ports

mod config;
mod memory;

pub use config::{StaticConfigProvider, TomlConfigProvider};
pub use memory::MemoryValueStore;
