//! Snapshot backends.

pub mod file;
pub mod memory;

pub use file::JsonFileSnapshot;
pub use memory::InMemorySnapshot;
