//! Stub implementations for development and testing.

mod in_memory_effort_store;

pub use in_memory_effort_store::InMemoryEffortStore;
