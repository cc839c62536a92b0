// Implementations of the appeal store.

#[cfg(test)]
pub mod in_memory;
pub mod sqlite_store;

// Re-export for convenience
#[cfg(test)]
pub use in_memory::InMemoryAppealStore;
pub use sqlite_store::SqliteAppealStore;
