pub mod sqlite_session_store;

pub use sqlite_session_store::SqliteSessionStore;
