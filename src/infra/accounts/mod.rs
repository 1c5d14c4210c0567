pub mod in_memory_sessions;
pub mod sqlite_user_store;

pub use in_memory_sessions::InMemorySessionStore;
pub use sqlite_user_store::SqliteUserStore;
