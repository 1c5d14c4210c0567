pub mod sqlite_board_store;

pub use sqlite_board_store::SqliteBoardStore;
