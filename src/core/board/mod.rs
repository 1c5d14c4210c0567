pub mod board_models;
pub mod board_service;
pub mod board_store;

pub use board_models::*;
pub use board_service::{BoardError, BoardService};
pub use board_store::BoardStore;
