// Core accounts module - registration, credential checks and sessions.

pub mod account_models;
pub mod account_service;

pub use account_models::*;
pub use account_service::*;
