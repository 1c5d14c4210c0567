// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "database.rs"]
pub mod database;

#[path = "accounts/mod.rs"]
pub mod accounts;

#[path = "board/mod.rs"]
pub mod board;

#[path = "moderation/mod.rs"]
pub mod moderation;
