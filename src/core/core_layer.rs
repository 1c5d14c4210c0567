// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "accounts/mod.rs"]
pub mod accounts;

#[path = "board/mod.rs"]
pub mod board;
