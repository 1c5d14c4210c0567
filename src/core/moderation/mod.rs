// Core moderation module - the content gate every user-submitted text passes.
// Same layout as the other core features: models, the classifier port, and the service.

pub mod keyword_filter;
pub mod moderation_models;
pub mod moderation_service;

pub use keyword_filter::KeywordFilter;
pub use moderation_models::*;
pub use moderation_service::*;
