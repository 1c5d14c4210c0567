pub mod openai_client;
pub mod unconfigured;

pub use openai_client::OpenAiModerationClient;
pub use unconfigured::UnconfiguredClassifier;
