use crate::core::moderation::{ClassifierError, ClassifierVerdict, ModerationClassifier};
use async_trait::async_trait;

/// Stand-in used when no API key is set. Every call goes to the keyword fallback.
pub struct UnconfiguredClassifier;

#[async_trait]
impl ModerationClassifier for UnconfiguredClassifier {
    async fn classify(&self, _text: &str) -> Result<ClassifierVerdict, ClassifierError> {
        Err(ClassifierError::NotConfigured)
    }
}
