// Moderation service - decides whether user text may be published.
//
// Three tiers, consulted in order:
// - An LRU cache of earlier classifier verdicts, keyed by the exact text
// - The remote classifier (injected through the ModerationClassifier port)
// - The local keyword filter, whenever the classifier can't answer
//
// Only classifier verdicts are cached. After a fallback answer the next request
// for the same text goes back to the classifier.
//
// NO HTTP or database dependencies here - just the policy.

use super::keyword_filter::KeywordFilter;
use super::moderation_models::{
    ClassifierVerdict, DecisionSource, ModerationConfig, ModerationDecision,
};
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Classifier rate limit reached")]
    RateLimited,

    #[error("Classifier did not answer within {0:?}")]
    Timeout(Duration),

    #[error("No classifier configured")]
    NotConfigured,

    #[error("Classifier API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected classifier response: {0}")]
    InvalidResponse(String),
}

// ============================================================================
// CLASSIFIER TRAIT (PORT)
// ============================================================================

/// A remote content classifier.
///
/// Implementations report failures as errors; the service decides what to do
/// with them. Any error sends the request down the keyword fallback path.
#[async_trait]
pub trait ModerationClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassifierVerdict, ClassifierError>;
}

// Lets the composition root pick the provider at runtime (OpenAI or nothing)
#[async_trait]
impl ModerationClassifier for Box<dyn ModerationClassifier> {
    async fn classify(&self, text: &str) -> Result<ClassifierVerdict, ClassifierError> {
        (**self).classify(text).await
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct ModerationService<C: ModerationClassifier> {
    classifier: C,
    fallback: KeywordFilter,
    classifier_timeout: Duration,
    // Held only for the lookup/insert itself, never across an await
    cache: Mutex<LruCache<String, bool>>,
}

impl<C: ModerationClassifier> ModerationService<C> {
    pub fn new(classifier: C, config: &ModerationConfig) -> Self {
        Self::with_fallback(classifier, KeywordFilter::default(), config)
    }

    pub fn with_fallback(classifier: C, fallback: KeywordFilter, config: &ModerationConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            classifier,
            fallback,
            classifier_timeout: config.classifier_timeout,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Gate entry point: true when `text` may be published. Never fails.
    pub async fn is_safe(&self, text: &str) -> bool {
        self.check(text).await.safe
    }

    /// Run `text` through cache, classifier and fallback, reporting which tier answered.
    pub async fn check(&self, text: &str) -> ModerationDecision {
        if let Some(safe) = self.cached(text) {
            return ModerationDecision::new(safe, DecisionSource::Cache);
        }

        let outcome = match tokio::time::timeout(
            self.classifier_timeout,
            self.classifier.classify(text),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ClassifierError::Timeout(self.classifier_timeout)),
        };

        match outcome {
            Ok(verdict) => {
                let safe = !verdict.flagged;
                if verdict.flagged {
                    tracing::info!(categories = ?verdict.categories, "Classifier flagged content");
                }
                self.remember(text, safe);
                ModerationDecision::new(safe, DecisionSource::Classifier)
            }
            Err(ClassifierError::NotConfigured) => {
                tracing::debug!("No moderation classifier configured, using local fallback");
                self.fallback_decision(text)
            }
            Err(ClassifierError::RateLimited) => {
                tracing::warn!("Moderation rate limit reached, using local fallback");
                self.fallback_decision(text)
            }
            Err(err) => {
                tracing::warn!("Moderation failed: {}", err);
                self.fallback_decision(text)
            }
        }
    }

    /// Number of texts currently remembered.
    pub fn cache_len(&self) -> usize {
        self.lock_cache().len()
    }

    fn fallback_decision(&self, text: &str) -> ModerationDecision {
        let safe = match self.fallback.first_match(text) {
            Some(term) => {
                tracing::debug!(term, "Keyword fallback rejected content");
                false
            }
            None => true,
        };
        ModerationDecision::new(safe, DecisionSource::Fallback)
    }

    fn cached(&self, text: &str) -> Option<bool> {
        // `get` also marks the entry as most recently used
        self.lock_cache().get(text).copied()
    }

    fn remember(&self, text: &str, safe: bool) {
        self.lock_cache().put(text.to_string(), safe);
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, LruCache<String, bool>> {
        // Poisoning is recovered: no critical section leaves the map half-written
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behaviour {
        /// Flag exactly the listed texts
        Flags(HashSet<String>),
        RateLimited,
        Broken,
        Hangs,
    }

    /// Scripted classifier that counts how often it is consulted
    struct FakeClassifier {
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl FakeClassifier {
        fn flagging(texts: &[&str]) -> Self {
            Self::with(Behaviour::Flags(
                texts.iter().map(|t| t.to_string()).collect(),
            ))
        }

        fn with(behaviour: Behaviour) -> Self {
            Self {
                behaviour,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModerationClassifier for FakeClassifier {
        async fn classify(&self, text: &str) -> Result<ClassifierVerdict, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behaviour {
                Behaviour::Flags(flagged) if flagged.contains(text) => {
                    Ok(ClassifierVerdict::flagged(vec!["harassment".to_string()]))
                }
                Behaviour::Flags(_) => Ok(ClassifierVerdict::clean()),
                Behaviour::RateLimited => Err(ClassifierError::RateLimited),
                Behaviour::Broken => Err(ClassifierError::Api {
                    status: 500,
                    body: "upstream exploded".to_string(),
                }),
                Behaviour::Hangs => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(ClassifierVerdict::clean())
                }
            }
        }
    }

    #[async_trait]
    impl ModerationClassifier for std::sync::Arc<FakeClassifier> {
        async fn classify(&self, text: &str) -> Result<ClassifierVerdict, ClassifierError> {
            (**self).classify(text).await
        }
    }

    fn service(classifier: FakeClassifier) -> ModerationService<FakeClassifier> {
        ModerationService::new(classifier, &ModerationConfig::default())
    }

    #[tokio::test]
    async fn test_flagged_text_is_unsafe() {
        let service = service(FakeClassifier::flagging(&["you are awful"]));

        let decision = service.check("you are awful").await;

        assert!(!decision.safe);
        assert_eq!(decision.source, DecisionSource::Classifier);
    }

    #[tokio::test]
    async fn test_classifier_overrides_keyword_list() {
        // The classifier is authoritative when it answers, even for text the
        // keyword list would reject
        let service = service(FakeClassifier::flagging(&[]));

        assert!(service.is_safe("my diet starts monday").await);
    }

    #[tokio::test]
    async fn test_repeated_text_is_served_from_cache() {
        let service = service(FakeClassifier::flagging(&["bad words"]));

        assert!(!service.is_safe("bad words").await);
        let second = service.check("bad words").await;

        assert!(!second.safe);
        assert_eq!(second.source, DecisionSource::Cache);
        assert_eq!(service.classifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_is_keyed_by_exact_text() {
        let service = service(FakeClassifier::flagging(&[]));

        service.check("Hello").await;
        let decision = service.check("hello").await;

        assert_eq!(decision.source, DecisionSource::Classifier);
        assert_eq!(service.classifier.calls(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_falls_back_to_keywords() {
        let service = service(FakeClassifier::with(Behaviour::RateLimited));

        let unsafe_decision = service.check("I want to DIE").await;
        let safe_decision = service.check("see you at the library").await;

        assert_eq!(
            unsafe_decision,
            ModerationDecision::new(false, DecisionSource::Fallback)
        );
        assert_eq!(
            safe_decision,
            ModerationDecision::new(true, DecisionSource::Fallback)
        );
    }

    #[tokio::test]
    async fn test_other_failures_fall_back_to_keywords() {
        let service = service(FakeClassifier::with(Behaviour::Broken));

        assert!(!service.is_safe("bring a KNIFE").await);
        assert!(service.is_safe("bring snacks").await);
    }

    #[tokio::test]
    async fn test_fallback_decisions_are_not_cached() {
        let service = service(FakeClassifier::with(Behaviour::RateLimited));

        service.check("quiet afternoon").await;
        service.check("quiet afternoon").await;

        assert_eq!(service.cache_len(), 0);
        assert_eq!(service.classifier.calls(), 2);
    }

    #[tokio::test]
    async fn test_slow_classifier_times_out_into_fallback() {
        let config = ModerationConfig {
            classifier_timeout: Duration::from_millis(20),
            ..ModerationConfig::default()
        };
        let service = ModerationService::new(FakeClassifier::with(Behaviour::Hangs), &config);

        let decision = service.check("stab").await;

        assert_eq!(decision, ModerationDecision::new(false, DecisionSource::Fallback));
    }

    #[tokio::test]
    async fn test_cache_evicts_least_recently_used() {
        let classifier = std::sync::Arc::new(FakeClassifier::flagging(&[]));
        let config = ModerationConfig {
            cache_capacity: 2,
            ..ModerationConfig::default()
        };
        let service = ModerationService::new(classifier.clone(), &config);

        service.check("a").await;
        service.check("b").await;
        // Touch "a" so "b" becomes the eviction candidate
        assert_eq!(service.check("a").await.source, DecisionSource::Cache);
        service.check("c").await;

        assert_eq!(service.cache_len(), 2);
        assert_eq!(service.check("a").await.source, DecisionSource::Cache);
        assert_eq!(service.check("c").await.source, DecisionSource::Cache);
        assert_eq!(service.check("b").await.source, DecisionSource::Classifier);
        assert_eq!(classifier.calls(), 4);
    }

    #[tokio::test]
    async fn test_zero_capacity_still_caches_one_entry() {
        let config = ModerationConfig {
            cache_capacity: 0,
            ..ModerationConfig::default()
        };
        let service = ModerationService::new(FakeClassifier::flagging(&[]), &config);

        service.check("x").await;

        assert_eq!(service.cache_len(), 1);
    }

    #[tokio::test]
    async fn test_boxed_classifier_delegates() {
        let boxed: Box<dyn ModerationClassifier> = Box::new(FakeClassifier::flagging(&["nope"]));
        let service = ModerationService::new(boxed, &ModerationConfig::default());

        assert!(!service.is_safe("nope").await);
        assert!(service.is_safe("yes").await);
    }
}
