//! Router - turns a message plus recent history into a routing decision.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::conversation::TurnHistory;
use crate::domain::routing::{
    interpret_classification, ClassificationPrompt, HandlerRegistry, NoMatchReason, RoutingDecision,
};
use crate::ports::{ClassificationError, Classifier};

/// Selects exactly one enabled handler, or no handler, for each message.
///
/// The classifier only ever sees the enabled descriptors and the trailing
/// `window` turns. Classifier errors and timeouts never escape: they become a
/// no-match decision so the conversation carries on through the fallback.
pub struct SupportRouter {
    registry: Arc<HandlerRegistry>,
    classifier: Arc<dyn Classifier>,
    window: usize,
    timeout: Duration,
}

impl SupportRouter {
    pub fn new(
        registry: Arc<HandlerRegistry>,
        classifier: Arc<dyn Classifier>,
        window: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            classifier,
            window,
            timeout,
        }
    }

    /// Builds the prompt the classifier is shown for `message`.
    pub fn prompt_for(&self, message: &str, history: &TurnHistory) -> ClassificationPrompt {
        let candidates = self
            .registry
            .enabled_handlers()
            .into_iter()
            .cloned()
            .collect();
        ClassificationPrompt::new(candidates, history.window(self.window).to_vec(), message)
    }

    /// Routes one message. `history` holds the turns before `message`.
    pub async fn route(&self, message: &str, history: &TurnHistory) -> RoutingDecision {
        let prompt = self.prompt_for(message, history);

        let raw = match tokio::time::timeout(self.timeout, self.classifier.classify(&prompt)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => return self.classifier_failed(err),
            Err(_) => return self.classifier_failed(ClassificationError::Timeout(self.timeout.as_millis() as u64)),
        };

        let decision = interpret_classification(&raw, &self.registry);
        match &decision {
            RoutingDecision::Selected { handler, .. } => {
                tracing::info!(handler_id = %handler, history_turns = prompt.history.len(), "Message routed");
            }
            RoutingDecision::NoMatch(reason) => {
                tracing::info!(decision = "no_match", %reason, raw = %raw, "No handler selected");
            }
        }
        decision
    }

    fn classifier_failed(&self, err: ClassificationError) -> RoutingDecision {
        tracing::warn!(error = %err, "Classifier failed, routing to fallback");
        RoutingDecision::NoMatch(NoMatchReason::ClassifierFailed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::Turn;
    use crate::domain::foundation::HandlerId;
    use crate::domain::routing::{HandlerDescriptor, HandlerKind};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubClassifier {
        answer: Result<String, ClassificationError>,
        delay: Option<Duration>,
        seen: Mutex<Vec<ClassificationPrompt>>,
    }

    impl StubClassifier {
        fn answering(answer: &str) -> Self {
            Self {
                answer: Ok(answer.to_string()),
                delay: None,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                answer: Err(ClassificationError::Upstream("boom".to_string())),
                delay: None,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Classifier for StubClassifier {
        async fn classify(&self, prompt: &ClassificationPrompt) -> Result<String, ClassificationError> {
            self.seen.lock().unwrap().push(prompt.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.answer.clone()
        }
    }

    fn router(classifier: Arc<StubClassifier>, registry: HandlerRegistry, window: usize) -> SupportRouter {
        SupportRouter::new(Arc::new(registry), classifier, window, Duration::from_millis(200))
    }

    fn history_of(n: usize) -> TurnHistory {
        TurnHistory::new((0..n).map(|i| Turn::user(format!("message {}", i)).unwrap()).collect())
    }

    #[tokio::test]
    async fn selects_enabled_handler() {
        let classifier = Arc::new(StubClassifier::answering("orders"));
        let router = router(classifier, HandlerRegistry::with_defaults(), 10);

        let decision = router.route("where is my order?", &TurnHistory::default()).await;

        assert_eq!(decision.selected_kind(), Some(HandlerKind::Orders));
    }

    #[tokio::test]
    async fn classifier_sees_only_trailing_window() {
        let classifier = Arc::new(StubClassifier::answering("reviews"));
        let router = router(classifier.clone(), HandlerRegistry::with_defaults(), 3);

        router.route("any reviews?", &history_of(8)).await;

        let seen = classifier.seen.lock().unwrap();
        assert_eq!(seen[0].history.len(), 3);
        assert_eq!(seen[0].history[0].content(), "message 5");
        assert_eq!(seen[0].message, "any reviews?");
    }

    #[tokio::test]
    async fn classifier_sees_only_enabled_candidates() {
        let mut descriptors: Vec<HandlerDescriptor> =
            HandlerKind::ALL.iter().map(HandlerKind::default_descriptor).collect();
        descriptors[2].enabled = false;
        let classifier = Arc::new(StubClassifier::answering("orders"));
        let router = router(classifier.clone(), HandlerRegistry::new(descriptors).unwrap(), 10);

        let decision = router.route("buy a bed", &TurnHistory::default()).await;

        assert_eq!(
            decision,
            RoutingDecision::NoMatch(NoMatchReason::Disabled(HandlerId::new("orders").unwrap()))
        );
        let seen = classifier.seen.lock().unwrap();
        assert_eq!(seen[0].candidate_ids(), vec!["product_details", "reviews"]);
    }

    #[tokio::test]
    async fn classifier_error_becomes_no_match() {
        let router = router(Arc::new(StubClassifier::failing()), HandlerRegistry::with_defaults(), 10);

        let decision = router.route("hello", &TurnHistory::default()).await;

        assert!(matches!(
            decision,
            RoutingDecision::NoMatch(NoMatchReason::ClassifierFailed(_))
        ));
    }

    #[tokio::test]
    async fn classifier_timeout_becomes_no_match() {
        let classifier = Arc::new(StubClassifier {
            delay: Some(Duration::from_secs(5)),
            ..StubClassifier::answering("orders")
        });
        let router = router(classifier, HandlerRegistry::with_defaults(), 10);

        let decision = router.route("hello", &TurnHistory::default()).await;

        assert!(matches!(
            decision,
            RoutingDecision::NoMatch(NoMatchReason::ClassifierFailed(_))
        ));
    }
}
