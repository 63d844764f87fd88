//! Shared fixtures: a keyword classifier and an in-memory engine.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use support_router::adapters::ai::MockAIProvider;
use support_router::adapters::storage::{CatalogSeed, InMemoryCatalog, InMemoryConversationStore};
use support_router::app::{build_gateway, Dependencies};
use support_router::application::support::Collaborators;
use support_router::application::{SessionConnection, SessionEvent, SessionGateway};
use support_router::config::SessionConfig;
use support_router::domain::conversation::Turn;
use support_router::domain::foundation::SessionId;
use support_router::domain::routing::{ClassificationPrompt, HandlerRegistry};
use support_router::ports::{ClassificationError, Classifier};

/// Routes on keywords in the current message only, so decisions do not depend
/// on how much history it is shown.
///
/// Messages containing "slow" take `delay` to classify. Tracks how many
/// classifications run at once.
#[derive(Default)]
pub struct KeywordClassifier {
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    prompts: Mutex<Vec<ClassificationPrompt>>,
}

impl KeywordClassifier {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn answer_for(message: &str) -> &'static str {
        let message = message.to_lowercase();
        if message.contains("billing") {
            "billing"
        } else if message.contains("order") {
            "orders"
        } else if message.contains("review") {
            "reviews"
        } else {
            "product_details"
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<ClassificationPrompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, prompt: &ClassificationPrompt) -> Result<String, ClassificationError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.clone());

        if prompt.message.contains("slow") {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(Self::answer_for(&prompt.message).to_string())
    }
}

pub fn seeded_catalog() -> InMemoryCatalog {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/catalog.yaml");
    InMemoryCatalog::from_seed(CatalogSeed::from_file(path).expect("seed catalog"))
}

/// The whole engine over in-memory collaborators.
pub struct Harness {
    pub store: Arc<InMemoryConversationStore>,
    pub catalog: Arc<InMemoryCatalog>,
    pub provider: MockAIProvider,
    pub classifier: Arc<KeywordClassifier>,
    pub gateway: SessionGateway,
}

impl Harness {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            session: SessionConfig::default(),
            registry: HandlerRegistry::with_defaults(),
            provider: MockAIProvider::echoing(),
            classifier: KeywordClassifier::default(),
        }
    }

    pub async fn stored(&self, session: &SessionId) -> Vec<Turn> {
        self.gateway
            .history(session.clone(), 200)
            .await
            .map(|h| h.into_vec())
            .unwrap_or_default()
    }
}

pub struct HarnessBuilder {
    session: SessionConfig,
    registry: HandlerRegistry,
    provider: MockAIProvider,
    classifier: KeywordClassifier,
}

impl HarnessBuilder {
    pub fn session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    pub fn history_window(mut self, window: usize) -> Self {
        self.session.history_window = window;
        self
    }

    pub fn registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn provider(mut self, provider: MockAIProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn classifier(mut self, classifier: KeywordClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn build(self) -> Harness {
        let store = Arc::new(InMemoryConversationStore::new());
        let catalog = Arc::new(seeded_catalog());
        let classifier = Arc::new(self.classifier);
        let deps = Dependencies {
            store: store.clone(),
            collaborators: Collaborators {
                products: catalog.clone(),
                reviews: catalog.clone(),
                orders: catalog.clone(),
            },
            provider: Arc::new(self.provider.clone()),
            classifier: classifier.clone(),
        };
        let gateway = build_gateway(Arc::new(self.registry), deps, &self.session, 0.7);
        Harness {
            store,
            catalog,
            provider: self.provider,
            classifier,
            gateway,
        }
    }
}

pub fn session(id: &str) -> SessionId {
    SessionId::parse(id).unwrap()
}

/// Next delivered turn, skipping status events. Panics if the connection
/// closes or nothing arrives within five seconds.
pub async fn next_turn(conn: &mut SessionConnection) -> Turn {
    let wait = async {
        loop {
            match conn.next_event().await {
                Some(SessionEvent::Turn(turn)) => return turn,
                Some(SessionEvent::Status(_)) => continue,
                None => panic!("connection closed"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("no turn delivered in time")
}
