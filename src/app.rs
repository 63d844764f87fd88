//! Wiring of the routing engine from configuration and collaborators.

use std::future::Future;
use std::sync::Arc;

use crate::adapters::ai::LlmClassifier;
use crate::application::support::{Collaborators, Composer, HandlerSet};
use crate::application::{ClearSessionHandler, ProcessMessageHandler, SessionGateway, SupportRouter};
use crate::config::{AiConfig, SessionConfig};
use crate::domain::routing::HandlerRegistry;
use crate::ports::{AIProvider, Classifier, ConversationStore};

/// External collaborators the engine runs against.
#[derive(Clone)]
pub struct Dependencies {
    pub store: Arc<dyn ConversationStore>,
    pub collaborators: Collaborators,
    /// Model used to phrase handler replies.
    pub provider: Arc<dyn AIProvider>,
    /// Classification collaborator used by the router.
    pub classifier: Arc<dyn Classifier>,
}

impl Dependencies {
    /// Uses one provider for both classification and replies.
    pub fn with_llm_classifier(
        store: Arc<dyn ConversationStore>,
        collaborators: Collaborators,
        provider: Arc<dyn AIProvider>,
        ai: &AiConfig,
    ) -> Self {
        let classifier = Arc::new(LlmClassifier::new(provider.clone(), ai.routing_temperature));
        Self {
            store,
            collaborators,
            provider,
            classifier,
        }
    }
}

/// Builds the session gateway and everything behind it.
pub fn build_gateway(
    registry: Arc<HandlerRegistry>,
    deps: Dependencies,
    session: &SessionConfig,
    reply_temperature: f32,
) -> SessionGateway {
    let router = SupportRouter::new(
        registry.clone(),
        deps.classifier,
        session.history_window,
        session.classification_timeout(),
    );
    let model = deps.provider.provider_info();
    let composer = Composer::new(deps.provider, reply_temperature, session.reply_history_window);
    let handlers = HandlerSet::new(&registry, deps.collaborators, composer);

    let pipeline = ProcessMessageHandler::new(
        deps.store.clone(),
        Arc::new(router),
        Arc::new(handlers),
        session.context_turns(),
    );
    let clearer = ClearSessionHandler::new(deps.store.clone(), session.welcome());

    tracing::info!(
        handlers = ?registry.enabled_kinds(),
        history_window = session.history_window,
        provider = %model.name,
        model = %model.model,
        "Routing engine ready"
    );
    SessionGateway::new(
        deps.store,
        Arc::new(pipeline),
        Arc::new(clearer),
        session.gateway_settings(),
    )
}

/// Waits for `signal`, then closes every live session connection.
///
/// Used as the server's graceful-shutdown future, so it must stay `Send`.
pub async fn shutdown_on<F>(signal: F, gateway: SessionGateway)
where
    F: Future<Output = ()> + Send,
{
    signal.await;
    let connections = gateway.active_connections().await;
    tracing::info!(connections, "Shutdown requested, closing sessions");
    gateway.shutdown().await;
}
