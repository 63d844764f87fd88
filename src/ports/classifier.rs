//! Classification collaborator port.
//!
//! Given the structured classification prompt, returns a raw handler
//! identifier as produced by the collaborator. The router validates it.

use async_trait::async_trait;

use crate::domain::routing::ClassificationPrompt;

/// Failures of the classification collaborator. Always recovered as no-match.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClassificationError {
    #[error("classifier timed out after {0}ms")]
    Timeout(u64),

    #[error("classifier upstream failure: {0}")]
    Upstream(String),
}

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Returns the raw identifier text. Empty means the collaborator had no answer.
    async fn classify(&self, prompt: &ClassificationPrompt) -> Result<String, ClassificationError>;
}
