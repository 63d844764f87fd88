//! Ports - interfaces to external collaborators.

mod ai_provider;
mod catalog;
mod classifier;
mod conversation_store;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message, MessageRole,
    ProviderInfo, TokenUsage, ToolCall, ToolChoice, ToolDefinition,
};
pub use catalog::{CatalogError, OrderStore, ProductCatalog, ReviewStore};
pub use classifier::{ClassificationError, Classifier};
pub use conversation_store::{ClearOutcome, ConversationStore, StoreError};
