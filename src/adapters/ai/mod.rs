//! AI Adapters.
//!
//! - `OpenAIProvider` - OpenAI chat completions with function calling
//! - `MockAIProvider` - Scripted provider for tests and offline runs
//! - `LlmClassifier` - Classification collaborator built on any `AIProvider`

mod llm_classifier;
mod mock_provider;
mod openai_provider;

pub use llm_classifier::LlmClassifier;
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
