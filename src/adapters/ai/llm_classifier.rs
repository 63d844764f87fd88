//! Classification collaborator backed by a language model.
//!
//! Forces a `route_to_handler` function call whose `handler_id` parameter is an
//! enum of the enabled handler ids. Confidence and reasoning are logged only.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::conversation::Role;
use crate::domain::routing::ClassificationPrompt;
use crate::ports::{
    AIProvider, ClassificationError, Classifier, CompletionRequest, Message, ToolChoice,
    ToolDefinition,
};

const ROUTE_TOOL: &str = "route_to_handler";
const ROUTE_MAX_TOKENS: u32 = 150;

/// Classifier that asks the language model to pick a handler.
pub struct LlmClassifier {
    provider: Arc<dyn AIProvider>,
    temperature: f32,
}

impl LlmClassifier {
    pub fn new(provider: Arc<dyn AIProvider>, temperature: f32) -> Self {
        Self {
            provider,
            temperature,
        }
    }

    fn route_tool(prompt: &ClassificationPrompt) -> ToolDefinition {
        ToolDefinition::new(
            ROUTE_TOOL,
            "Route the customer's message to the handler best suited to answer it",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "handler_id": {
                        "type": "string",
                        "enum": prompt.candidate_ids(),
                        "description": "Identifier of the selected handler"
                    },
                    "confidence": {
                        "type": "number",
                        "minimum": 0,
                        "maximum": 1,
                        "description": "How sure you are about the choice"
                    },
                    "reasoning": {
                        "type": "string",
                        "description": "One sentence explaining the choice"
                    }
                },
                "required": ["handler_id"]
            }),
        )
    }

    fn build_request(&self, prompt: &ClassificationPrompt) -> CompletionRequest {
        let history = prompt.history.iter().filter_map(|turn| match turn.role() {
            Role::User => Some(Message::user(turn.content())),
            Role::Assistant => Some(Message::assistant(turn.content())),
            Role::System | Role::Error => None,
        });

        CompletionRequest::new()
            .with_system_prompt(prompt.instructions())
            .with_messages(history)
            .with_messages([Message::user(prompt.message.clone())])
            .with_temperature(self.temperature)
            .with_max_tokens(ROUTE_MAX_TOKENS)
            .with_tools(
                vec![Self::route_tool(prompt)],
                ToolChoice::Required(ROUTE_TOOL.to_string()),
            )
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, prompt: &ClassificationPrompt) -> Result<String, ClassificationError> {
        let response = self
            .provider
            .complete(self.build_request(prompt))
            .await
            .map_err(|e| ClassificationError::Upstream(e.to_string()))?;

        if let Some(call) = response.tool_call.as_ref().filter(|c| c.name == ROUTE_TOOL) {
            tracing::debug!(
                handler_id = call.str_arg("handler_id").unwrap_or_default(),
                confidence = call.arguments.get("confidence").and_then(|v| v.as_f64()),
                reasoning = call.str_arg("reasoning").unwrap_or_default(),
                "Classifier tool call"
            );
            return Ok(call.str_arg("handler_id").unwrap_or_default().to_string());
        }

        Ok(response.text_content().unwrap_or_default().to_string())
    }
}
