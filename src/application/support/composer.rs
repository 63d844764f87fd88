//! Shared model round trip for tool-using handlers.

use std::sync::Arc;

use super::{HandlerReply, ToolHandler, ToolOutcome};
use crate::domain::conversation::{Role, TurnHistory};
use crate::ports::{AIProvider, CompletionRequest, Message, ToolCall, ToolChoice};

/// Reply used when the model fails before any tool ran.
pub const UPSTREAM_APOLOGY: &str =
    "I apologize, but I encountered an error processing your request. Please try again.";

const EMPTY_ANSWER: &str =
    "I'm sorry, I don't have an answer for that. Could you tell me a bit more about what you need?";

/// Plans a tool call with the model, executes it, then has the model phrase
/// the real result.
pub struct Composer {
    provider: Arc<dyn AIProvider>,
    temperature: f32,
    history_window: usize,
}

impl Composer {
    pub fn new(provider: Arc<dyn AIProvider>, temperature: f32, history_window: usize) -> Self {
        Self {
            provider,
            temperature,
            history_window,
        }
    }

    pub async fn respond<H: ToolHandler>(&self, handler: &H, message: &str, history: &TurnHistory) -> HandlerReply {
        let instructions = handler.instructions().await;
        let request = self
            .conversation(&instructions, message, history)
            .with_tools(handler.tools(), ToolChoice::Auto);

        let response = match self.provider.complete(request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(handler_id = %handler.kind(), error = %err, "Model call failed");
                return HandlerReply::upstream();
            }
        };

        let Some(call) = response.tool_call.clone() else {
            return HandlerReply::answered(response.text_content().unwrap_or(EMPTY_ANSWER));
        };

        if !handler.tools().iter().any(|t| t.name() == call.name) {
            tracing::warn!(handler_id = %handler.kind(), tool = %call.name, "Model asked for an unknown tool");
            return HandlerReply::upstream();
        }

        tracing::debug!(handler_id = %handler.kind(), tool = %call.name, "Executing tool");
        match handler.execute(&call).await {
            ToolOutcome::Done { data, rendered, effect } => {
                let text = self.phrase(&instructions, message, history, &call, &data).await;
                let reply = HandlerReply::answered(text.unwrap_or(rendered));
                match effect {
                    Some(effect) => reply.with_side_effect(effect),
                    None => reply,
                }
            }
            ToolOutcome::NotFound(text) => HandlerReply::not_found(text),
            ToolOutcome::Invalid(text) => HandlerReply::invalid(text),
            ToolOutcome::DataAccess(text) => HandlerReply::data_access(text),
        }
    }

    /// Asks the model to word a tool result. `None` when it cannot.
    async fn phrase(
        &self,
        instructions: &str,
        message: &str,
        history: &TurnHistory,
        call: &ToolCall,
        data: &serde_json::Value,
    ) -> Option<String> {
        let prompt = format!(
            "{}\n\nThe {} tool returned this result:\n{}\n\nAnswer the customer using only this result.",
            instructions, call.name, data
        );
        let request = self
            .conversation(&prompt, message, history)
            .with_tools(Vec::new(), ToolChoice::None);

        match self.provider.complete(request).await {
            Ok(response) => response.text_content().map(str::to_string),
            Err(err) => {
                tracing::warn!(tool = %call.name, error = %err, "Phrasing failed, using plain rendering");
                None
            }
        }
    }

    fn conversation(&self, system_prompt: &str, message: &str, history: &TurnHistory) -> CompletionRequest {
        let prior = history.dialogue(self.history_window).into_iter().map(|turn| match turn.role() {
            Role::Assistant => Message::assistant(turn.content()),
            _ => Message::user(turn.content()),
        });
        CompletionRequest::new()
            .with_system_prompt(system_prompt)
            .with_messages(prior)
            .with_messages([Message::user(message)])
            .with_temperature(self.temperature)
    }
}
