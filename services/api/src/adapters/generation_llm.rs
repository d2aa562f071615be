//! services/api/src/adapters/generation_llm.rs
//!
//! This module contains the adapter for the counselor reply LLM.
//! It implements the `TextGenerationService` port from the `core` crate against any
//! OpenAI-compatible chat endpoint (Gemini's, by default).

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use counsel_core::ports::{PortError, PortResult, TextGenerationService};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TextGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiGenerationAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiGenerationAdapter {
    /// Creates a new `OpenAiGenerationAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// Separates "could not reach the service" from "the service sent something we can't use".
fn map_openai_error(e: OpenAIError) -> PortError {
    match e {
        OpenAIError::Reqwest(_) | OpenAIError::ApiError(_) => PortError::Unavailable(e.to_string()),
        OpenAIError::JSONDeserialize(_) => PortError::MalformedResponse(e.to_string()),
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// `TextGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextGenerationService for OpenAiGenerationAdapter {
    /// Sends the whole templated prompt as one user message; no history is passed.
    async fn generate(&self, prompt: &str) -> PortResult<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        // Extract the text content from the first choice in the response.
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::MalformedResponse("Generation response contained no text content.".to_string())
            })?;

        let text = text.trim();
        if text.is_empty() {
            return Err(PortError::MalformedResponse(
                "Generation response was empty.".to_string(),
            ));
        }
        Ok(text.to_string())
    }
}
