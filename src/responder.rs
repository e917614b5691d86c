//! # Conversational responder
//!
//! Assembles the chat prompt (fixed system preamble + optional conversation
//! history + the retrieved context and query), makes a single blocking request
//! to an OpenAI-compatible chat endpoint, and tracks the exchange in a bounded
//! history.
//!
//! ## History convention
//! On every successful invocation **both** turns are appended: the user turn
//! stores the bare query (not the rendered context, which is rebuilt fresh each
//! turn), then the assistant turn stores the answer. M successful calls grow
//! the history by exactly 2M turns, before token-budget eviction. On failure
//! the history is left untouched.
//!
//! The history is capped by a token budget (`cl100k_base` counting); when the
//! budget is exceeded the oldest turns are evicted first. The system preamble
//! is not part of the history and is never evicted.

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequestArgs, Role,
    },
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tiktoken_rs::cl100k_base;
use tracing::{debug, error};

use crate::config::LorekeeperConfig;
use crate::error::{LoreError, Result};

/// Instructions the model always receives, ahead of any history or context.
const SYSTEM_PREAMBLE: &str = "You are an AI assistant that helps people find information. \
    Answer the following questions as best you can, using only the relevant data provided. \
    If you don't know the answer just say that you don't know. \
    Use three sentences maximum. \
    Keep the answer as short as possible. \
    Only answer the question.";

/// A single conversational turn (role + content).
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: String) -> Self {
        Self { role, content }
    }
}

/// Stateful bridge to the language model.
pub struct ConversationalResponder {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u16,
    stop_words: Vec<String>,
    history_enabled: bool,
    history_max_tokens: u16,
    history: VecDeque<ConversationTurn>,
}

impl ConversationalResponder {
    /// Build a responder (and its API client) from the application config.
    ///
    /// The history starts empty and lives exactly as long as the responder.
    pub fn new(config: &LorekeeperConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.api_key.clone())
            .with_api_base(config.api_base.clone());

        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            max_tokens: config.context_max_tokens,
            stop_words: config.stop_words.clone(),
            history_enabled: config.history_enabled,
            history_max_tokens: config.history_max_tokens,
            history: VecDeque::new(),
        }
    }

    /// Ask the model one question against the retrieved context.
    ///
    /// Single blocking request, no retries. On success the exchange is appended
    /// to the history; on failure the history is left unmodified and a tagged
    /// error is returned.
    #[allow(deprecated)]
    pub async fn invoke(&mut self, query: &str, context: &str) -> Result<String> {
        let messages = self.build_prompt(query, context);

        let mut args = CreateChatCompletionRequestArgs::default();
        args.max_tokens(self.max_tokens)
            .model(self.model.clone())
            .messages(messages);
        if !self.stop_words.is_empty() {
            args.stop(self.stop_words.clone());
        }
        let request = args.build()?;

        debug!("Sending request: {:?}", request);

        let response = match self.client.chat().create(request).await {
            Ok(response) => response,
            Err(err) => {
                error!("Error occurred while calling the language model: {err}");
                return Err(err.into());
            }
        };

        let mut answer = String::new();
        for choice in response.choices {
            if let Some(content) = choice.message.content {
                answer.push_str(&content);
            }
        }
        if answer.is_empty() {
            error!("The language model returned no content");
            return Err(LoreError::EmptyCompletion);
        }

        self.history
            .push_back(ConversationTurn::new(Role::User, query.to_string()));
        self.history
            .push_back(ConversationTurn::new(Role::Assistant, answer.clone()));
        self.enforce_history_budget();

        Ok(answer)
    }

    /// Build the ordered prompt turns for one invocation.
    ///
    /// Shape: system preamble, then the replayed history (when enabled), then
    /// the templated final turn carrying the retrieved context and the query.
    #[allow(deprecated)]
    fn build_prompt(&self, query: &str, context: &str) -> Vec<ChatCompletionRequestMessage> {
        let mut messages = vec![ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(
                    SYSTEM_PREAMBLE.to_string(),
                ),
                name: None,
            },
        )];

        if self.history_enabled {
            for turn in &self.history {
                let message = match turn.role {
                    Role::User => ChatCompletionRequestMessage::User(
                        ChatCompletionRequestUserMessage {
                            content: ChatCompletionRequestUserMessageContent::Text(
                                turn.content.clone(),
                            ),
                            name: None,
                        },
                    ),
                    Role::Assistant => ChatCompletionRequestMessage::Assistant(
                        ChatCompletionRequestAssistantMessage {
                            content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                                turn.content.clone(),
                            )),
                            name: None,
                            refusal: None,
                            audio: None,
                            tool_calls: None,
                            function_call: None,
                        },
                    ),
                    _ => continue,
                };
                messages.push(message);
            }
        }

        messages.push(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(format!(
                    "Relevant Data: {context}\nQuery: {query}"
                )),
                name: None,
            },
        ));

        messages
    }

    /// Evict oldest turns until the history fits its token budget.
    fn enforce_history_budget(&mut self) {
        let bpe = cl100k_base().unwrap();
        while !self.history.is_empty() {
            let history_tokens: usize = self
                .history
                .iter()
                .map(|turn| bpe.encode_with_special_tokens(&turn.content).len())
                .sum();
            if history_tokens <= self.history_max_tokens as usize {
                break;
            }
            tracing::info!("History over budget, removing oldest turn");
            self.history.pop_front();
        }
    }

    /// The turns recorded so far (oldest first).
    pub fn history(&self) -> &VecDeque<ConversationTurn> {
        &self.history
    }
}
