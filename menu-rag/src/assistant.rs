//! Per-turn orchestration: retrieve, ground, generate, remember.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::context::{SYSTEM_PROMPT, format_context, grounded_user_message};
use crate::error::{RagError, Result};
use crate::generation::{ChatMessage, CompletionProvider, Role};
use crate::retrieval::{RetrievalEngine, RetrievalResult};
use crate::state::ConversationState;

/// The answer to one user turn.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Generated natural-language recommendation.
    pub response: String,
    /// The structured items the response was grounded on.
    pub results: RetrievalResult,
}

/// Couples a [`RetrievalEngine`] with a [`CompletionProvider`].
///
/// # Example
///
/// ```rust,ignore
/// let assistant = NutritionAssistant::new(Arc::new(engine), Arc::new(chat_model));
/// let mut state = ConversationState::new();
/// let answer = assistant.ask(&mut state, "high protein dinner for cutting").await?;
/// println!("{}", answer.response);
/// ```
pub struct NutritionAssistant {
    engine: Arc<RetrievalEngine>,
    completion_provider: Arc<dyn CompletionProvider>,
}

impl NutritionAssistant {
    pub fn new(
        engine: Arc<RetrievalEngine>,
        completion_provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self { engine, completion_provider }
    }

    pub fn engine(&self) -> &Arc<RetrievalEngine> {
        &self.engine
    }

    /// Answer one query with the configured `top_k`.
    ///
    /// # Errors
    ///
    /// Returns the embedding or completion provider's error when either
    /// collaborator fails. A failed generation records nothing in the
    /// history, though filters detected in `query` stay applied.
    pub async fn ask(&self, state: &mut ConversationState, query: &str) -> Result<Answer> {
        let top_k = self.engine.config().top_k;
        self.ask_with_k(state, query, top_k).await
    }

    /// Answer one query with an explicit number of grounding items.
    pub async fn ask_with_k(
        &self,
        state: &mut ConversationState,
        query: &str,
        k: usize,
    ) -> Result<Answer> {
        let config = self.engine.config();
        let results = self.engine.retrieve(state, query, k).await?;
        let context = format_context(&results);

        let mut messages = Vec::with_capacity(state.history().len() + 2);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        if config.use_history {
            messages.extend(state.history().iter().cloned());
        }
        messages.push(ChatMessage::user(grounded_user_message(&context, query)));

        let response = self
            .completion_provider
            .complete(&messages, &config.generation)
            .await
            .map_err(|e| {
                error!(provider = self.completion_provider.name(), error = %e, "generation failed");
                match e {
                    upstream @ RagError::GenerationError { .. } => upstream,
                    other => RagError::GenerationError {
                        provider: self.completion_provider.name().to_string(),
                        message: other.to_string(),
                    },
                }
            })?;

        if config.use_history {
            state.append_turn(Role::User, query);
            state.append_turn(Role::Assistant, response.clone());
        }

        info!(
            result_count = results.len(),
            history_len = state.history().len(),
            "answered query"
        );
        Ok(Answer { response, results })
    }
}
