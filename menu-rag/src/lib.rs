//! Retrieval-augmented menu recommendations for campus dining.
//!
//! This crate provides:
//! - Catalog loading for menu items and their precomputed embeddings
//! - Rule-based intent extraction (dietary needs, goals, restaurant filters)
//! - Per-session conversation state with sticky filters
//! - A retrieval engine combining cosine similarity, hard filters and
//!   goal-conditioned re-ranking
//! - An assistant that grounds a chat model on the retrieved items
//!
//! Embedding and chat models are plugged in through [`EmbeddingProvider`]
//! and [`CompletionProvider`]. OpenAI-backed implementations live in the
//! [`openai`] module behind the `openai` feature.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use menu_rag::{CatalogIndex, ConversationState, NutritionAssistant, RagConfig, RetrievalEngine};
//!
//! let catalog = CatalogIndex::load("menu_items.json", "embeddings.json")?;
//! let engine = RetrievalEngine::builder()
//!     .config(RagConfig::default())
//!     .catalog(Arc::new(catalog))
//!     .embedding_provider(embedder)
//!     .build()?;
//! let assistant = NutritionAssistant::new(Arc::new(engine), chat_model);
//!
//! let mut state = ConversationState::new();
//! let answer = assistant.ask(&mut state, "vegan lunch, not at sprout").await?;
//! ```

pub mod assistant;
pub mod catalog;
pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod intent;
pub mod meal;
pub mod retrieval;
pub mod scoring;
pub mod similarity;
pub mod state;

#[cfg(feature = "openai")]
pub mod openai;

pub use assistant::{Answer, NutritionAssistant};
pub use catalog::{CatalogIndex, DietaryLabels, MenuItem};
pub use config::{GenerationConfig, RagConfig, RagConfigBuilder};
pub use context::{SYSTEM_PROMPT, format_context};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use generation::{ChatMessage, CompletionProvider, Role};
pub use intent::{DietaryRequirement, Intent, NutritionGoal, extract_intent};
pub use meal::is_actual_meal;
pub use retrieval::{RetrievalEngine, RetrievalEngineBuilder, RetrievalResult, ScoredCandidate};
pub use scoring::goal_bonus;
pub use similarity::cosine_similarity;
pub use state::ConversationState;

#[cfg(feature = "openai")]
pub use openai::{OpenAICompletionProvider, OpenAIEmbeddingProvider};
