//! Deterministic in-process collaborators and a small sample catalog.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use menu_rag::{
    CatalogIndex, ChatMessage, CompletionProvider, EmbeddingProvider, GenerationConfig,
    MenuItem, RagConfig, RagError, RetrievalEngine,
};

pub const DIM: usize = 16;

/// Bag-of-words embedding: each token lands in a hashed bucket, plus a
/// constant component so no vector has zero norm.
pub fn embed_text(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    v[0] = 0.5;
    for token in text.to_lowercase().split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty())
    {
        let hash = token.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        v[1 + (hash % (DIM as u64 - 1)) as usize] += 1.0;
    }
    v
}

pub struct MockEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> menu_rag::Result<Vec<f32>> {
        Ok(embed_text(text))
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "bag-of-words"
    }
}

/// Always unavailable.
pub struct FailingEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for FailingEmbeddingProvider {
    async fn embed(&self, _text: &str) -> menu_rag::Result<Vec<f32>> {
        Err(RagError::EmbeddingError { provider: "mock".into(), message: "connection refused".into() })
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Fails with a local I/O error, which retrieval must still report as an
/// embedding failure.
pub struct BrokenEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for BrokenEmbeddingProvider {
    async fn embed(&self, _text: &str) -> menu_rag::Result<Vec<f32>> {
        Err(RagError::Io(std::io::Error::other("socket closed")))
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "broken-embedder"
    }
}

/// Claims the catalog dimension but returns shorter vectors.
pub struct TruncatingEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for TruncatingEmbeddingProvider {
    async fn embed(&self, text: &str) -> menu_rag::Result<Vec<f32>> {
        let mut v = embed_text(text);
        v.truncate(DIM / 2);
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "truncating"
    }
}

/// Replies with a numbered canned answer and records every transcript.
#[derive(Default)]
pub struct RecordingCompletionProvider {
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl RecordingCompletionProvider {
    pub fn transcripts(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for RecordingCompletionProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _settings: &GenerationConfig,
    ) -> menu_rag::Result<String> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(messages.to_vec());
        Ok(format!("recommendation #{}", calls.len()))
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Fails with a non-upstream error, which the assistant must still report
/// as a generation failure.
pub struct BrokenCompletionProvider;

#[async_trait]
impl CompletionProvider for BrokenCompletionProvider {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _settings: &GenerationConfig,
    ) -> menu_rag::Result<String> {
        Err(RagError::PipelineError("rate limited".into()))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

pub fn sample_items() -> Vec<MenuItem> {
    vec![
        MenuItem::new("Grilled Chicken Bowl", "The Farmstead")
            .with_macros(350.0, 45.0, 20.0, 8.0)
            .with_fiber(3.0)
            .with_labels("Halal; Gluten Free"),
        MenuItem::new("Chicken Wings", "Gothic Grill")
            .with_macros(720.0, 68.0, 10.0, 45.0)
            .with_labels("Gluten Free"),
        MenuItem::new("Tofu Stir Fry", "Ginger + Soy")
            .with_macros(450.0, 22.0, 50.0, 15.0)
            .with_fiber(6.0)
            .with_labels("Vegan; Vegetarian"),
        MenuItem::new("Black Bean Burrito", "Sazon")
            .with_macros(650.0, 25.0, 90.0, 18.0)
            .with_fiber(14.0)
            .with_labels("Vegetarian"),
        MenuItem::new("Lentil Curry", "Tandoor Indian Cuisine")
            .with_macros(400.0, 18.0, 55.0, 10.0)
            .with_fiber(16.0)
            .with_labels("Vegan; Halal"),
        MenuItem::new("Quinoa Power Bowl", "Sprout")
            .with_macros(520.0, 20.0, 70.0, 16.0)
            .with_fiber(11.0)
            .with_labels("Vegan; Gluten Free"),
        MenuItem::new("Margherita Pizza", "Il Forno")
            .with_macros(800.0, 30.0, 95.0, 32.0)
            .with_labels("Vegetarian"),
        MenuItem::new("Turkey Club Sandwich", "Marketplace")
            .with_macros(550.0, 35.0, 45.0, 22.0)
            .with_fiber(4.0),
        MenuItem::new("Ranch Dressing", "Marketplace")
            .with_macros(140.0, 0.0, 2.0, 15.0)
            .with_labels("Vegetarian"),
        MenuItem::new("Grilled Chicken Bowl", "Marketplace")
            .with_macros(360.0, 44.0, 22.0, 9.0)
            .with_labels("Halal"),
        MenuItem::new("Steak Frites", "J.B.'s Roast & Chops").with_macros(900.0, 55.0, 60.0, 50.0),
        MenuItem::new("Veggie Omelette", "Marketplace")
            .with_macros(380.0, 24.0, 8.0, 26.0)
            .with_labels("Vegetarian; Gluten Free"),
        MenuItem::new("Salmon Poke", "Gyotaku")
            .with_macros(480.0, 34.0, 52.0, 12.0)
            .with_fiber(3.0)
            .with_labels("Gluten Free"),
    ]
}

pub fn sample_catalog() -> CatalogIndex {
    let items = sample_items();
    let documents: Vec<String> = items
        .iter()
        .map(|item| {
            format!("{} at {}. {}", item.name, item.restaurant_display(), item.dietary_labels)
        })
        .collect();
    let embeddings = documents.iter().map(|doc| embed_text(doc)).collect();
    CatalogIndex::new(items, documents, embeddings).unwrap()
}

pub fn engine_with(
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
) -> RetrievalEngine {
    RetrievalEngine::builder()
        .config(config)
        .catalog(Arc::new(sample_catalog()))
        .embedding_provider(embedding_provider)
        .build()
        .unwrap()
}

pub fn sample_engine() -> RetrievalEngine {
    engine_with(RagConfig::default(), Arc::new(MockEmbeddingProvider))
}
