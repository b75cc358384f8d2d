//! Cosine similarity over the precomputed catalog embeddings.

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or a non-finite
/// component.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let sim = dot / (norm_a * norm_b);
    if sim.is_finite() { sim } else { 0.0 }
}

/// Score every embedding against `query` and return `(row, similarity)`
/// pairs ordered by descending similarity. Ties keep catalog order.
pub fn rank_by_similarity(query: &[f32], embeddings: &[Vec<f32>]) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = embeddings
        .iter()
        .enumerate()
        .map(|(row, embedding)| (row, cosine_similarity(query, embedding)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
}
