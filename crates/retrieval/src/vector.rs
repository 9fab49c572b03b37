//! Vector similarity utilities.

use campanile_core::chunk::{DocumentChunk, RetrievalResult};

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if the vectors differ in length or either is empty/zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank chunks by cosine similarity to a query embedding.
///
/// Returns the top `limit` chunks sorted by descending similarity. The sort
/// is stable, so equal scores keep the order the chunks were passed in.
pub fn rank_chunks(
    chunks: &[DocumentChunk],
    query_embedding: &[f32],
    limit: usize,
) -> Vec<RetrievalResult> {
    let mut scored: Vec<RetrievalResult> = chunks
        .iter()
        .map(|chunk| RetrievalResult {
            chunk: chunk.clone(),
            score: cosine_similarity(&chunk.embedding, query_embedding),
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use campanile_core::chunk::ChunkMetadata;

    fn chunk(id: &str, embedding: Vec<f32>) -> DocumentChunk {
        DocumentChunk {
            id: id.into(),
            text: format!("Content for {id}"),
            embedding,
            metadata: ChunkMetadata {
                document_id: "handbook.pdf".into(),
                page: None,
                chunk_index: 0,
            },
        }
    }

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn cosine_opposite_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!((sim - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn cosine_empty_vectors() {
        let sim = cosine_similarity(&[], &[]);
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn cosine_mismatched_lengths() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&a, &b);
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn cosine_zero_vector() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&a, &b);
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn cosine_known_value() {
        // [1,1] · [1,0] = 1, |[1,1]| = sqrt(2), |[1,0]| = 1
        // similarity = 1 / sqrt(2) ≈ 0.7071
        let a = vec![1.0, 1.0];
        let b = vec![1.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!((sim - 0.7071).abs() < 0.001);
    }

    #[test]
    fn rank_orders_by_similarity() {
        let query = vec![1.0, 0.0, 0.0];
        let chunks = vec![
            chunk("a", vec![0.0, 1.0, 0.0]), // orthogonal = 0
            chunk("b", vec![1.0, 0.0, 0.0]), // identical = 1
            chunk("c", vec![0.5, 0.5, 0.0]), // partial = ~0.707
        ];

        let results = rank_chunks(&chunks, &query, 10);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.id, "b");
        assert_eq!(results[1].chunk.id, "c");
        assert_eq!(results[2].chunk.id, "a");
    }

    #[test]
    fn rank_ties_keep_input_order() {
        let query = vec![1.0, 0.0];
        let chunks = vec![
            chunk("first", vec![1.0, 0.0]),
            chunk("second", vec![1.0, 0.0]),
            chunk("third", vec![2.0, 0.0]), // same direction, same similarity
        ];

        let results = rank_chunks(&chunks, &query, 10);
        assert_eq!(results[0].chunk.id, "first");
        assert_eq!(results[1].chunk.id, "second");
        assert_eq!(results[2].chunk.id, "third");
    }

    #[test]
    fn rank_respects_limit() {
        let query = vec![1.0, 0.0];
        let chunks: Vec<_> = (0..10)
            .map(|i| chunk(&format!("c{i}"), vec![1.0, i as f32 * 0.1]))
            .collect();

        let results = rank_chunks(&chunks, &query, 3);
        assert_eq!(results.len(), 3);
    }
}
