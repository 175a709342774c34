//! Deterministic query embedding
//!
//! Hashed bag-of-words over a fixed-dimension space. This is not a
//! semantic model; it is the deterministic stand-in the pipeline uses so
//! that ranking is reproducible for identical inputs. Deployments with a
//! real embedding service implement [`crate::store::ExampleStore::embed`]
//! against it instead.

/// Fixed embedding dimension shared by queries and stored chunks
pub const EMBEDDING_DIM: usize = 384;

/// Embed text into a fixed-dimension, L2-normalized vector
///
/// Tokens are lowercased alphanumeric runs; each token is FNV-1a hashed
/// into a bucket. Identical text always produces an identical vector.
#[must_use]
pub fn embed_text(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; EMBEDDING_DIM];

    for token in tokens(text) {
        let bucket = (fnv1a(token.as_bytes()) as usize) % EMBEDDING_DIM;
        vector[bucket] += 1.0;
    }

    l2_normalize(&mut vector);
    vector
}

/// Cosine similarity between two vectors
///
/// Returns 0.0 for mismatched dimensions or zero-norm inputs.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_is_deterministic() {
        let a = embed_text("predict drug shortages with machine learning");
        let b = embed_text("predict drug shortages with machine learning");
        assert_eq!(a, b);
        assert_eq!(a.len(), EMBEDDING_DIM);
    }

    #[test]
    fn embedding_is_normalized() {
        let v = embed_text("inventory prediction software for pharmacies");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn similar_text_scores_higher_than_unrelated() {
        let query = embed_text("drug shortage prediction model");
        let close = embed_text("model to predict drug shortage events");
        let far = embed_text("concrete bridge load testing procedure");
        assert!(cosine_similarity(&query, &close) > cosine_similarity(&query, &far));
    }

    #[test]
    fn cosine_handles_degenerate_input() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn identical_vectors_have_unit_similarity() {
        let v = embed_text("systematic investigation of caching behavior");
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }
}
