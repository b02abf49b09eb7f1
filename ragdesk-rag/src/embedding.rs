//! The embedding service seam.

use async_trait::async_trait;

use crate::error::Result;

/// Turns text into fixed-length vectors.
///
/// Ingestion embeds chunks through [`embed_batch`](Self::embed_batch);
/// queries go through [`embed`](Self::embed). Both must use the same model,
/// otherwise query vectors and stored vectors are not comparable.
///
/// `embed_batch` returns one vector per input, in input order. Services
/// with a native batch endpoint override it; the fallback embeds one text
/// at a time.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Length of every vector this provider returns.
    fn dimensions(&self) -> usize;

    /// Recorded in the index manifest so a rebuilt index can be traced to
    /// the model that produced it.
    fn model_name(&self) -> &str {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagError;

    struct Lengths;

    #[async_trait]
    impl EmbeddingProvider for Lengths {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.is_empty() {
                return Err(RagError::EmbeddingError { provider: "lengths".into(), message: "empty".into() });
            }
            Ok(vec![text.chars().count() as f32])
        }

        fn dimensions(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn fallback_batch_keeps_input_order_and_stops_on_error() {
        let vectors = Lengths.embed_batch(&["a", "abc", "ab"]).await.unwrap();
        assert_eq!(vectors, vec![vec![1.0], vec![3.0], vec![2.0]]);
        assert_eq!(Lengths.model_name(), "unknown");

        assert!(Lengths.embed_batch(&["a", "", "ab"]).await.is_err());
    }
}
