//! Text embedding capability used by document stores.

use std::future::Future;

use crate::error::StoreError;

/// Text used to discover an embedder's vector dimension.
pub(crate) const PROBE_TEXT: &str = "probe";

/// Turns text into a dense vector.
pub trait Embedder: Send + Sync {
    /// Embed one text.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the embedding service is unreachable,
    /// or [`StoreError::Embedding`] if it answers without a vector.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, StoreError>> + Send;

    fn name(&self) -> &str;
}

/// Deterministic bag-of-words embedder for tests.
///
/// Each lowercase alphanumeric token is hashed into one of `dimensions`
/// buckets, so texts sharing words end up close under cosine similarity.
#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    pub dimensions: usize,
    pub fail: bool,
}

#[cfg(any(test, feature = "mock"))]
impl Default for MockEmbedder {
    fn default() -> Self {
        Self {
            dimensions: 64,
            fail: false,
        }
    }
}

#[cfg(any(test, feature = "mock"))]
impl MockEmbedder {
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn bucket(&self, token: &str) -> usize {
        // FNV-1a
        let hash = token.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |acc, b| {
            (acc ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        });
        (hash % self.dimensions.max(1) as u64) as usize
    }
}

#[cfg(any(test, feature = "mock"))]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, StoreError> {
        if self.fail {
            return Err(StoreError::Connection("mock embedder unavailable".into()));
        }
        let mut vector = vec![0.0_f32; self.dimensions.max(1)];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let idx = self.bucket(&token.to_lowercase());
            vector[idx] += 1.0;
        }
        Ok(vector)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}
