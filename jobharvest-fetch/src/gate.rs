//! Yes/no decision points.
//!
//! Every point where a run may need an operator's answer goes through a
//! [`DecisionPolicy`]: continuing after a chunk of detail pages, continuing
//! after a listing page failed, and starting the detail phase at all.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

/// Source of interactive answers.
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Asks `prompt` and returns true for "yes".
    async fn confirm(&self, prompt: &str) -> bool;
}

/// How a yes/no decision is made.
#[derive(Clone, Default)]
pub enum DecisionPolicy {
    /// Always continue.
    #[default]
    AutoYes,
    /// Always stop.
    AutoNo,
    /// Ask a confirmer and wait for the answer.
    Ask(Arc<dyn Confirmer>),
}

impl DecisionPolicy {
    /// Creates a policy that asks `confirmer`.
    pub fn ask(confirmer: impl Confirmer + 'static) -> Self {
        Self::Ask(Arc::new(confirmer))
    }

    /// Resolves the decision for `prompt`.
    pub async fn decide(&self, prompt: &str) -> bool {
        match self {
            Self::AutoYes => true,
            Self::AutoNo => false,
            Self::Ask(confirmer) => confirmer.confirm(prompt).await,
        }
    }
}

impl fmt::Debug for DecisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AutoYes => f.write_str("AutoYes"),
            Self::AutoNo => f.write_str("AutoNo"),
            Self::Ask(_) => f.write_str("Ask"),
        }
    }
}

// ============================================================================
// Chunk Gate
// ============================================================================

/// Pauses detail enrichment every `chunk_size` processed records.
#[derive(Debug, Clone, Default)]
pub struct ChunkGate {
    /// Records per chunk. Zero disables the gate.
    pub chunk_size: usize,
    /// How the continue question is answered.
    pub policy: DecisionPolicy,
}

impl ChunkGate {
    /// Creates a gate.
    pub fn new(chunk_size: usize, policy: DecisionPolicy) -> Self {
        Self { chunk_size, policy }
    }

    /// Returns true if `processed` sits on a chunk boundary.
    pub fn fires_at(&self, processed: usize) -> bool {
        self.chunk_size > 0 && processed > 0 && processed % self.chunk_size == 0
    }

    /// Decides whether enrichment continues after `processed` records.
    ///
    /// Off a chunk boundary this is always true.
    pub async fn should_continue(&self, processed: usize) -> bool {
        should_continue(processed, self.chunk_size, &self.policy).await
    }
}

/// Decides whether to keep going after `processed` records in chunks of
/// `chunk_size`.
pub async fn should_continue(processed: usize, chunk_size: usize, policy: &DecisionPolicy) -> bool {
    if chunk_size == 0 || processed == 0 || processed % chunk_size != 0 {
        return true;
    }

    let prompt = format!("Processed {processed} records. Continue with the next {chunk_size}?");
    let proceed = policy.decide(&prompt).await;
    info!(processed, chunk_size, proceed, "Chunk boundary reached");
    proceed
}
