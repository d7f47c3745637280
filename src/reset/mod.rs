//! Two-phase dataset reset: clear everything, then fill with a fresh
//! synthetic sample.
//!
//! The phases are not atomic. If filling fails after a successful clear the
//! store is left empty and the caller gets [`SocialGraphError::FillFailed`];
//! nothing is rolled back or retried.

pub mod audit;

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use uuid::Uuid;

use crate::config::GeneratorConfig;
use crate::db::Db;
use crate::generator::{check_relation_count, generate, GeneratorSpec};
use crate::store::GraphStore;
use crate::{Result, SocialGraphError};

/// Phase a reset was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPhase {
    Clearing,
    Filling,
}

/// `Idle -> Clearing -> Filling -> Done`, or `Failed` out of either phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetState {
    Idle,
    Clearing,
    Filling,
    Done,
    Failed(ResetPhase),
}

/// Outcome of a successful reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetStatus {
    pub reset_id: String,
    pub state: ResetState,
    pub requested: usize,
    /// Distinct relationships actually stored; repeated draws collapse.
    pub written: usize,
}

/// Phase recorded in a reset error, if it is one.
pub fn failed_phase(err: &SocialGraphError) -> Option<ResetPhase> {
    match err {
        SocialGraphError::ClearFailed(_) => Some(ResetPhase::Clearing),
        SocialGraphError::FillFailed(_) => Some(ResetPhase::Filling),
        _ => None,
    }
}

/// Runs resets against a shared store. Holds no per-reset state.
pub struct ResetOrchestrator {
    store: Arc<dyn GraphStore>,
    generator: GeneratorConfig,
    audit: Option<Db>,
}

impl ResetOrchestrator {
    pub fn new(store: Arc<dyn GraphStore>, generator: GeneratorConfig) -> Self {
        Self {
            store,
            generator,
            audit: None,
        }
    }

    /// Record every attempt in the `reset_log` table of `db`.
    pub fn with_audit(mut self, db: Db) -> Self {
        self.audit = Some(db);
        self
    }

    pub fn default_relation_count(&self) -> usize {
        self.generator.default_relation_count
    }

    /// Replace the dataset with `relation_count` generated relationships.
    ///
    /// A count above the ceiling is rejected before anything is deleted.
    pub async fn reset(&self, relation_count: usize) -> Result<ResetStatus> {
        check_relation_count(relation_count, self.generator.max_relation_count)?;

        let reset_id = Uuid::new_v4().to_string();
        let mut state = ResetState::Idle;
        let result = self.run(&reset_id, relation_count, &mut state).await;

        if let Some(db) = &self.audit {
            if let Err(e) = audit::record(db, &reset_id, relation_count, &result).await {
                log::warn!("Reset {}: failed to write audit entry: {}", reset_id, e);
            }
        }
        result
    }

    async fn run(
        &self,
        reset_id: &str,
        relation_count: usize,
        state: &mut ResetState,
    ) -> Result<ResetStatus> {
        advance(reset_id, state, ResetState::Clearing);
        if let Err(e) = self.store.clear().await {
            advance(reset_id, state, ResetState::Failed(ResetPhase::Clearing));
            log::error!("Reset {}: clear failed: {}", reset_id, e);
            return Err(SocialGraphError::ClearFailed(Box::new(e)));
        }

        advance(reset_id, state, ResetState::Filling);
        let written = match self.fill(relation_count).await {
            Ok(written) => written,
            Err(e) => {
                advance(reset_id, state, ResetState::Failed(ResetPhase::Filling));
                log::error!("Reset {}: fill failed, dataset left empty: {}", reset_id, e);
                return Err(SocialGraphError::FillFailed(Box::new(e)));
            }
        };

        advance(reset_id, state, ResetState::Done);
        log::info!(
            "Reset {}: wrote {} relationships ({} requested)",
            reset_id,
            written,
            relation_count
        );
        Ok(ResetStatus {
            reset_id: reset_id.to_string(),
            state: *state,
            requested: relation_count,
            written,
        })
    }

    async fn fill(&self, relation_count: usize) -> Result<usize> {
        let spec = GeneratorSpec::from_config(&self.generator, relation_count);
        let ops = generate(&spec, &mut StdRng::from_entropy())?;
        self.store.write_batch(ops).await
    }
}

fn advance(reset_id: &str, state: &mut ResetState, next: ResetState) {
    log::debug!("Reset {}: {:?} -> {:?}", reset_id, state, next);
    *state = next;
}
