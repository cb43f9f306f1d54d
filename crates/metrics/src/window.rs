use std::sync::Arc;

use tally_common::primitives::{Epoch, ValidatorIndex};
use tracing::debug;

use crate::{
    report::ValidatorEpochReport,
    rewards::{compute_max_reward, ensure_consecutive, ValidatorSepRewards},
    snapshot::StateSnapshot,
};

/// Three consecutive processed snapshots around the epoch being evaluated.
///
/// Snapshots are shared read-only, so a window can be cloned into worker threads cheaply.
#[derive(Debug, Clone)]
pub struct EpochWindow {
    previous: Arc<StateSnapshot>,
    current: Arc<StateSnapshot>,
    next: Arc<StateSnapshot>,
}

impl EpochWindow {
    pub fn new(
        previous: Arc<StateSnapshot>,
        current: Arc<StateSnapshot>,
        next: Arc<StateSnapshot>,
    ) -> anyhow::Result<Self> {
        ensure_consecutive(&previous, &current, &next)?;
        Ok(Self {
            previous,
            current,
            next,
        })
    }

    pub fn previous(&self) -> &Arc<StateSnapshot> {
        &self.previous
    }

    pub fn current(&self) -> &Arc<StateSnapshot> {
        &self.current
    }

    pub fn next(&self) -> &Arc<StateSnapshot> {
        &self.next
    }

    /// Epoch whose rewards this window evaluates.
    pub fn epoch(&self) -> Epoch {
        self.current.epoch()
    }

    /// Advance by one epoch, dropping the oldest snapshot.
    pub fn slide(&mut self, next: Arc<StateSnapshot>) -> anyhow::Result<()> {
        ensure_consecutive(&self.current, &self.next, &next)?;

        let current = std::mem::replace(&mut self.next, next);
        self.previous = std::mem::replace(&mut self.current, current);

        debug!(epoch = self.epoch(), "Slid epoch window");

        Ok(())
    }

    pub fn compute_max_reward(
        &self,
        validator_index: ValidatorIndex,
    ) -> anyhow::Result<ValidatorSepRewards> {
        compute_max_reward(validator_index, &self.previous, &self.current, &self.next)
    }

    /// Maximum rewards of every validator registered in the current snapshot.
    pub fn compute_all(&self) -> anyhow::Result<Vec<ValidatorSepRewards>> {
        self.validator_indices()
            .map(|validator_index| self.compute_max_reward(validator_index))
            .collect()
    }

    pub fn report(&self, validator_index: ValidatorIndex) -> anyhow::Result<ValidatorEpochReport> {
        let rewards = self.compute_max_reward(validator_index)?;
        ValidatorEpochReport::new(validator_index, &self.current, &self.next, rewards)
    }

    pub fn reports(
        &self,
        validator_indices: impl IntoIterator<Item = ValidatorIndex>,
    ) -> anyhow::Result<Vec<ValidatorEpochReport>> {
        validator_indices
            .into_iter()
            .map(|validator_index| self.report(validator_index))
            .collect()
    }

    pub fn validator_indices(&self) -> impl Iterator<Item = ValidatorIndex> {
        0..self.current.validator_count() as ValidatorIndex
    }
}
