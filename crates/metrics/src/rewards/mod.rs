//! Maximum attainable reward of one validator around an epoch boundary.
//!
//! Rewards are evaluated against three consecutive snapshots. Attestation rewards are credited one
//! epoch late, so they come from the participation recorded in ``current``. Sync committee
//! membership and proposer duties are known one epoch ahead, so those components are taken from
//! ``next``.

pub mod altair;
pub mod phase0;

use anyhow::ensure;
use serde::{Deserialize, Serialize};
use tally_common::primitives::{Epoch, Gwei, Slot, ValidatorIndex};
use tally_consensus::{constants::GENESIS_EPOCH, revision::Revision};
use tracing::trace;

use crate::{error::Error, snapshot::StateSnapshot};

/// Reward components of one validator for one epoch. Components a revision does not model are
/// reported as zero.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ValidatorSepRewards {
    #[serde(with = "serde_utils::quoted_u64")]
    pub validator_index: ValidatorIndex,
    #[serde(with = "serde_utils::quoted_u64")]
    pub epoch: Epoch,
    #[serde(with = "serde_utils::quoted_u64")]
    pub base_reward: Gwei,
    #[serde(with = "serde_utils::quoted_u64")]
    pub attestation_reward: Gwei,
    #[serde(with = "serde_utils::quoted_u64")]
    pub flag_index_reward: Gwei,
    #[serde(with = "serde_utils::quoted_u64")]
    pub inclusion_delay_reward: Gwei,
    #[serde(with = "serde_utils::quoted_u64")]
    pub sync_committee_reward: Gwei,
    #[serde(with = "serde_utils::quoted_u64")]
    pub proposer_reward: Gwei,
    #[serde(with = "serde_utils::quoted_u64")]
    pub max_reward: Gwei,
    pub proposer_slot: Option<Slot>,
    pub in_sync_committee: bool,
}

impl ValidatorSepRewards {
    pub fn zero(validator_index: ValidatorIndex, epoch: Epoch) -> Self {
        Self {
            validator_index,
            epoch,
            ..Default::default()
        }
    }

    /// Set ``max_reward`` to the sum of the individual components.
    fn with_max_reward(mut self) -> Self {
        self.max_reward = self.attestation_reward
            + self.flag_index_reward
            + self.inclusion_delay_reward
            + self.sync_committee_reward
            + self.proposer_reward;
        self
    }
}

/// Check that the three snapshots cover consecutive epochs. At genesis the previous snapshot is
/// the genesis snapshot itself.
pub fn ensure_consecutive(
    previous: &StateSnapshot,
    current: &StateSnapshot,
    next: &StateSnapshot,
) -> anyhow::Result<()> {
    let at_genesis = previous.epoch() == GENESIS_EPOCH && current.epoch() == GENESIS_EPOCH;
    ensure!(
        (at_genesis || previous.epoch() + 1 == current.epoch())
            && current.epoch() + 1 == next.epoch(),
        Error::NonConsecutiveEpochs {
            previous: previous.epoch(),
            current: current.epoch(),
            next: next.epoch(),
        }
    );
    Ok(())
}

/// Compute the maximum reward ``validator_index`` could earn around ``current``, using the
/// formulas of the revision ``current`` was produced under.
pub fn compute_max_reward(
    validator_index: ValidatorIndex,
    previous: &StateSnapshot,
    current: &StateSnapshot,
    next: &StateSnapshot,
) -> anyhow::Result<ValidatorSepRewards> {
    current.validator(validator_index)?;
    next.validator(validator_index)?;
    ensure_consecutive(previous, current, next)?;

    if current.epoch() == GENESIS_EPOCH {
        return Ok(ValidatorSepRewards::zero(validator_index, current.epoch()));
    }

    let rewards = match current.revision() {
        Revision::Phase0 => phase0::compute_max_reward(validator_index, previous, current, next)?,
        Revision::Altair | Revision::Bellatrix => {
            altair::compute_max_reward(validator_index, current, next)?
        }
    }
    .with_max_reward();

    trace!(
        validator_index,
        epoch = rewards.epoch,
        max_reward = rewards.max_reward,
        "Computed max reward"
    );

    Ok(rewards)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{
        snapshot::SnapshotBuilder,
        test_utils::{participation, sealed_snapshot, snapshot_parts},
    };

    fn window(revision: Revision, epoch: Epoch) -> [StateSnapshot; 3] {
        [
            sealed_snapshot(snapshot_parts(revision, epoch.saturating_sub(1))),
            sealed_snapshot(snapshot_parts(revision, epoch)),
            sealed_snapshot(snapshot_parts(revision, epoch + 1)),
        ]
    }

    #[rstest]
    #[case(Revision::Phase0)]
    #[case(Revision::Altair)]
    #[case(Revision::Bellatrix)]
    fn test_genesis_rewards_are_zero(#[case] revision: Revision) {
        let [previous, current, next] = window(revision, GENESIS_EPOCH);

        for index in 0..current.validator_count() as u64 {
            let rewards = compute_max_reward(index, &previous, &current, &next).unwrap();
            assert_eq!(rewards, ValidatorSepRewards::zero(index, GENESIS_EPOCH));
        }
    }

    #[test]
    fn test_max_reward_sums_components() {
        let [previous, _, next] = window(Revision::Altair, 7);
        let current = SnapshotBuilder::new(snapshot_parts(Revision::Altair, 7))
            .unwrap()
            .process_participation_flags(&participation())
            .unwrap();

        let rewards = compute_max_reward(0, &previous, &current, &next).unwrap();

        assert!(rewards.flag_index_reward > 0);
        assert_eq!(
            rewards.max_reward,
            rewards.attestation_reward
                + rewards.flag_index_reward
                + rewards.inclusion_delay_reward
                + rewards.sync_committee_reward
                + rewards.proposer_reward
        );
    }

    #[test]
    fn test_non_consecutive_epochs_are_rejected() {
        let previous = sealed_snapshot(snapshot_parts(Revision::Altair, 5));
        let current = sealed_snapshot(snapshot_parts(Revision::Altair, 7));
        let next = sealed_snapshot(snapshot_parts(Revision::Altair, 8));

        let error = compute_max_reward(0, &previous, &current, &next).unwrap_err();

        assert_eq!(
            error.downcast_ref::<Error>(),
            Some(&Error::NonConsecutiveEpochs {
                previous: 5,
                current: 7,
                next: 8
            })
        );
    }

    #[test]
    fn test_unknown_validator_is_rejected() {
        let [previous, current, next] = window(Revision::Phase0, 7);

        let error = compute_max_reward(42, &previous, &current, &next).unwrap_err();

        assert_eq!(
            error.downcast_ref::<Error>(),
            Some(&Error::ValidatorIndexOutOfBounds { index: 42, epoch: 7 })
        );
    }

    #[test]
    fn test_rewards_serialize_quoted() {
        let rewards = ValidatorSepRewards {
            proposer_slot: Some(4),
            ..ValidatorSepRewards::zero(3, 9)
        };

        let yaml = serde_yaml::to_string(&rewards).unwrap();

        assert!(yaml.contains("validator_index: '3'"));
        assert!(yaml.contains("proposer_slot: 4"));
        assert_eq!(
            serde_yaml::from_str::<ValidatorSepRewards>(&yaml).unwrap(),
            rewards
        );
    }
}
