use serde::{Deserialize, Serialize};
use tally_common::primitives::{Epoch, Gwei, ValidatorIndex};
use tally_consensus::{
    constants::{TIMELY_HEAD_FLAG_INDEX, TIMELY_SOURCE_FLAG_INDEX, TIMELY_TARGET_FLAG_INDEX},
    helpers::is_active_validator,
    validator::Validator,
};

use crate::{rewards::ValidatorSepRewards, snapshot::StateSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorStatus {
    Queued,
    Active,
    Slashed,
    Exited,
}

impl ValidatorStatus {
    pub fn from_validator(validator: &Validator, epoch: Epoch) -> Self {
        if validator.slashed {
            Self::Slashed
        } else if epoch < validator.activation_epoch {
            Self::Queued
        } else if epoch >= validator.exit_epoch {
            Self::Exited
        } else {
            Self::Active
        }
    }
}

/// Everything stored about one validator for one epoch: observed balances and votes next to the
/// maximum reward it could have earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorEpochReport {
    pub status: ValidatorStatus,
    #[serde(with = "serde_utils::quoted_u64")]
    pub effective_balance: Gwei,
    #[serde(with = "serde_utils::quoted_u64")]
    pub balance: Gwei,
    #[serde(with = "serde_utils::quoted_u64")]
    pub next_balance: Gwei,
    pub actual_reward: i64,
    pub missing_source: bool,
    pub missing_target: bool,
    pub missing_head: bool,
    #[serde(flatten)]
    pub rewards: ValidatorSepRewards,
}

impl ValidatorEpochReport {
    pub fn new(
        validator_index: ValidatorIndex,
        current: &StateSnapshot,
        next: &StateSnapshot,
        rewards: ValidatorSepRewards,
    ) -> anyhow::Result<Self> {
        let validator = current.validator(validator_index)?;
        let balance = current.balance(validator_index)?;
        let next_balance = next.balance(validator_index)?;

        // Only validators that were expected to vote can miss a vote
        let expected_to_vote = is_active_validator(validator, current.participation_epoch());
        let missing = |flag_index| -> anyhow::Result<bool> {
            Ok(expected_to_vote && current.correct_flag_count(flag_index, validator_index)? == 0)
        };

        Ok(Self {
            status: ValidatorStatus::from_validator(validator, current.epoch()),
            effective_balance: validator.effective_balance,
            balance,
            next_balance,
            actual_reward: i64::try_from(next_balance)? - i64::try_from(balance)?,
            missing_source: missing(TIMELY_SOURCE_FLAG_INDEX)?,
            missing_target: missing(TIMELY_TARGET_FLAG_INDEX)?,
            missing_head: missing(TIMELY_HEAD_FLAG_INDEX)?,
            rewards,
        })
    }

    pub fn validator_index(&self) -> ValidatorIndex {
        self.rewards.validator_index
    }

    pub fn epoch(&self) -> Epoch {
        self.rewards.epoch
    }
}
