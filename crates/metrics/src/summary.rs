use serde::{Deserialize, Serialize};
use tally_common::primitives::{Epoch, Gwei, Slot};
use tally_consensus::{
    constants::{TIMELY_HEAD_FLAG_INDEX, TIMELY_SOURCE_FLAG_INDEX, TIMELY_TARGET_FLAG_INDEX},
    revision::Revision,
};

use crate::snapshot::StateSnapshot;

/// Epoch-wide aggregates of one processed snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSummary {
    #[serde(with = "serde_utils::quoted_u64")]
    pub epoch: Epoch,
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: Slot,
    pub revision: Revision,
    #[serde(with = "serde_utils::quoted_u64")]
    pub participation_epoch: Epoch,
    #[serde(with = "serde_utils::quoted_u64")]
    pub active_validator_count: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub attesting_validator_count: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub total_active_effective_balance: Gwei,
    #[serde(with = "serde_utils::quoted_u64")]
    pub total_active_real_balance: Gwei,
    #[serde(with = "serde_utils::quoted_u64")]
    pub source_attesting_balance: Gwei,
    #[serde(with = "serde_utils::quoted_u64")]
    pub target_attesting_balance: Gwei,
    #[serde(with = "serde_utils::quoted_u64")]
    pub head_attesting_balance: Gwei,
    #[serde(with = "serde_utils::quoted_u64_vec")]
    pub missed_slots: Vec<Slot>,
    #[serde(with = "serde_utils::quoted_u64")]
    pub missed_slot_count: u64,
}

impl StateSnapshot {
    pub fn summary(&self) -> EpochSummary {
        EpochSummary {
            epoch: self.epoch(),
            slot: self.slot(),
            revision: self.revision(),
            participation_epoch: self.participation_epoch(),
            active_validator_count: self.active_validator_count(),
            attesting_validator_count: self.attesting_validators().len() as u64,
            total_active_effective_balance: self.total_active_effective_balance(),
            total_active_real_balance: self.total_active_real_balance(),
            source_attesting_balance: self.attesting_balance(TIMELY_SOURCE_FLAG_INDEX),
            target_attesting_balance: self.attesting_balance(TIMELY_TARGET_FLAG_INDEX),
            head_attesting_balance: self.attesting_balance(TIMELY_HEAD_FLAG_INDEX),
            missed_slots: self.missed_slots().to_vec(),
            missed_slot_count: self.missed_slots().len() as u64,
        }
    }
}
