use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tally_common::primitives::{CommitteeIndex, Epoch, Slot, ValidatorIndex};
use tally_consensus::pubkey::PubKey;

use crate::error::Error;

/// Assignment of a validator to propose the block at ``slot``.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ProposerDuty {
    pub pubkey: PubKey,
    #[serde(with = "serde_utils::quoted_u64")]
    pub validator_index: ValidatorIndex,
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: Slot,
}

/// Ordered members of the committee ``index`` at ``slot``.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct BeaconCommittee {
    #[serde(with = "serde_utils::quoted_u64")]
    pub index: CommitteeIndex,
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: Slot,
    #[serde(with = "serde_utils::quoted_u64_vec")]
    pub validators: Vec<ValidatorIndex>,
}

/// Committee assignments and proposer duties of every slot in one epoch.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct EpochDuties {
    epoch: Epoch,
    proposers: Vec<ProposerDuty>,
    committees: HashMap<(Slot, CommitteeIndex), Vec<ValidatorIndex>>,
}

impl EpochDuties {
    pub fn new(
        epoch: Epoch,
        mut proposers: Vec<ProposerDuty>,
        committees: impl IntoIterator<Item = BeaconCommittee>,
    ) -> Self {
        proposers.sort_by_key(|duty| duty.slot);

        let committees = committees
            .into_iter()
            .map(|committee| ((committee.slot, committee.index), committee.validators))
            .collect();

        Self {
            epoch,
            proposers,
            committees,
        }
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn proposers(&self) -> &[ProposerDuty] {
        &self.proposers
    }

    /// Slots of this epoch that ``validator_index`` is assigned to propose, in ascending order.
    pub fn proposer_slots(
        &self,
        validator_index: ValidatorIndex,
    ) -> impl Iterator<Item = Slot> + '_ {
        self.proposers
            .iter()
            .filter(move |duty| duty.validator_index == validator_index)
            .map(|duty| duty.slot)
    }

    pub fn committee(&self, slot: Slot, index: CommitteeIndex) -> Option<&[ValidatorIndex]> {
        self.committees.get(&(slot, index)).map(Vec::as_slice)
    }

    pub fn committee_count(&self) -> usize {
        self.committees.len()
    }
}

/// Supplies epoch duties to the normalizer. Implementations usually front a beacon node.
pub trait DutiesSource {
    fn epoch_duties(&self, epoch: Epoch) -> anyhow::Result<EpochDuties>;
}

/// Duties known ahead of time, keyed by epoch.
#[derive(Debug, Default, Clone)]
pub struct StaticDuties {
    duties: BTreeMap<Epoch, EpochDuties>,
}

impl StaticDuties {
    pub fn insert(&mut self, duties: EpochDuties) {
        self.duties.insert(duties.epoch(), duties);
    }

    pub fn epochs(&self) -> impl Iterator<Item = Epoch> + '_ {
        self.duties.keys().copied()
    }
}

impl FromIterator<EpochDuties> for StaticDuties {
    fn from_iter<I: IntoIterator<Item = EpochDuties>>(iter: I) -> Self {
        let mut duties = Self::default();
        for epoch_duties in iter {
            duties.insert(epoch_duties);
        }
        duties
    }
}

impl DutiesSource for StaticDuties {
    fn epoch_duties(&self, epoch: Epoch) -> anyhow::Result<EpochDuties> {
        self.duties
            .get(&epoch)
            .cloned()
            .ok_or_else(|| Error::DutiesUnavailable { epoch }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duties() -> EpochDuties {
        EpochDuties::new(
            3,
            vec![
                ProposerDuty {
                    pubkey: PubKey::default(),
                    validator_index: 7,
                    slot: 100,
                },
                ProposerDuty {
                    pubkey: PubKey::default(),
                    validator_index: 7,
                    slot: 97,
                },
                ProposerDuty {
                    pubkey: PubKey::default(),
                    validator_index: 2,
                    slot: 96,
                },
            ],
            [BeaconCommittee {
                index: 1,
                slot: 98,
                validators: vec![4, 0, 9],
            }],
        )
    }

    #[test]
    fn test_proposer_slots_are_ordered() {
        let duties = duties();
        assert_eq!(duties.proposer_slots(7).collect::<Vec<_>>(), vec![97, 100]);
        assert_eq!(duties.proposer_slots(2).collect::<Vec<_>>(), vec![96]);
        assert_eq!(duties.proposer_slots(5).count(), 0);
    }

    #[test]
    fn test_committee_lookup() {
        let duties = duties();
        assert_eq!(duties.committee(98, 1), Some([4, 0, 9].as_slice()));
        assert_eq!(duties.committee(98, 0), None);
        assert_eq!(duties.committee_count(), 1);
    }

    #[test]
    fn test_missing_epoch() {
        let source: StaticDuties = [duties()].into_iter().collect();
        assert!(source.epoch_duties(3).is_ok());

        let error = source.epoch_duties(4).unwrap_err();
        assert_eq!(
            error.downcast_ref::<Error>(),
            Some(&Error::DutiesUnavailable { epoch: 4 })
        );
    }

    #[test]
    fn test_beacon_api_committee_shape() {
        let json = r#"{"index": "1", "slot": "98", "validators": ["4", "0", "9"]}"#;
        let committee: BeaconCommittee = serde_yaml::from_str(json).unwrap();
        assert_eq!(committee.validators, vec![4, 0, 9]);
    }
}
