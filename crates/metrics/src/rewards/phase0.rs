//! Phase0 reward components.
//!
//! Attesters are rewarded pro rata to the balance that voted the same way, plus an inclusion
//! reward for timely inclusion. Proposers earn a fixed share of the base reward per included
//! attester.

use itertools::Itertools as _;
use tally_common::primitives::{Gwei, ValidatorIndex};
use tally_consensus::{
    constants::{
        EFFECTIVE_BALANCE_INCREMENT, MIN_ATTESTATION_INCLUSION_DELAY, PROPOSER_REWARD_QUOTIENT,
        TIMELY_SOURCE_FLAG_INDEX,
    },
    helpers::is_active_validator,
};

use super::ValidatorSepRewards;
use crate::snapshot::StateSnapshot;

pub fn compute_max_reward(
    validator_index: ValidatorIndex,
    previous: &StateSnapshot,
    current: &StateSnapshot,
    next: &StateSnapshot,
) -> anyhow::Result<ValidatorSepRewards> {
    let base_reward = current.base_reward(validator_index)?;
    let mut rewards = ValidatorSepRewards {
        base_reward,
        ..ValidatorSepRewards::zero(validator_index, current.epoch())
    };

    if is_active_validator(next.validator(validator_index)?, current.participation_epoch()) {
        rewards.attestation_reward = attestation_reward(base_reward, current);
    }

    // Best case: included at the earliest slot allowed.
    if current.correct_flag_count(TIMELY_SOURCE_FLAG_INDEX, validator_index)? > 0 {
        rewards.inclusion_delay_reward = base_reward * (PROPOSER_REWARD_QUOTIENT - 1)
            / PROPOSER_REWARD_QUOTIENT
            / MIN_ATTESTATION_INCLUSION_DELAY;
    }

    // Attestations of the participation epoch are included in its own blocks or the next epoch's.
    let proposer_slots = previous
        .duties()
        .proposer_slots(validator_index)
        .merge(current.duties().proposer_slots(validator_index))
        .dedup()
        .collect::<Vec<_>>();

    let included_attesters: u64 = proposer_slots
        .iter()
        .map(|&slot| current.inclusions_at(slot))
        .sum();

    rewards.proposer_slot = proposer_slots.first().copied();
    rewards.proposer_reward = base_reward / PROPOSER_REWARD_QUOTIENT * included_attesters;

    Ok(rewards)
}

/// ``base_reward * attesting_balance // total_balance`` for the source, target and head votes.
fn attestation_reward(base_reward: Gwei, snapshot: &StateSnapshot) -> Gwei {
    let total_increments = snapshot.total_active_increments();
    if total_increments == 0 {
        return 0;
    }

    snapshot
        .attesting_balance_per_flag()
        .iter()
        .map(|attesting_balance| {
            base_reward * (attesting_balance / EFFECTIVE_BALANCE_INCREMENT) / total_increments
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use ssz_types::BitList;
    use tally_common::primitives::Epoch;
    use tally_consensus::{
        attestation_data::AttestationData,
        checkpoint::Checkpoint,
        misc::{compute_end_slot_at_epoch, compute_start_slot_at_epoch},
        pending_attestation::PendingAttestation,
        revision::Revision,
    };

    use super::*;
    use crate::{
        duties::{BeaconCommittee, EpochDuties, ProposerDuty},
        snapshot::SnapshotBuilder,
        test_utils::{pubkey, sealed_snapshot, snapshot_parts, test_root},
    };

    const EPOCH: Epoch = 9;

    /// Validators 0, 2 and 3 vote correctly at the last slot of the previous epoch and are
    /// included in the first block of ``EPOCH``, proposed by validator 1.
    fn current_snapshot() -> StateSnapshot {
        let attested_slot = compute_end_slot_at_epoch(EPOCH - 1);
        let inclusion_slot = compute_start_slot_at_epoch(EPOCH);

        let mut parts = snapshot_parts(Revision::Phase0, EPOCH);
        parts.duties = EpochDuties::new(
            EPOCH,
            vec![ProposerDuty {
                pubkey: pubkey(1),
                validator_index: 1,
                slot: inclusion_slot,
            }],
            [],
        );

        let committees = EpochDuties::new(
            EPOCH - 1,
            vec![],
            [BeaconCommittee {
                index: 0,
                slot: attested_slot,
                validators: vec![0, 2, 3],
            }],
        );

        let mut aggregation_bits = BitList::with_capacity(3).unwrap();
        for position in 0..3 {
            aggregation_bits.set(position, true).unwrap();
        }
        let attestation = PendingAttestation {
            aggregation_bits,
            data: AttestationData {
                slot: attested_slot,
                index: 0,
                beacon_block_root: test_root(attested_slot),
                source: Checkpoint::default(),
                target: Checkpoint {
                    epoch: EPOCH - 1,
                    root: test_root(compute_start_slot_at_epoch(EPOCH - 1)),
                },
            },
            inclusion_delay: inclusion_slot - attested_slot,
            proposer_index: 1,
        };

        SnapshotBuilder::new(parts)
            .unwrap()
            .process_pending_attestations(&[attestation], &committees)
            .unwrap()
    }

    fn neighbours() -> (StateSnapshot, StateSnapshot) {
        (
            sealed_snapshot(snapshot_parts(Revision::Phase0, EPOCH - 1)),
            sealed_snapshot(snapshot_parts(Revision::Phase0, EPOCH + 1)),
        )
    }

    #[test]
    fn test_attester_rewards() {
        let current = current_snapshot();
        let (previous, next) = neighbours();

        let rewards = compute_max_reward(0, &previous, &current, &next).unwrap();

        // 95 of 127 active increments voted for each of source, target and head
        let base_reward = current.base_reward(0).unwrap();
        assert_eq!(rewards.base_reward, base_reward);
        assert_eq!(rewards.attestation_reward, 3 * (base_reward * 95 / 127));
        assert_eq!(rewards.inclusion_delay_reward, base_reward * 7 / 8);
        assert_eq!(rewards.flag_index_reward, 0);
        assert_eq!(rewards.sync_committee_reward, 0);
        assert_eq!(rewards.proposer_slot, None);
    }

    #[test]
    fn test_proposer_reward_counts_included_attesters() {
        let current = current_snapshot();
        let (previous, next) = neighbours();

        let rewards = compute_max_reward(1, &previous, &current, &next).unwrap();

        let base_reward = current.base_reward(1).unwrap();
        assert_eq!(rewards.proposer_slot, Some(compute_start_slot_at_epoch(EPOCH)));
        assert_eq!(rewards.proposer_reward, base_reward / 8 * 3);
        assert_eq!(rewards.inclusion_delay_reward, 0);
    }

    #[test]
    fn test_inactive_validator_earns_no_attestation_reward() {
        let current = current_snapshot();
        let (previous, _) = neighbours();
        let mut next_parts = snapshot_parts(Revision::Phase0, EPOCH + 1);
        next_parts.validators[0].activation_epoch = EPOCH;
        let next = sealed_snapshot(next_parts);

        let rewards = compute_max_reward(0, &previous, &current, &next).unwrap();

        assert_eq!(rewards.attestation_reward, 0);
        assert!(rewards.inclusion_delay_reward > 0);
    }
}
