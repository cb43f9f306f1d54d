//! Altair and bellatrix reward components.
//!
//! Each timely flag pays its weight of the base reward scaled by the share of active balance that
//! earned the same flag. Sync committee members are paid per produced block, and proposers earn the
//! proposer weight of every attestation and sync aggregate they include.

use tally_common::primitives::{Gwei, Slot, ValidatorIndex};
use tally_consensus::{
    constants::{
        EFFECTIVE_BALANCE_INCREMENT, PARTICIPATION_FLAG_WEIGHTS, PROPOSER_WEIGHT, SLOTS_PER_EPOCH,
        SYNC_COMMITTEE_SIZE, SYNC_REWARD_WEIGHT, WEIGHT_DENOMINATOR,
    },
    helpers::is_active_validator,
};

use super::ValidatorSepRewards;
use crate::snapshot::StateSnapshot;

pub fn compute_max_reward(
    validator_index: ValidatorIndex,
    current: &StateSnapshot,
    next: &StateSnapshot,
) -> anyhow::Result<ValidatorSepRewards> {
    let base_reward = current.base_reward(validator_index)?;
    let mut rewards = ValidatorSepRewards {
        base_reward,
        ..ValidatorSepRewards::zero(validator_index, current.epoch())
    };

    let next_validator = next.validator(validator_index)?;

    if is_active_validator(next_validator, current.participation_epoch()) {
        rewards.flag_index_reward = flag_index_reward(base_reward, current);
    }

    let participant_reward = sync_participant_reward(current);

    rewards.in_sync_committee = next.is_sync_committee_member(&next_validator.pubkey);
    if rewards.in_sync_committee {
        let produced_blocks = SLOTS_PER_EPOCH.saturating_sub(next.missed_slots().len() as u64);
        rewards.sync_committee_reward = participant_reward.saturating_mul(produced_blocks);
    }

    let proposer_slots = next
        .duties()
        .proposer_slots(validator_index)
        .collect::<Vec<Slot>>();
    let proposed_blocks = proposer_slots
        .iter()
        .filter(|&&slot| !next.is_missed_slot(slot))
        .count() as u64;

    rewards.proposer_slot = proposer_slots.first().copied();
    rewards.proposer_reward = proposed_blocks
        * (proposer_attestation_reward(current) + proposer_sync_reward(participant_reward));

    Ok(rewards)
}

/// ``base_reward * weight * participating_increments // (active_increments * WEIGHT_DENOMINATOR)``
/// summed over the timely flags.
fn flag_index_reward(base_reward: Gwei, snapshot: &StateSnapshot) -> Gwei {
    let active_increments = snapshot.total_active_increments();
    if active_increments == 0 {
        return 0;
    }

    PARTICIPATION_FLAG_WEIGHTS
        .iter()
        .map(|&(flag_index, weight)| {
            let participating_increments =
                snapshot.attesting_balance(flag_index) / EFFECTIVE_BALANCE_INCREMENT;
            base_reward * weight * participating_increments
                / (active_increments * WEIGHT_DENOMINATOR)
        })
        .sum()
}

fn total_base_rewards(snapshot: &StateSnapshot) -> Gwei {
    snapshot.base_reward_per_increment() * snapshot.total_active_increments()
}

/// Reward of one sync committee member for one produced block.
pub fn sync_participant_reward(snapshot: &StateSnapshot) -> Gwei {
    let max_participant_rewards =
        total_base_rewards(snapshot) * SYNC_REWARD_WEIGHT / WEIGHT_DENOMINATOR / SLOTS_PER_EPOCH;
    max_participant_rewards / SYNC_COMMITTEE_SIZE
}

/// Proposer share of one block worth of perfectly timely attestations.
fn proposer_attestation_reward(snapshot: &StateSnapshot) -> Gwei {
    let flag_weights: u64 = PARTICIPATION_FLAG_WEIGHTS.iter().map(|(_, weight)| weight).sum();
    let proposer_reward_denominator =
        (WEIGHT_DENOMINATOR - PROPOSER_WEIGHT) * WEIGHT_DENOMINATOR / PROPOSER_WEIGHT;
    total_base_rewards(snapshot) * flag_weights / proposer_reward_denominator / SLOTS_PER_EPOCH
}

/// Proposer share of a full sync aggregate.
fn proposer_sync_reward(participant_reward: Gwei) -> Gwei {
    participant_reward * PROPOSER_WEIGHT / (WEIGHT_DENOMINATOR - PROPOSER_WEIGHT)
        * SYNC_COMMITTEE_SIZE
}
