//! Mainnet preset values and fixed protocol parameters used by the reward rules.

use tally_common::primitives::{Epoch, Gwei, Slot};

pub const GENESIS_EPOCH: Epoch = 0;
pub const GENESIS_SLOT: Slot = 0;
pub const FAR_FUTURE_EPOCH: Epoch = u64::MAX;

pub const SLOTS_PER_EPOCH: u64 = 32;
pub const SLOTS_PER_HISTORICAL_ROOT: u64 = 8192;
pub const MIN_ATTESTATION_INCLUSION_DELAY: u64 = 1;

pub const EFFECTIVE_BALANCE_INCREMENT: Gwei = 1_000_000_000;

// Rewards and penalties
pub const BASE_REWARD_FACTOR: u64 = 64;
pub const PROPOSER_REWARD_QUOTIENT: u64 = 8;

// Altair participation flags
pub const TIMELY_SOURCE_FLAG_INDEX: usize = 0;
pub const TIMELY_TARGET_FLAG_INDEX: usize = 1;
pub const TIMELY_HEAD_FLAG_INDEX: usize = 2;
pub const PARTICIPATION_FLAG_COUNT: usize = 3;

pub const TIMELY_SOURCE_WEIGHT: u64 = 14;
pub const TIMELY_TARGET_WEIGHT: u64 = 26;
pub const TIMELY_HEAD_WEIGHT: u64 = 14;
pub const SYNC_REWARD_WEIGHT: u64 = 2;
pub const PROPOSER_WEIGHT: u64 = 8;
pub const WEIGHT_DENOMINATOR: u64 = 64;

pub const PARTICIPATION_FLAG_WEIGHTS: [(usize, u64); PARTICIPATION_FLAG_COUNT] = [
    (TIMELY_SOURCE_FLAG_INDEX, TIMELY_SOURCE_WEIGHT),
    (TIMELY_TARGET_FLAG_INDEX, TIMELY_TARGET_WEIGHT),
    (TIMELY_HEAD_FLAG_INDEX, TIMELY_HEAD_WEIGHT),
];

pub const SYNC_COMMITTEE_SIZE: u64 = 512;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_denominator() {
        let flag_weights: u64 = PARTICIPATION_FLAG_WEIGHTS
            .iter()
            .map(|(_, weight)| weight)
            .sum();
        assert_eq!(
            flag_weights + SYNC_REWARD_WEIGHT + PROPOSER_WEIGHT,
            WEIGHT_DENOMINATOR
        );
    }
}
