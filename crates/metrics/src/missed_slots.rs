use alloy_primitives::B256;
use anyhow::ensure;
use tally_common::primitives::{Epoch, Slot};
use tally_consensus::{
    constants::{GENESIS_SLOT, SLOTS_PER_EPOCH, SLOTS_PER_HISTORICAL_ROOT},
    misc::compute_start_slot_at_epoch,
};

use crate::error::Error;

/// Return the slots of ``epoch`` that have no canonical block.
///
/// A slot without a block repeats the root of the slot before it in ``block_roots``. The ring
/// buffer only holds roots of slots before ``state_slot``, so the state's own slot is decided by
/// ``latest_block_slot`` instead.
pub fn detect_missed_slots(
    block_roots: &[B256],
    epoch: Epoch,
    state_slot: Slot,
    latest_block_slot: Slot,
) -> anyhow::Result<Vec<Slot>> {
    ensure!(
        block_roots.len() == SLOTS_PER_HISTORICAL_ROOT as usize,
        Error::MalformedHistoricalRoots {
            length: block_roots.len(),
            expected: SLOTS_PER_HISTORICAL_ROOT as usize,
        }
    );

    let start_slot = compute_start_slot_at_epoch(epoch);
    let end_slot = start_slot + SLOTS_PER_EPOCH;
    let known_end = end_slot.min(state_slot);

    let mut missed_slots: Vec<Slot> = (start_slot..known_end)
        .filter(|&slot| slot != GENESIS_SLOT)
        .filter(|&slot| root_at(block_roots, slot) == root_at(block_roots, slot - 1))
        .collect();

    if (start_slot..end_slot).contains(&state_slot) && latest_block_slot < state_slot {
        missed_slots.push(state_slot);
    }

    Ok(missed_slots)
}

fn root_at(block_roots: &[B256], slot: Slot) -> B256 {
    block_roots[(slot % SLOTS_PER_HISTORICAL_ROOT) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_with(start_slot: Slot, roots: &[B256]) -> Vec<B256> {
        let mut block_roots = vec![B256::repeat_byte(0xff); SLOTS_PER_HISTORICAL_ROOT as usize];
        for (offset, root) in roots.iter().enumerate() {
            block_roots[((start_slot + offset as u64) % SLOTS_PER_HISTORICAL_ROOT) as usize] =
                *root;
        }
        block_roots
    }

    #[test]
    fn test_repeated_roots_are_missed() {
        let epoch = 10;
        let start_slot = compute_start_slot_at_epoch(epoch);
        let [a, b, c] = [1, 2, 3].map(B256::repeat_byte);
        let block_roots = ring_with(start_slot, &[a, a, b, c, c]);

        let missed =
            detect_missed_slots(&block_roots, epoch, start_slot + 5, start_slot + 5).unwrap();

        assert_eq!(missed, vec![start_slot + 1, start_slot + 4]);
    }

    #[test]
    fn test_first_slot_compares_against_previous_epoch() {
        let epoch = 10;
        let start_slot = compute_start_slot_at_epoch(epoch);
        let a = B256::repeat_byte(1);
        let mut block_roots = ring_with(start_slot, &[a, B256::repeat_byte(2)]);
        block_roots[(start_slot - 1) as usize] = a;

        let missed =
            detect_missed_slots(&block_roots, epoch, start_slot + 2, start_slot + 2).unwrap();

        assert_eq!(missed, vec![start_slot]);
    }

    #[test]
    fn test_ring_buffer_wraps() {
        // Epoch 256 starts exactly at a multiple of the ring buffer capacity.
        let epoch = SLOTS_PER_HISTORICAL_ROOT / SLOTS_PER_EPOCH;
        let start_slot = compute_start_slot_at_epoch(epoch);
        let a = B256::repeat_byte(7);
        let mut block_roots = ring_with(start_slot, &[a, B256::repeat_byte(8)]);
        block_roots[(SLOTS_PER_HISTORICAL_ROOT - 1) as usize] = a;

        let missed =
            detect_missed_slots(&block_roots, epoch, start_slot + 2, start_slot + 2).unwrap();

        assert_eq!(missed, vec![start_slot]);
    }

    #[test]
    fn test_state_slot_without_block() {
        let epoch = 3;
        let start_slot = compute_start_slot_at_epoch(epoch);
        let roots: Vec<B256> = (1..=31).map(B256::repeat_byte).collect();
        let block_roots = ring_with(start_slot, &roots);
        let state_slot = start_slot + 31;

        assert_eq!(
            detect_missed_slots(&block_roots, epoch, state_slot, state_slot - 1).unwrap(),
            vec![state_slot]
        );
        assert!(detect_missed_slots(&block_roots, epoch, state_slot, state_slot)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_short_ring_buffer_is_rejected() {
        let block_roots = vec![B256::ZERO; SLOTS_PER_EPOCH as usize];

        let error = detect_missed_slots(&block_roots, 0, 3, 3).unwrap_err();

        assert_eq!(
            error.downcast_ref::<Error>(),
            Some(&Error::MalformedHistoricalRoots {
                length: SLOTS_PER_EPOCH as usize,
                expected: SLOTS_PER_HISTORICAL_ROOT as usize,
            })
        );
    }

    #[test]
    fn test_genesis_slot_is_never_missed() {
        let block_roots = vec![B256::ZERO; SLOTS_PER_HISTORICAL_ROOT as usize];

        let missed = detect_missed_slots(&block_roots, 0, 3, 3).unwrap();

        assert_eq!(missed, vec![1, 2]);
    }
}
