use tally_common::primitives::{Epoch, Slot};

use crate::constants::SLOTS_PER_EPOCH;

/// Return the epoch number at ``slot``.
pub fn compute_epoch_at_slot(slot: Slot) -> Epoch {
    slot / SLOTS_PER_EPOCH
}

/// Return the start slot of ``epoch``.
pub fn compute_start_slot_at_epoch(epoch: Epoch) -> Slot {
    epoch * SLOTS_PER_EPOCH
}

/// Return the last slot of ``epoch``.
pub fn compute_end_slot_at_epoch(epoch: Epoch) -> Slot {
    compute_start_slot_at_epoch(epoch) + SLOTS_PER_EPOCH - 1
}

/// Return the epoch before ``epoch``, saturating at genesis.
pub fn previous_epoch(epoch: Epoch) -> Epoch {
    epoch.saturating_sub(1)
}
