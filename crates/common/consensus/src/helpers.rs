use tally_common::primitives::Epoch;

use crate::validator::Validator;

/// Check if ``validator`` is active at ``epoch``.
pub fn is_active_validator(validator: &Validator, epoch: Epoch) -> bool {
    validator.activation_epoch <= epoch && epoch < validator.exit_epoch
}

pub fn has_flag(flags: u8, flag_index: usize) -> bool {
    let flag = 1 << flag_index;
    flags & flag == flag
}
