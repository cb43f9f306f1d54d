use alloy_primitives::aliases::B32;

pub type CommitteeIndex = u64;
pub type Epoch = u64;
pub type Gwei = u64;
pub type Slot = u64;
pub type ValidatorIndex = u64;

/// Fork version
pub type Version = B32;
