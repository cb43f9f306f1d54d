use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tally_common::primitives::Epoch;

#[derive(Debug, Eq, Hash, PartialEq, Clone, Copy, Default, Serialize, Deserialize, Encode, Decode)]
pub struct Checkpoint {
    #[serde(with = "serde_utils::quoted_u64")]
    pub epoch: Epoch,
    pub root: B256,
}
