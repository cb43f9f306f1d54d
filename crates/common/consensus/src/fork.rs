use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tally_common::primitives::{Epoch, Version};

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize, Encode, Decode)]
pub struct Fork {
    pub previous_version: Version,
    pub current_version: Version,
    #[serde(with = "serde_utils::quoted_u64")]
    pub epoch: Epoch,
}
