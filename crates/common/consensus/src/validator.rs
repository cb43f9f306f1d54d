use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tally_common::primitives::{Epoch, Gwei};

use crate::pubkey::PubKey;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct Validator {
    pub pubkey: PubKey,

    /// Commitment to pubkey for withdrawals
    pub withdrawal_credentials: B256,

    /// Balance at stake
    #[serde(with = "serde_utils::quoted_u64")]
    pub effective_balance: Gwei,
    pub slashed: bool,

    /// When criteria for activation were met
    #[serde(with = "serde_utils::quoted_u64")]
    pub activation_eligibility_epoch: Epoch,
    #[serde(with = "serde_utils::quoted_u64")]
    pub activation_epoch: Epoch,
    #[serde(with = "serde_utils::quoted_u64")]
    pub exit_epoch: Epoch,

    /// When validator can withdraw funds
    #[serde(with = "serde_utils::quoted_u64")]
    pub withdrawable_epoch: Epoch,
}
