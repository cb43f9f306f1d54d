use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{typenum, BitList};
use tally_common::primitives::{Slot, ValidatorIndex};

use crate::attestation_data::AttestationData;

/// Phase0 record of an attestation included on chain, kept in the state until the epoch
/// transition accounts for it.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct PendingAttestation {
    pub aggregation_bits: BitList<typenum::U2048>,
    pub data: AttestationData,
    #[serde(with = "serde_utils::quoted_u64")]
    pub inclusion_delay: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub proposer_index: ValidatorIndex,
}

impl PendingAttestation {
    /// Slot of the block that included this attestation.
    pub fn inclusion_slot(&self) -> Slot {
        self.data.slot + self.inclusion_delay
    }
}
