use alloy_primitives::FixedBytes;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};

#[derive(
    Debug, Default, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize, Encode, Decode,
)]
#[serde(transparent)]
#[ssz(struct_behaviour = "transparent")]
pub struct PubKey {
    pub inner: FixedBytes<48>,
}

impl From<[u8; 48]> for PubKey {
    fn from(bytes: [u8; 48]) -> Self {
        Self {
            inner: FixedBytes(bytes),
        }
    }
}
