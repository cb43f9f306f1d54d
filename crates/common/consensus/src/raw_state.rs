use alloy_primitives::B256;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use ssz::Decode;
use tally_common::primitives::{Epoch, Gwei, Slot};

use crate::{
    altair, beacon_block_header::BeaconBlockHeader, bellatrix, misc::compute_epoch_at_slot,
    phase0, revision::Revision, validator::Validator,
};

/// A consensus state as served by a beacon node, tagged with the revision it was produced under.
///
/// The serde representation matches the debug state envelope of the beacon API:
/// `{ "version": "altair", "data": { .. } }`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "version", content = "data", rename_all = "lowercase")]
pub enum RawBeaconState {
    Phase0(Box<phase0::beacon_state::BeaconState>),
    Altair(Box<altair::beacon_state::BeaconState>),
    Bellatrix(Box<bellatrix::beacon_state::BeaconState>),
}

impl RawBeaconState {
    /// Decode an SSZ encoded state. SSZ carries no revision, so the caller supplies it.
    pub fn from_ssz_bytes(revision: Revision, bytes: &[u8]) -> anyhow::Result<Self> {
        let state = match revision {
            Revision::Phase0 => Self::Phase0(Box::new(
                phase0::beacon_state::BeaconState::from_ssz_bytes(bytes)
                    .map_err(|err| anyhow!("Failed to decode phase0 state {err:?}"))?,
            )),
            Revision::Altair => Self::Altair(Box::new(
                altair::beacon_state::BeaconState::from_ssz_bytes(bytes)
                    .map_err(|err| anyhow!("Failed to decode altair state {err:?}"))?,
            )),
            Revision::Bellatrix => Self::Bellatrix(Box::new(
                bellatrix::beacon_state::BeaconState::from_ssz_bytes(bytes)
                    .map_err(|err| anyhow!("Failed to decode bellatrix state {err:?}"))?,
            )),
        };
        Ok(state)
    }

    pub fn revision(&self) -> Revision {
        match self {
            Self::Phase0(_) => Revision::Phase0,
            Self::Altair(_) => Revision::Altair,
            Self::Bellatrix(_) => Revision::Bellatrix,
        }
    }

    pub fn slot(&self) -> Slot {
        match self {
            Self::Phase0(state) => state.slot,
            Self::Altair(state) => state.slot,
            Self::Bellatrix(state) => state.slot,
        }
    }

    pub fn epoch(&self) -> Epoch {
        compute_epoch_at_slot(self.slot())
    }

    pub fn validators(&self) -> &[Validator] {
        match self {
            Self::Phase0(state) => &state.validators,
            Self::Altair(state) => &state.validators,
            Self::Bellatrix(state) => &state.validators,
        }
    }

    pub fn balances(&self) -> &[Gwei] {
        match self {
            Self::Phase0(state) => &state.balances,
            Self::Altair(state) => &state.balances,
            Self::Bellatrix(state) => &state.balances,
        }
    }

    pub fn block_roots(&self) -> &[B256] {
        match self {
            Self::Phase0(state) => &state.block_roots,
            Self::Altair(state) => &state.block_roots,
            Self::Bellatrix(state) => &state.block_roots,
        }
    }

    pub fn latest_block_header(&self) -> &BeaconBlockHeader {
        match self {
            Self::Phase0(state) => &state.latest_block_header,
            Self::Altair(state) => &state.latest_block_header,
            Self::Bellatrix(state) => &state.latest_block_header,
        }
    }
}
