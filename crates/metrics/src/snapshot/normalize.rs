use std::collections::HashSet;

use anyhow::Context as _;
use tally_common::primitives::Epoch;
use tally_consensus::{
    altair, bellatrix, phase0, pubkey::PubKey, raw_state::RawBeaconState, revision::Revision,
    sync_committee::SyncCommittee,
};
use tracing::debug;

use super::{SnapshotBuilder, SnapshotParts, StateSnapshot};
use crate::{
    duties::{DutiesSource, EpochDuties},
    error::Error,
};

/// Convert a raw state into a participation-processed [`StateSnapshot`].
pub fn normalize(
    raw: &RawBeaconState,
    duties: &impl DutiesSource,
) -> anyhow::Result<StateSnapshot> {
    let snapshot = match raw {
        RawBeaconState::Phase0(state) => normalize_phase0(state, duties)?,
        RawBeaconState::Altair(state) => normalize_altair(state, duties)?,
        RawBeaconState::Bellatrix(state) => normalize_bellatrix(state, duties)?,
    };

    debug!(
        epoch = snapshot.epoch(),
        revision = %snapshot.revision(),
        validators = snapshot.validator_count(),
        missed_slots = snapshot.missed_slots().len(),
        "Normalized state snapshot"
    );

    Ok(snapshot)
}

pub fn normalize_phase0(
    state: &phase0::beacon_state::BeaconState,
    duties: &impl DutiesSource,
) -> anyhow::Result<StateSnapshot> {
    let builder = SnapshotBuilder::new(SnapshotParts {
        revision: Revision::Phase0,
        slot: state.slot,
        latest_block_slot: state.latest_block_header.slot,
        validators: state.validators.to_vec(),
        balances: state.balances.to_vec(),
        block_roots: state.block_roots.to_vec(),
        duties: epoch_duties(duties, state.get_current_epoch())?,
        sync_committee_members: HashSet::new(),
    })?;

    let committees = epoch_duties(duties, builder.participation_epoch())?;

    builder.process_pending_attestations(&state.previous_epoch_attestations, &committees)
}

pub fn normalize_altair(
    state: &altair::beacon_state::BeaconState,
    duties: &impl DutiesSource,
) -> anyhow::Result<StateSnapshot> {
    let builder = SnapshotBuilder::new(SnapshotParts {
        revision: Revision::Altair,
        slot: state.slot,
        latest_block_slot: state.latest_block_header.slot,
        validators: state.validators.to_vec(),
        balances: state.balances.to_vec(),
        block_roots: state.block_roots.to_vec(),
        duties: epoch_duties(duties, state.get_current_epoch())?,
        sync_committee_members: sync_committee_members(&state.current_sync_committee),
    })?;

    builder.process_participation_flags(&state.previous_epoch_participation)
}

pub fn normalize_bellatrix(
    state: &bellatrix::beacon_state::BeaconState,
    duties: &impl DutiesSource,
) -> anyhow::Result<StateSnapshot> {
    let builder = SnapshotBuilder::new(SnapshotParts {
        revision: Revision::Bellatrix,
        slot: state.slot,
        latest_block_slot: state.latest_block_header.slot,
        validators: state.validators.to_vec(),
        balances: state.balances.to_vec(),
        block_roots: state.block_roots.to_vec(),
        duties: epoch_duties(duties, state.get_current_epoch())?,
        sync_committee_members: sync_committee_members(&state.current_sync_committee),
    })?;

    builder.process_participation_flags(&state.previous_epoch_participation)
}

fn epoch_duties(duties: &impl DutiesSource, epoch: Epoch) -> anyhow::Result<EpochDuties> {
    duties
        .epoch_duties(epoch)
        .context(Error::DutiesUnavailable { epoch })
}

fn sync_committee_members(sync_committee: &SyncCommittee) -> HashSet<PubKey> {
    sync_committee.pubkeys.iter().copied().collect()
}
