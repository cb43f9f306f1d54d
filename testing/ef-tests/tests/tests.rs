#![cfg(feature = "ef-tests")]

use ef_tests::{test_consensus_type, test_raw_state};
use tally_consensus::{
    altair, attestation_data::AttestationData, beacon_block_header::BeaconBlockHeader, bellatrix,
    checkpoint::Checkpoint, eth_1_data::Eth1Data, fork::Fork,
    pending_attestation::PendingAttestation, phase0, raw_state::RawBeaconState,
    revision::Revision, sync_committee::SyncCommittee, validator::Validator,
};

// Containers shared by every revision
test_consensus_type!(phase0, AttestationData);
test_consensus_type!(phase0, BeaconBlockHeader);
test_consensus_type!(phase0, Checkpoint);
test_consensus_type!(phase0, Eth1Data);
test_consensus_type!(phase0, Fork);
test_consensus_type!(phase0, PendingAttestation);
test_consensus_type!(phase0, Validator);
test_consensus_type!(altair, SyncCommittee);

// Beacon states
test_consensus_type!(phase0, BeaconState, phase0::beacon_state::BeaconState);
test_consensus_type!(altair, BeaconState, altair::beacon_state::BeaconState);
test_consensus_type!(bellatrix, BeaconState, bellatrix::beacon_state::BeaconState);
test_consensus_type!(
    bellatrix,
    ExecutionPayloadHeader,
    bellatrix::execution_payload_header::ExecutionPayloadHeader
);

test_raw_state!(phase0, Revision::Phase0);
test_raw_state!(altair, Revision::Altair);
test_raw_state!(bellatrix, Revision::Bellatrix);
