pub mod altair;
pub mod attestation_data;
pub mod beacon_block_header;
pub mod bellatrix;
pub mod checkpoint;
pub mod constants;
pub mod eth_1_data;
pub mod fork;
pub mod helpers;
pub mod misc;
pub mod pending_attestation;
pub mod phase0;
pub mod pubkey;
pub mod raw_state;
pub mod revision;
pub mod sync_committee;
pub mod validator;
