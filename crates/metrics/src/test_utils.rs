//! Small, deterministic fixtures shared by the unit tests of this crate and its dependents.

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use ssz_types::{BitList, BitVector, FixedVector, VariableList};
use tally_common::primitives::{Epoch, Gwei, Slot, ValidatorIndex};
use tally_consensus::{
    altair,
    attestation_data::AttestationData,
    beacon_block_header::BeaconBlockHeader,
    bellatrix::{self, execution_payload_header::ExecutionPayloadHeader},
    checkpoint::Checkpoint,
    constants::{FAR_FUTURE_EPOCH, SLOTS_PER_HISTORICAL_ROOT},
    eth_1_data::Eth1Data,
    fork::Fork,
    misc::{compute_end_slot_at_epoch, compute_start_slot_at_epoch},
    pending_attestation::PendingAttestation,
    phase0,
    pubkey::PubKey,
    raw_state::RawBeaconState,
    revision::Revision,
    sync_committee::SyncCommittee,
    validator::Validator,
};

use crate::{
    duties::{BeaconCommittee, EpochDuties, ProposerDuty, StaticDuties},
    snapshot::SnapshotParts,
};

pub const EFFECTIVE_BALANCES: [Gwei; 4] =
    [32_000_000_000, 32_000_000_000, 31_000_000_000, 32_000_000_000];

/// Offset into every fixture epoch of the slot whose block is missing.
pub const MISSED_SLOT_OFFSET: u64 = 9;

/// Distinct, non-zero block root for ``slot``.
pub fn test_root(slot: Slot) -> B256 {
    B256::left_padding_from(&(slot + 1).to_be_bytes())
}

pub fn pubkey(index: ValidatorIndex) -> PubKey {
    PubKey::from([index as u8 + 1; 48])
}

pub fn validator(
    index: ValidatorIndex,
    effective_balance: Gwei,
    activation_epoch: Epoch,
) -> Validator {
    Validator {
        pubkey: pubkey(index),
        withdrawal_credentials: B256::ZERO,
        effective_balance,
        slashed: false,
        activation_eligibility_epoch: activation_epoch.saturating_sub(1),
        activation_epoch,
        exit_epoch: FAR_FUTURE_EPOCH,
        withdrawable_epoch: FAR_FUTURE_EPOCH,
    }
}

pub fn validators() -> Vec<Validator> {
    (0..)
        .zip(EFFECTIVE_BALANCES)
        .map(|(index, effective_balance)| validator(index, effective_balance, 0))
        .collect()
}

pub fn balances() -> Vec<Gwei> {
    EFFECTIVE_BALANCES
        .iter()
        .map(|effective_balance| effective_balance + 100_000_000)
        .collect()
}

/// Ring buffer of a state at ``state_slot`` in which every slot had its own block.
pub fn block_roots(state_slot: Slot) -> Vec<B256> {
    let mut roots: Vec<B256> = (0..SLOTS_PER_HISTORICAL_ROOT).map(test_root).collect();
    for slot in state_slot.saturating_sub(SLOTS_PER_HISTORICAL_ROOT)..state_slot {
        roots[(slot % SLOTS_PER_HISTORICAL_ROOT) as usize] = test_root(slot);
    }
    roots
}

/// Parts of the last state of ``epoch`` with four active validators and no missed slots.
pub fn snapshot_parts(revision: Revision, epoch: Epoch) -> SnapshotParts {
    let slot = compute_end_slot_at_epoch(epoch);
    SnapshotParts {
        revision,
        slot,
        latest_block_slot: slot,
        validators: validators(),
        balances: balances(),
        block_roots: block_roots(slot),
        duties: EpochDuties::new(epoch, vec![], []),
        sync_committee_members: Default::default(),
    }
}

/// Validator ``i`` proposes at offset ``4 * i``; validators 1 and 2 attest at offset 1, validators
/// 0 and 3 at offset 2.
pub fn epoch_duties(epoch: Epoch) -> EpochDuties {
    let start_slot = compute_start_slot_at_epoch(epoch);
    let proposers = (0..EFFECTIVE_BALANCES.len() as u64)
        .map(|validator_index| ProposerDuty {
            pubkey: pubkey(validator_index),
            validator_index,
            slot: start_slot + 4 * validator_index,
        })
        .collect();
    let committees = [
        BeaconCommittee {
            index: 0,
            slot: start_slot + 1,
            validators: vec![1, 2],
        },
        BeaconCommittee {
            index: 0,
            slot: start_slot + 2,
            validators: vec![0, 3],
        },
    ];
    EpochDuties::new(epoch, proposers, committees)
}

pub fn test_duties(epoch: Epoch) -> StaticDuties {
    (epoch.saturating_sub(1)..=epoch + 1).map(epoch_duties).collect()
}

fn fixture_block_roots(epoch: Epoch) -> FixedVector<B256, ssz_types::typenum::U8192> {
    let state_slot = compute_end_slot_at_epoch(epoch);
    let missed_slot = compute_start_slot_at_epoch(epoch) + MISSED_SLOT_OFFSET;
    let mut roots = block_roots(state_slot);
    roots[(missed_slot % SLOTS_PER_HISTORICAL_ROOT) as usize] =
        roots[((missed_slot - 1) % SLOTS_PER_HISTORICAL_ROOT) as usize];
    FixedVector::from(roots)
}

fn latest_block_header(epoch: Epoch) -> BeaconBlockHeader {
    BeaconBlockHeader {
        slot: compute_end_slot_at_epoch(epoch),
        ..Default::default()
    }
}

fn eth1_data() -> Eth1Data {
    Eth1Data {
        deposit_root: B256::ZERO,
        deposit_count: EFFECTIVE_BALANCES.len() as u64,
        block_hash: B256::ZERO,
    }
}

fn fork(epoch: Epoch) -> Fork {
    Fork {
        previous_version: Default::default(),
        current_version: Default::default(),
        epoch,
    }
}

fn sync_committee() -> Arc<SyncCommittee> {
    let pubkeys = (0..512).map(|position| pubkey(position % 3)).collect::<Vec<_>>();
    Arc::new(SyncCommittee {
        pubkeys: FixedVector::from(pubkeys),
        aggregate_pubkey: PubKey::default(),
    })
}

/// Previous epoch participation: validator 0 all flags, 1 source and target, 2 source only.
pub fn participation() -> Vec<u8> {
    vec![0b111, 0b011, 0b001, 0b000]
}

/// Phase0 state at the end of ``epoch`` holding one fully correct attestation by validators 1
/// and 2 for the previous epoch.
pub fn raw_phase0_state(epoch: Epoch) -> RawBeaconState {
    let previous_epoch = epoch - 1;
    let boundary = compute_start_slot_at_epoch(previous_epoch);
    let mut aggregation_bits = BitList::with_capacity(2).expect("two bits fit");
    aggregation_bits.set(0, true).expect("bit 0 exists");
    aggregation_bits.set(1, true).expect("bit 1 exists");

    let attestation = PendingAttestation {
        aggregation_bits,
        data: AttestationData {
            slot: boundary + 1,
            index: 0,
            beacon_block_root: test_root(boundary + 1),
            source: Checkpoint::default(),
            target: Checkpoint {
                epoch: previous_epoch,
                root: test_root(boundary),
            },
        },
        inclusion_delay: 1,
        proposer_index: 0,
    };

    RawBeaconState::Phase0(Box::new(phase0::beacon_state::BeaconState {
        genesis_time: 1_606_824_023,
        genesis_validators_root: B256::ZERO,
        slot: compute_end_slot_at_epoch(epoch),
        fork: fork(0),
        latest_block_header: latest_block_header(epoch),
        block_roots: fixture_block_roots(epoch),
        state_roots: FixedVector::from_elem(B256::ZERO),
        historical_roots: VariableList::default(),
        eth1_data: eth1_data(),
        eth1_data_votes: VariableList::default(),
        eth1_deposit_index: EFFECTIVE_BALANCES.len() as u64,
        validators: VariableList::from(validators()),
        balances: VariableList::from(balances()),
        randao_mixes: FixedVector::from_elem(B256::ZERO),
        slashings: FixedVector::from_elem(0),
        previous_epoch_attestations: VariableList::from(vec![attestation]),
        current_epoch_attestations: VariableList::default(),
        justification_bits: BitVector::new(),
        previous_justified_checkpoint: Checkpoint::default(),
        current_justified_checkpoint: Checkpoint::default(),
        finalized_checkpoint: Checkpoint::default(),
    }))
}

fn altair_state(epoch: Epoch) -> altair::beacon_state::BeaconState {
    altair::beacon_state::BeaconState {
        genesis_time: 1_606_824_023,
        genesis_validators_root: B256::ZERO,
        slot: compute_end_slot_at_epoch(epoch),
        fork: fork(0),
        latest_block_header: latest_block_header(epoch),
        block_roots: fixture_block_roots(epoch),
        state_roots: FixedVector::from_elem(B256::ZERO),
        historical_roots: VariableList::default(),
        eth1_data: eth1_data(),
        eth1_data_votes: VariableList::default(),
        eth1_deposit_index: EFFECTIVE_BALANCES.len() as u64,
        validators: VariableList::from(validators()),
        balances: VariableList::from(balances()),
        randao_mixes: FixedVector::from_elem(B256::ZERO),
        slashings: FixedVector::from_elem(0),
        previous_epoch_participation: VariableList::from(participation()),
        current_epoch_participation: VariableList::from(vec![0; EFFECTIVE_BALANCES.len()]),
        justification_bits: BitVector::new(),
        previous_justified_checkpoint: Checkpoint::default(),
        current_justified_checkpoint: Checkpoint::default(),
        finalized_checkpoint: Checkpoint::default(),
        inactivity_scores: VariableList::from(vec![0; EFFECTIVE_BALANCES.len()]),
        current_sync_committee: sync_committee(),
        next_sync_committee: sync_committee(),
    }
}

/// Altair state at the end of ``epoch`` with [`participation`] and validators 0 to 2 in the sync
/// committee.
pub fn raw_altair_state(epoch: Epoch) -> RawBeaconState {
    RawBeaconState::Altair(Box::new(altair_state(epoch)))
}

/// Bellatrix state shaped like [`raw_altair_state`].
pub fn raw_bellatrix_state(epoch: Epoch) -> RawBeaconState {
    let state = altair_state(epoch);
    RawBeaconState::Bellatrix(Box::new(bellatrix::beacon_state::BeaconState {
        genesis_time: state.genesis_time,
        genesis_validators_root: state.genesis_validators_root,
        slot: state.slot,
        fork: state.fork,
        latest_block_header: state.latest_block_header,
        block_roots: state.block_roots,
        state_roots: state.state_roots,
        historical_roots: state.historical_roots,
        eth1_data: state.eth1_data,
        eth1_data_votes: state.eth1_data_votes,
        eth1_deposit_index: state.eth1_deposit_index,
        validators: state.validators,
        balances: state.balances,
        randao_mixes: state.randao_mixes,
        slashings: state.slashings,
        previous_epoch_participation: state.previous_epoch_participation,
        current_epoch_participation: state.current_epoch_participation,
        justification_bits: state.justification_bits,
        previous_justified_checkpoint: state.previous_justified_checkpoint,
        current_justified_checkpoint: state.current_justified_checkpoint,
        finalized_checkpoint: state.finalized_checkpoint,
        inactivity_scores: state.inactivity_scores,
        current_sync_committee: state.current_sync_committee,
        next_sync_committee: state.next_sync_committee,
        latest_execution_payload_header: ExecutionPayloadHeader {
            parent_hash: B256::ZERO,
            fee_recipient: Address::ZERO,
            state_root: B256::ZERO,
            receipts_root: B256::ZERO,
            logs_bloom: FixedVector::from_elem(0),
            prev_randao: B256::ZERO,
            block_number: 0,
            gas_limit: 30_000_000,
            gas_used: 0,
            timestamp: 0,
            extra_data: VariableList::default(),
            base_fee_per_gas: U256::from(7),
            block_hash: B256::ZERO,
            transactions_root: B256::ZERO,
        },
    }))
}

/// Seal ``parts`` without recording any participation.
pub fn sealed_snapshot(parts: SnapshotParts) -> crate::snapshot::StateSnapshot {
    crate::snapshot::SnapshotBuilder::new(parts)
        .expect("fixture parts are well formed")
        .seal()
}
