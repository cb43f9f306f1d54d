//! Normalized, revision independent view of one epoch boundary state.
//!
//! A [`SnapshotBuilder`] is produced by normalization and is the only mutable form. Processing
//! participation consumes the builder and seals it into a [`StateSnapshot`], which is read-only.

pub mod normalize;

use std::collections::{BTreeMap, BTreeSet, HashSet};

use alloy_primitives::B256;
use anyhow::ensure;
use num_integer::Roots as _;
use tally_common::primitives::{Epoch, Gwei, Slot, ValidatorIndex};
use tally_consensus::{
    constants::{
        BASE_REWARD_FACTOR, EFFECTIVE_BALANCE_INCREMENT, PARTICIPATION_FLAG_COUNT,
        SLOTS_PER_HISTORICAL_ROOT,
    },
    helpers::is_active_validator,
    misc::{compute_epoch_at_slot, compute_start_slot_at_epoch, previous_epoch},
    pubkey::PubKey,
    revision::Revision,
    validator::Validator,
};

use crate::{duties::EpochDuties, error::Error, missed_slots::detect_missed_slots};

/// An attestation by one validator for ``attested_slot`` that made it on chain at
/// ``inclusion_slot``.
#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
pub struct AttestationInclusion {
    pub attested_slot: Slot,
    pub inclusion_slot: Slot,
}

/// Fields mapped out of a raw state before any aggregate is derived.
#[derive(Debug, Clone)]
pub struct SnapshotParts {
    pub revision: Revision,
    pub slot: Slot,
    pub latest_block_slot: Slot,
    pub validators: Vec<Validator>,
    pub balances: Vec<Gwei>,
    pub block_roots: Vec<B256>,
    pub duties: EpochDuties,
    pub sync_committee_members: HashSet<PubKey>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct StateSnapshot {
    revision: Revision,
    epoch: Epoch,
    slot: Slot,
    participation_epoch: Epoch,
    validators: Vec<Validator>,
    balances: Vec<Gwei>,
    duties: EpochDuties,
    block_roots: Vec<B256>,
    active_validator_count: u64,
    total_active_effective_balance: Gwei,
    total_active_real_balance: Gwei,
    attesting_balance_per_flag: [Gwei; PARTICIPATION_FLAG_COUNT],
    correct_flags_per_validator: [Vec<u64>; PARTICIPATION_FLAG_COUNT],
    attesting_validators: BTreeSet<ValidatorIndex>,
    validator_attestation_inclusion: BTreeMap<ValidatorIndex, Vec<AttestationInclusion>>,
    inclusions_by_slot: BTreeMap<Slot, u64>,
    missed_slots: Vec<Slot>,
    sync_committee_members: HashSet<PubKey>,
}

impl StateSnapshot {
    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Epoch whose attestations are recorded in this snapshot.
    pub fn participation_epoch(&self) -> Epoch {
        self.participation_epoch
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    pub fn validator(&self, index: ValidatorIndex) -> anyhow::Result<&Validator> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.validators.get(index))
            .ok_or_else(|| self.out_of_bounds(index))
    }

    pub fn balance(&self, index: ValidatorIndex) -> anyhow::Result<Gwei> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.balances.get(index))
            .copied()
            .ok_or_else(|| self.out_of_bounds(index))
    }

    pub fn duties(&self) -> &EpochDuties {
        &self.duties
    }

    pub fn block_roots(&self) -> &[B256] {
        &self.block_roots
    }

    /// Return the block root at a recent ``slot``, if the ring buffer still holds it.
    pub fn block_root_at_slot(&self, slot: Slot) -> Option<B256> {
        block_root_at_slot(&self.block_roots, self.slot, slot)
    }

    pub fn active_validator_count(&self) -> u64 {
        self.active_validator_count
    }

    pub fn total_active_effective_balance(&self) -> Gwei {
        self.total_active_effective_balance
    }

    pub fn total_active_real_balance(&self) -> Gwei {
        self.total_active_real_balance
    }

    pub fn total_active_increments(&self) -> u64 {
        self.total_active_effective_balance / EFFECTIVE_BALANCE_INCREMENT
    }

    pub fn attesting_balance_per_flag(&self) -> [Gwei; PARTICIPATION_FLAG_COUNT] {
        self.attesting_balance_per_flag
    }

    pub fn attesting_balance(&self, flag_index: usize) -> Gwei {
        self.attesting_balance_per_flag[flag_index]
    }

    /// Number of times ``index`` was credited with ``flag_index``.
    pub fn correct_flag_count(
        &self,
        flag_index: usize,
        index: ValidatorIndex,
    ) -> anyhow::Result<u64> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.correct_flags_per_validator[flag_index].get(index))
            .copied()
            .ok_or_else(|| self.out_of_bounds(index))
    }

    pub fn attesting_validators(&self) -> &BTreeSet<ValidatorIndex> {
        &self.attesting_validators
    }

    pub fn has_attested(&self, index: ValidatorIndex) -> bool {
        self.attesting_validators.contains(&index)
    }

    pub fn attestation_inclusions(&self, index: ValidatorIndex) -> &[AttestationInclusion] {
        self.validator_attestation_inclusion
            .get(&index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of attesters whose earliest inclusion happened in the block at ``slot``.
    pub fn inclusions_at(&self, slot: Slot) -> u64 {
        self.inclusions_by_slot.get(&slot).copied().unwrap_or_default()
    }

    pub fn missed_slots(&self) -> &[Slot] {
        &self.missed_slots
    }

    pub fn is_missed_slot(&self, slot: Slot) -> bool {
        self.missed_slots.contains(&slot)
    }

    pub fn sync_committee_members(&self) -> &HashSet<PubKey> {
        &self.sync_committee_members
    }

    pub fn is_sync_committee_member(&self, pubkey: &PubKey) -> bool {
        self.sync_committee_members.contains(pubkey)
    }

    /// ``EFFECTIVE_BALANCE_INCREMENT * BASE_REWARD_FACTOR // integer_squareroot(total)``.
    ///
    /// Zero when no balance is active.
    pub fn base_reward_per_increment(&self) -> Gwei {
        base_reward_per_increment(self.total_active_effective_balance)
    }

    pub fn base_reward(&self, index: ValidatorIndex) -> anyhow::Result<Gwei> {
        let effective_balance = self.validator(index)?.effective_balance;
        Ok(compute_base_reward(
            effective_balance,
            self.base_reward_per_increment(),
        ))
    }

    fn out_of_bounds(&self, index: ValidatorIndex) -> anyhow::Error {
        Error::ValidatorIndexOutOfBounds {
            index,
            epoch: self.epoch,
        }
        .into()
    }
}

pub fn base_reward_per_increment(total_active_balance: Gwei) -> Gwei {
    let total_active_balance_sqrt = total_active_balance.sqrt();
    if total_active_balance_sqrt == 0 {
        return 0;
    }
    EFFECTIVE_BALANCE_INCREMENT * BASE_REWARD_FACTOR / total_active_balance_sqrt
}

pub fn compute_base_reward(effective_balance: Gwei, base_reward_per_increment: Gwei) -> Gwei {
    let increments = effective_balance / EFFECTIVE_BALANCE_INCREMENT;
    increments * base_reward_per_increment
}

fn block_root_at_slot(block_roots: &[B256], state_slot: Slot, slot: Slot) -> Option<B256> {
    if slot < state_slot && state_slot <= slot + SLOTS_PER_HISTORICAL_ROOT {
        block_roots
            .get((slot % SLOTS_PER_HISTORICAL_ROOT) as usize)
            .copied()
    } else {
        None
    }
}

/// Mutable snapshot under construction.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    snapshot: StateSnapshot,
}

impl SnapshotBuilder {
    /// Map ``parts`` onto the common schema, then allocate the per-flag tables, sum the active
    /// balances and detect missed slots.
    pub fn new(parts: SnapshotParts) -> anyhow::Result<Self> {
        let SnapshotParts {
            revision,
            slot,
            latest_block_slot,
            validators,
            balances,
            block_roots,
            duties,
            sync_committee_members,
        } = parts;

        ensure!(!validators.is_empty(), Error::EmptyValidatorRegistry);
        ensure!(
            validators.len() == balances.len(),
            Error::BalancesLengthMismatch {
                validators: validators.len(),
                balances: balances.len(),
            }
        );
        let epoch = compute_epoch_at_slot(slot);
        let correct_flags_per_validator = core::array::from_fn(|_| vec![0; validators.len()]);

        let mut active_validator_count = 0;
        let mut total_active_effective_balance = 0;
        let mut total_active_real_balance = 0;

        for (validator, balance) in validators.iter().zip(&balances) {
            if is_active_validator(validator, epoch) {
                active_validator_count += 1;
                total_active_effective_balance += validator.effective_balance;
                total_active_real_balance += balance;
            }
        }

        let missed_slots = detect_missed_slots(&block_roots, epoch, slot, latest_block_slot)?;

        Ok(Self {
            snapshot: StateSnapshot {
                revision,
                epoch,
                slot,
                participation_epoch: previous_epoch(epoch),
                validators,
                balances,
                duties,
                block_roots,
                active_validator_count,
                total_active_effective_balance,
                total_active_real_balance,
                attesting_balance_per_flag: [0; PARTICIPATION_FLAG_COUNT],
                correct_flags_per_validator,
                attesting_validators: BTreeSet::new(),
                validator_attestation_inclusion: BTreeMap::new(),
                inclusions_by_slot: BTreeMap::new(),
                missed_slots,
                sync_committee_members,
            },
        })
    }

    pub fn epoch(&self) -> Epoch {
        self.snapshot.epoch
    }

    pub fn participation_epoch(&self) -> Epoch {
        self.snapshot.participation_epoch
    }

    pub fn validator_count(&self) -> usize {
        self.snapshot.validators.len()
    }

    pub(crate) fn block_root_at_slot(&self, slot: Slot) -> Option<B256> {
        self.snapshot.block_root_at_slot(slot)
    }

    pub(crate) fn epoch_boundary_root(&self, epoch: Epoch) -> Option<B256> {
        self.block_root_at_slot(compute_start_slot_at_epoch(epoch))
    }

    /// Credit ``index`` with ``flag_index``. The effective balance is accumulated only the first
    /// time, so duplicate aggregates do not inflate the flag total.
    pub(crate) fn record_flag(
        &mut self,
        index: ValidatorIndex,
        flag_index: usize,
    ) -> anyhow::Result<()> {
        let effective_balance = self.snapshot.validator(index)?.effective_balance;
        let position = usize::try_from(index)?;
        let counter = &mut self.snapshot.correct_flags_per_validator[flag_index][position];

        if *counter == 0 {
            self.snapshot.attesting_balance_per_flag[flag_index] += effective_balance;
        }
        *counter += 1;
        self.snapshot.attesting_validators.insert(index);

        Ok(())
    }

    pub(crate) fn mark_attesting(&mut self, index: ValidatorIndex) -> anyhow::Result<()> {
        self.snapshot.validator(index)?;
        self.snapshot.attesting_validators.insert(index);
        Ok(())
    }

    pub(crate) fn record_inclusion(
        &mut self,
        index: ValidatorIndex,
        inclusion: AttestationInclusion,
    ) {
        self.snapshot
            .validator_attestation_inclusion
            .entry(index)
            .or_default()
            .push(inclusion);
    }

    /// Freeze the snapshot and index inclusions by the slot of each attester's earliest inclusion.
    pub(crate) fn seal(mut self) -> StateSnapshot {
        let mut inclusions_by_slot = BTreeMap::new();

        for inclusions in self.snapshot.validator_attestation_inclusion.values() {
            let earliest = inclusions.iter().map(|inclusion| inclusion.inclusion_slot).min();
            if let Some(earliest) = earliest {
                *inclusions_by_slot.entry(earliest).or_default() += 1;
            }
        }

        self.snapshot.inclusions_by_slot = inclusions_by_slot;
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::test_utils::{snapshot_parts, validator};

    #[test]
    fn test_totals_only_count_active_validators() {
        let mut parts = snapshot_parts(Revision::Altair, 10);
        parts.validators = vec![
            validator(0, 32_000_000_000, 0),
            validator(1, 31_000_000_000, 0),
            validator(2, 32_000_000_000, 11),
        ];
        parts.validators[1].exit_epoch = 10;
        parts.balances = vec![32_100_000_000, 31_500_000_000, 32_000_000_000];

        let snapshot = SnapshotBuilder::new(parts).unwrap().seal();

        assert_eq!(snapshot.active_validator_count(), 1);
        assert_eq!(snapshot.total_active_effective_balance(), 32_000_000_000);
        assert_eq!(snapshot.total_active_real_balance(), 32_100_000_000);
        assert_eq!(snapshot.participation_epoch(), 9);
    }

    #[test]
    fn test_empty_registry_is_rejected() {
        let mut parts = snapshot_parts(Revision::Phase0, 4);
        parts.validators.clear();
        parts.balances.clear();

        let error = SnapshotBuilder::new(parts).unwrap_err();

        assert_eq!(error.downcast_ref::<Error>(), Some(&Error::EmptyValidatorRegistry));
    }

    #[test]
    fn test_malformed_roots_are_rejected() {
        let mut parts = snapshot_parts(Revision::Phase0, 4);
        parts.block_roots.truncate(64);

        let error = SnapshotBuilder::new(parts).unwrap_err();

        assert_eq!(
            error.downcast_ref::<Error>(),
            Some(&Error::MalformedHistoricalRoots {
                length: 64,
                expected: 8192
            })
        );
    }

    #[test]
    fn test_balance_lookup_miss_names_index_and_epoch() {
        let snapshot = SnapshotBuilder::new(snapshot_parts(Revision::Altair, 6))
            .unwrap()
            .seal();

        let error = snapshot.balance(99).unwrap_err();

        assert_eq!(
            error.downcast_ref::<Error>(),
            Some(&Error::ValidatorIndexOutOfBounds { index: 99, epoch: 6 })
        );
    }

    #[rstest]
    #[case(32_000_000_000, 8_159_424)]
    #[case(31_000_000_000, 7_904_442)]
    #[case(31_999_999_999, 7_904_442)]
    fn test_base_reward(#[case] effective_balance: Gwei, #[case] expected: Gwei) {
        // integer_squareroot(63 ETH) = 250_998
        assert_eq!(base_reward_per_increment(63_000_000_000), 254_982);
        assert_eq!(compute_base_reward(effective_balance, 254_982), expected);
    }

    #[test]
    fn test_base_reward_scales_with_effective_balance() {
        let per_increment = base_reward_per_increment(1_000_000_000_000_000);
        assert_eq!(
            compute_base_reward(32_000_000_000, per_increment),
            2 * compute_base_reward(16_000_000_000, per_increment)
        );
    }

    #[test]
    fn test_zero_active_balance_has_no_base_reward() {
        assert_eq!(base_reward_per_increment(0), 0);
    }

    #[test]
    fn test_duplicate_flags_count_balance_once() {
        let mut builder = SnapshotBuilder::new(snapshot_parts(Revision::Phase0, 6)).unwrap();

        builder.record_flag(1, 0).unwrap();
        builder.record_flag(1, 0).unwrap();
        let snapshot = builder.seal();

        assert_eq!(snapshot.correct_flag_count(0, 1).unwrap(), 2);
        assert_eq!(
            snapshot.attesting_balance(0),
            snapshot.validator(1).unwrap().effective_balance
        );
        assert!(snapshot.has_attested(1));
    }

    #[test]
    fn test_inclusions_are_indexed_by_earliest_slot() {
        let mut builder = SnapshotBuilder::new(snapshot_parts(Revision::Phase0, 6)).unwrap();
        let inclusion = |attested_slot, inclusion_slot| AttestationInclusion {
            attested_slot,
            inclusion_slot,
        };

        builder.record_inclusion(0, inclusion(170, 172));
        builder.record_inclusion(0, inclusion(170, 171));
        builder.record_inclusion(1, inclusion(171, 172));
        let snapshot = builder.seal();

        assert_eq!(snapshot.inclusions_at(171), 1);
        assert_eq!(snapshot.inclusions_at(172), 1);
        assert_eq!(snapshot.inclusions_at(173), 0);
        assert_eq!(snapshot.attestation_inclusions(0).len(), 2);
    }
}
