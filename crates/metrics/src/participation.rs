//! Attestation correctness bookkeeping.
//!
//! Phase0 states keep every included attestation with its committee position bits; later
//! revisions pack one byte of timely flags per validator. Both are reduced to the same per-flag
//! counters here. Processing consumes the [`SnapshotBuilder`], so a snapshot is processed once.

use anyhow::ensure;
use tally_consensus::{
    constants::{
        PARTICIPATION_FLAG_COUNT, TIMELY_HEAD_FLAG_INDEX, TIMELY_SOURCE_FLAG_INDEX,
        TIMELY_TARGET_FLAG_INDEX,
    },
    helpers::has_flag,
    misc::compute_epoch_at_slot,
    pending_attestation::PendingAttestation,
};
use tracing::debug;

use crate::{
    duties::EpochDuties,
    error::Error,
    snapshot::{AttestationInclusion, SnapshotBuilder, StateSnapshot},
};

impl SnapshotBuilder {
    /// Credit every attester of ``attestations`` with the flags its vote earned.
    ///
    /// ``committees`` must hold the committees of the epoch the attestations were made in.
    pub fn process_pending_attestations(
        mut self,
        attestations: &[PendingAttestation],
        committees: &EpochDuties,
    ) -> anyhow::Result<StateSnapshot> {
        let current_epoch = self.epoch();
        let previous_epoch = self.participation_epoch();

        for attestation in attestations {
            let data = &attestation.data;
            let committee = committees
                .committee(data.slot, data.index)
                .ok_or(Error::CommitteeNotFound {
                    slot: data.slot,
                    index: data.index,
                })?;

            ensure!(
                attestation.aggregation_bits.len() == committee.len(),
                Error::AggregationBitsLengthMismatch {
                    aggregation_bitlist_length: attestation.aggregation_bits.len(),
                    committee_length: committee.len(),
                }
            );

            let attested_epoch = compute_epoch_at_slot(data.slot);
            let matching_source = attested_epoch == current_epoch || attested_epoch == previous_epoch;
            let matching_target =
                self.epoch_boundary_root(data.target.epoch) == Some(data.target.root);
            let matching_head = self.block_root_at_slot(data.slot) == Some(data.beacon_block_root);

            let flags = [
                (TIMELY_SOURCE_FLAG_INDEX, matching_source),
                (TIMELY_TARGET_FLAG_INDEX, matching_target),
                (TIMELY_HEAD_FLAG_INDEX, matching_head),
            ];

            let inclusion = AttestationInclusion {
                attested_slot: data.slot,
                inclusion_slot: attestation.inclusion_slot(),
            };

            for (position, &validator_index) in committee.iter().enumerate() {
                if !attestation.aggregation_bits.get(position).unwrap_or(false) {
                    continue;
                }

                self.mark_attesting(validator_index)?;

                for (flag_index, matching) in flags {
                    if matching {
                        self.record_flag(validator_index, flag_index)?;
                    }
                }

                self.record_inclusion(validator_index, inclusion);
            }
        }

        debug!(
            epoch = current_epoch,
            attestations = attestations.len(),
            "Processed pending attestations"
        );

        Ok(self.seal())
    }

    /// Credit every validator with the timely flags set in its packed participation byte.
    pub fn process_participation_flags(
        mut self,
        participation: &[u8],
    ) -> anyhow::Result<StateSnapshot> {
        ensure!(
            participation.len() == self.validator_count(),
            Error::ParticipationLengthMismatch {
                validators: self.validator_count(),
                participation: participation.len(),
            }
        );

        for (validator_index, &flags) in (0..).zip(participation) {
            for flag_index in 0..PARTICIPATION_FLAG_COUNT {
                if has_flag(flags, flag_index) {
                    self.record_flag(validator_index, flag_index)?;
                }
            }
        }

        debug!(
            epoch = self.epoch(),
            validators = participation.len(),
            "Processed participation flags"
        );

        Ok(self.seal())
    }
}
