use tally_common::primitives::{CommitteeIndex, Epoch, Slot, ValidatorIndex};
use thiserror::Error;

/// Failures raised while building snapshots or computing rewards.
///
/// Functions return `anyhow::Result`; callers that need to tell a single bad record apart from a
/// broken snapshot can `downcast_ref::<Error>()`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error(
        "aggregation bitlist length {aggregation_bitlist_length} does not match committee length \
         {committee_length}"
    )]
    AggregationBitsLengthMismatch {
        aggregation_bitlist_length: usize,
        committee_length: usize,
    },
    #[error("balances length {balances} does not match validators length {validators}")]
    BalancesLengthMismatch { validators: usize, balances: usize },
    #[error("no committee {index} at slot {slot}")]
    CommitteeNotFound { slot: Slot, index: CommitteeIndex },
    #[error("duties for epoch {epoch} are unavailable")]
    DutiesUnavailable { epoch: Epoch },
    #[error("validator registry is empty")]
    EmptyValidatorRegistry,
    #[error("historical roots buffer has {length} entries, expected {expected}")]
    MalformedHistoricalRoots { length: usize, expected: usize },
    #[error("snapshots for epochs {previous}, {current} and {next} are not consecutive")]
    NonConsecutiveEpochs {
        previous: Epoch,
        current: Epoch,
        next: Epoch,
    },
    #[error("participation length {participation} does not match validators length {validators}")]
    ParticipationLengthMismatch {
        validators: usize,
        participation: usize,
    },
    #[error("validator index {index} is out of bounds in epoch {epoch}")]
    ValidatorIndexOutOfBounds { index: ValidatorIndex, epoch: Epoch },
}
