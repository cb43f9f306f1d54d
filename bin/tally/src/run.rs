use std::{fs::File, io, num::NonZeroUsize, path::Path, sync::Arc};

use anyhow::{anyhow, Context};
use serde::Serialize;
use tally_common::primitives::{Gwei, ValidatorIndex};
use tally_executor::TallyExecutor;
use tally_metrics::{
    report::ValidatorEpochReport,
    snapshot::{normalize::normalize, StateSnapshot},
    window::EpochWindow,
};
use tokio::task::JoinError;
use tracing::info;

use crate::{
    cli::{RewardsCommand, SummaryCommand},
    duties::DutiesDirectory,
    state::load_state,
};

pub fn run_rewards(cmd: RewardsCommand) -> anyhow::Result<()> {
    let executor = TallyExecutor::new(cmd.workers.map(NonZeroUsize::get))?;
    let duties = DutiesDirectory::new(&cmd.input.duties);
    let revision = cmd.input.revision;

    let normalize_tasks = [cmd.previous, cmd.current, cmd.next].map(|path| {
        let duties = duties.clone();
        move || -> anyhow::Result<StateSnapshot> {
            let state = load_state(&path, revision)?;
            normalize(&state, &duties)
                .with_context(|| format!("Failed to process {}", path.display()))
        }
    });
    let [previous, current, next] = <[StateSnapshot; 3]>::try_from(join_all(
        executor.run_blocking(normalize_tasks),
    )?)
    .map_err(|_| anyhow!("Expected three snapshots"))?;

    let window = EpochWindow::new(Arc::new(previous), Arc::new(current), Arc::new(next))?;
    let validator_indices: Vec<ValidatorIndex> = match cmd.validators {
        Some(validator_indices) => validator_indices,
        None => window.validator_indices().collect(),
    };

    info!(
        epoch = window.epoch(),
        revision = %window.current().revision(),
        validators = validator_indices.len(),
        "Computing rewards"
    );

    let report_tasks = validator_indices
        .chunks(cmd.chunk_size.get())
        .map(|chunk| {
            let window = window.clone();
            let chunk = chunk.to_vec();
            move || window.reports(chunk)
        })
        .collect::<Vec<_>>();
    let reports = join_all(executor.run_blocking(report_tasks))?
        .into_iter()
        .flatten()
        .collect::<Vec<ValidatorEpochReport>>();

    let total_max_reward: Gwei = reports.iter().map(|report| report.rewards.max_reward).sum();
    info!(
        epoch = window.epoch(),
        reports = reports.len(),
        total_max_reward,
        "Computed rewards"
    );

    write_yaml(cmd.input.output.as_deref(), &reports)
}

pub fn run_summary(cmd: SummaryCommand) -> anyhow::Result<()> {
    let duties = DutiesDirectory::new(&cmd.input.duties);
    let state = load_state(&cmd.state, cmd.input.revision)?;
    let summary = normalize(&state, &duties)?.summary();

    info!(
        epoch = summary.epoch,
        missed_slots = summary.missed_slot_count,
        "Summarized state"
    );

    write_yaml(cmd.input.output.as_deref(), &summary)
}

/// Flatten the outcome of [`TallyExecutor::run_blocking`] into the task outputs.
fn join_all<R>(
    results: Option<Vec<Result<anyhow::Result<R>, JoinError>>>,
) -> anyhow::Result<Vec<R>> {
    results
        .ok_or_else(|| anyhow!("Interrupted before every task finished"))?
        .into_iter()
        .map(|result| result?)
        .collect()
}

fn write_yaml(output: Option<&Path>, value: &impl Serialize) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            serde_yaml::to_writer(file, value)?;
            info!(path = %path.display(), "Wrote output");
        }
        None => serde_yaml::to_writer(io::stdout().lock(), value)?,
    }
    Ok(())
}
