use std::{fs, path::PathBuf};

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use tally_common::primitives::Epoch;
use tally_metrics::duties::{BeaconCommittee, DutiesSource, EpochDuties, ProposerDuty};

/// Contents of one ``<epoch>.yaml`` duties file, in beacon API shape.
#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DutiesFile {
    pub proposers: Vec<ProposerDuty>,
    pub committees: Vec<BeaconCommittee>,
}

/// Duties read lazily from a directory of per-epoch files.
#[derive(Debug, Clone)]
pub struct DutiesDirectory {
    root: PathBuf,
}

impl DutiesDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, epoch: Epoch) -> PathBuf {
        self.root.join(format!("{epoch}.yaml"))
    }
}

impl DutiesSource for DutiesDirectory {
    fn epoch_duties(&self, epoch: Epoch) -> anyhow::Result<EpochDuties> {
        let path = self.path(epoch);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let DutiesFile {
            proposers,
            committees,
        } = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        ensure!(
            !proposers.is_empty(),
            "{} lists no proposers for epoch {epoch}",
            path.display()
        );
        Ok(EpochDuties::new(epoch, proposers, committees))
    }
}
