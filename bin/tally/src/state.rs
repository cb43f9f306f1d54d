use std::{fs, path::Path};

use anyhow::{anyhow, bail, ensure, Context};
use snap::raw::Decoder;
use tally_consensus::{raw_state::RawBeaconState, revision::Revision};
use tracing::debug;

/// Load a beacon state from ``path``.
///
/// ``.ssz`` and ``.ssz_snappy`` files carry no revision, so ``revision`` is required for them.
/// ``.yaml`` and ``.json`` files hold a ``{version, data}`` envelope; when ``revision`` is given it
/// must agree with the envelope.
pub fn load_state(path: &Path, revision: Option<Revision>) -> anyhow::Result<RawBeaconState> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .unwrap_or_default();

    let state = match extension {
        "ssz" => {
            let bytes = read(path)?;
            RawBeaconState::from_ssz_bytes(ssz_revision(path, revision)?, &bytes)?
        }
        "ssz_snappy" => {
            let bytes = Decoder::new()
                .decompress_vec(&read(path)?)
                .with_context(|| format!("Failed to decompress {}", path.display()))?;
            RawBeaconState::from_ssz_bytes(ssz_revision(path, revision)?, &bytes)?
        }
        // JSON is a subset of YAML
        "yaml" | "yml" | "json" => {
            let state: RawBeaconState = serde_yaml::from_slice(&read(path)?)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            if let Some(revision) = revision {
                ensure!(
                    state.revision() == revision,
                    "{} holds a {} state, expected {revision}",
                    path.display(),
                    state.revision()
                );
            }
            state
        }
        _ => bail!("Unsupported state file {}", path.display()),
    };

    debug!(
        path = %path.display(),
        revision = %state.revision(),
        slot = state.slot(),
        validators = state.validators().len(),
        "loaded state"
    );

    Ok(state)
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn ssz_revision(path: &Path, revision: Option<Revision>) -> anyhow::Result<Revision> {
    revision.ok_or_else(|| anyhow!("--revision is required to decode {}", path.display()))
}
