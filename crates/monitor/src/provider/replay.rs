//! Location provider that replays recorded positions from a JSON file.
//!
//! The file maps wristband ids to a list of steps. Each poll consumes the next
//! step; a step is either a sample or a scripted failure:
//!
//! ```json
//! {
//!   "w1": [
//!     {"latitude": -23.5505, "longitude": -46.6333, "timestamp": "2024-05-01T10:00:00Z"},
//!     {"error": "permission_denied"}
//!   ]
//! }
//! ```
//!
//! Once a wristband's list is exhausted every poll is `Unavailable`.

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use domain::models::PositionSample;

use super::{LocationError, LocationProvider};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read replay file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid replay data: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ScriptedFailure {
    PermissionDenied,
    Unavailable,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ReplayStep {
    Sample(PositionSample),
    Failure { error: ScriptedFailure },
}

/// Replays scripted positions per wristband.
#[derive(Debug, Default)]
pub struct ReplayLocationProvider {
    steps: Mutex<HashMap<String, VecDeque<ReplayStep>>>,
}

impl ReplayLocationProvider {
    /// A provider with nothing to replay; every poll is `Unavailable`.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ReplayError> {
        let steps: HashMap<String, VecDeque<ReplayStep>> = serde_json::from_str(json)?;
        Ok(Self {
            steps: Mutex::new(steps),
        })
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ReplayError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let provider = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            wristbands = provider.steps.lock().await.len(),
            "Loaded replay file"
        );
        Ok(provider)
    }

    /// Steps left for `wristband_id`.
    pub async fn remaining(&self, wristband_id: &str) -> usize {
        self.steps
            .lock()
            .await
            .get(wristband_id)
            .map_or(0, VecDeque::len)
    }
}

#[async_trait]
impl LocationProvider for ReplayLocationProvider {
    async fn current_position(&self, wristband_id: &str) -> Result<PositionSample, LocationError> {
        let step = self
            .steps
            .lock()
            .await
            .get_mut(wristband_id)
            .and_then(VecDeque::pop_front);

        match step {
            Some(ReplayStep::Sample(sample)) => Ok(sample),
            Some(ReplayStep::Failure {
                error: ScriptedFailure::PermissionDenied,
            }) => Err(LocationError::PermissionDenied),
            Some(ReplayStep::Failure {
                error: ScriptedFailure::Unavailable,
            }) => Err(LocationError::Unavailable("scripted failure".to_string())),
            None => {
                debug!(wristband_id = %wristband_id, "Replay exhausted");
                Err(LocationError::Unavailable(format!(
                    "no recorded positions left for wristband '{}'",
                    wristband_id
                )))
            }
        }
    }
}
