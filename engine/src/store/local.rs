use super::{PredictionStore, ResultsStore, StoreError, StoreResult};
use crate::{Prediction, TournamentResults};
use log::{debug, info};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const PREDICTIONS_FILE: &str = "predictions.json";
const RESULTS_FILE: &str = "tournament_results.json";

/// JSON files in one directory: one array of predictions, one results object.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn predictions_path(&self) -> PathBuf {
        self.dir.join(PREDICTIONS_FILE)
    }

    fn results_path(&self) -> PathBuf {
        self.dir.join(RESULTS_FILE)
    }

    async fn write_predictions(&self, predictions: &[Prediction]) -> StoreResult<()> {
        write_json(&self.predictions_path(), &predictions).await
    }
}

impl ResultsStore for LocalStore {
    async fn get_results(&self) -> StoreResult<Option<TournamentResults>> {
        read_json(&self.results_path()).await
    }

    async fn save_results(&self, results: &TournamentResults) -> StoreResult<()> {
        write_json(&self.results_path(), results).await
    }
}

impl PredictionStore for LocalStore {
    async fn get_predictions(&self) -> StoreResult<Vec<Prediction>> {
        Ok(read_json(&self.predictions_path()).await?.unwrap_or_default())
    }

    async fn save_prediction(&self, prediction: &Prediction) -> StoreResult<()> {
        let mut predictions = self.get_predictions().await?;
        match predictions.iter_mut().find(|p| p.id == prediction.id) {
            Some(existing) => {
                info!("updating prediction {} ({})", prediction.id, prediction.player_name);
                *existing = prediction.clone();
            }
            None => {
                info!("adding prediction {} ({})", prediction.id, prediction.player_name);
                predictions.push(prediction.clone());
            }
        }
        self.write_predictions(&predictions).await
    }

    async fn delete_prediction(&self, id: &str) -> StoreResult<()> {
        let mut predictions = self.get_predictions().await?;
        predictions.retain(|p| p.id != id);
        self.write_predictions(&predictions).await
    }

    async fn delete_all_predictions(&self) -> StoreResult<()> {
        self.write_predictions(&[]).await
    }
}

/// A missing file reads as `None`.
async fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} does not exist yet", path.display());
            return Ok(None);
        }
        Err(e) => return Err(StoreError::Io(e, path.to_owned())),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StoreError::Parsing(e, path.display().to_string()))
}

/// Write to a sibling temp file, then rename over the target.
async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
    let data = serde_json::to_vec_pretty(value)
        .map_err(|e| StoreError::Parsing(e, path.display().to_string()))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::Io(e, parent.to_owned()))?;
    }

    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, &data)
        .await
        .map_err(|e| StoreError::Io(e, temp_path.clone()))?;
    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| StoreError::Io(e, path.to_owned()))?;

    debug!("wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}
