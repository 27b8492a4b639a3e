pub mod hosted;
pub mod local;
pub mod rows;

pub use hosted::HostedStore;
pub use local::LocalStore;

use crate::{Prediction, TournamentResults};
use std::fmt;
use std::path::PathBuf;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error, PathBuf),
    Parsing(serde_json::Error, String),
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    NotConfigured(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e, path) => write!(f, "I/O error for {}: {e}", path.display()),
            StoreError::Parsing(e, source) => write!(f, "Parse error for {source}: {e}"),
            StoreError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            StoreError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            StoreError::NotConfigured(msg) => write!(f, "Store not configured: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// The single official results record.
#[allow(async_fn_in_trait)]
pub trait ResultsStore {
    /// `None` when nothing has been recorded yet.
    async fn get_results(&self) -> StoreResult<Option<TournamentResults>>;
    async fn save_results(&self, results: &TournamentResults) -> StoreResult<()>;
}

/// Participant predictions keyed by id.
#[allow(async_fn_in_trait)]
pub trait PredictionStore {
    async fn get_predictions(&self) -> StoreResult<Vec<Prediction>>;
    /// Replace the prediction with the same id, or add it.
    async fn save_prediction(&self, prediction: &Prediction) -> StoreResult<()>;
    async fn delete_prediction(&self, id: &str) -> StoreResult<()>;
    async fn delete_all_predictions(&self) -> StoreResult<()>;
}

/// Backend chosen at startup.
#[derive(Debug, Clone)]
pub enum Storage {
    Local(LocalStore),
    Hosted(HostedStore),
}

impl Storage {
    pub fn backend_name(&self) -> &'static str {
        match self {
            Storage::Local(_) => "local",
            Storage::Hosted(_) => "hosted",
        }
    }
}

impl ResultsStore for Storage {
    async fn get_results(&self) -> StoreResult<Option<TournamentResults>> {
        match self {
            Storage::Local(s) => s.get_results().await,
            Storage::Hosted(s) => s.get_results().await,
        }
    }

    async fn save_results(&self, results: &TournamentResults) -> StoreResult<()> {
        match self {
            Storage::Local(s) => s.save_results(results).await,
            Storage::Hosted(s) => s.save_results(results).await,
        }
    }
}

impl PredictionStore for Storage {
    async fn get_predictions(&self) -> StoreResult<Vec<Prediction>> {
        match self {
            Storage::Local(s) => s.get_predictions().await,
            Storage::Hosted(s) => s.get_predictions().await,
        }
    }

    async fn save_prediction(&self, prediction: &Prediction) -> StoreResult<()> {
        match self {
            Storage::Local(s) => s.save_prediction(prediction).await,
            Storage::Hosted(s) => s.save_prediction(prediction).await,
        }
    }

    async fn delete_prediction(&self, id: &str) -> StoreResult<()> {
        match self {
            Storage::Local(s) => s.delete_prediction(id).await,
            Storage::Hosted(s) => s.delete_prediction(id).await,
        }
    }

    async fn delete_all_predictions(&self) -> StoreResult<()> {
        match self {
            Storage::Local(s) => s.delete_all_predictions().await,
            Storage::Hosted(s) => s.delete_all_predictions().await,
        }
    }
}
