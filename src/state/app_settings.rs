use cwc_engine::store::{HostedStore, LocalStore, Storage, StoreError, StoreResult};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Local,
    Hosted,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub backend: Backend,
    pub data_dir: PathBuf,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub predictions_open: bool,
    pub timeout: Duration,
}

impl AppSettings {
    pub fn load() -> StoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> StoreResult<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let supabase_url = var("CWC_POOL_SUPABASE_URL");
        let supabase_key = var("CWC_POOL_SUPABASE_KEY");
        let hosted_ready = supabase_url.is_some() && supabase_key.is_some();

        let backend = match var("CWC_POOL_STORE").as_deref() {
            None if hosted_ready => Backend::Hosted,
            None => Backend::Local,
            Some(v) if v.eq_ignore_ascii_case("local") => Backend::Local,
            Some(v) if v.eq_ignore_ascii_case("hosted") => Backend::Hosted,
            Some(other) => {
                return Err(StoreError::NotConfigured(format!(
                    "CWC_POOL_STORE must be local or hosted, got {other:?}"
                )));
            }
        };
        if backend == Backend::Hosted && !hosted_ready {
            return Err(StoreError::NotConfigured(
                "hosted store needs CWC_POOL_SUPABASE_URL and CWC_POOL_SUPABASE_KEY".into(),
            ));
        }

        let data_dir = var("CWC_POOL_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_data_dir(&var));

        let predictions_open = match var("CWC_POOL_PREDICTIONS_OPEN") {
            Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "false" | "0" | "no" | "off"),
            None => true,
        };

        let timeout_secs = var("CWC_POOL_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            backend,
            data_dir,
            supabase_url,
            supabase_key,
            predictions_open,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn storage(&self) -> StoreResult<Storage> {
        match self.backend {
            Backend::Local => Ok(Storage::Local(LocalStore::new(&self.data_dir))),
            Backend::Hosted => match (&self.supabase_url, &self.supabase_key) {
                (Some(url), Some(key)) => Ok(Storage::Hosted(HostedStore::new(url, key, self.timeout))),
                _ => Err(StoreError::NotConfigured("missing hosted store credentials".into())),
            },
        }
    }
}

fn default_data_dir(var: &impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(config_dir) = var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_dir).join("cwc-pool");
    }
    if let Some(home) = var("HOME") {
        return PathBuf::from(home).join(".config").join("cwc-pool");
    }
    PathBuf::from(".")
}
