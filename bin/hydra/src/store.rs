use log::{info, warn};

use config::{PreferencesConfig, StorageBackend};
use route_client::{FormState, PreferenceStore, Preferences};
use storage::{FileStore, RedisClient};

use crate::CliError;

/// The configured preference backend.
#[derive(Debug)]
pub enum PreferenceBackend {
    File(PreferenceStore<FileStore>),
    Redis(PreferenceStore<RedisClient>),
}

impl PreferenceBackend {
    pub async fn build(config: &PreferencesConfig) -> Result<Self, CliError> {
        info!("Using {} preference storage", config.backend);

        match (config.backend, &config.file_path, &config.redis_url) {
            (StorageBackend::File, Some(file_path), _) => {
                let store = FileStore::new(file_path);
                Ok(PreferenceBackend::File(PreferenceStore::new(store, &config.key)))
            }
            (StorageBackend::Redis, _, Some(redis_url)) => {
                let client = RedisClient::build(redis_url).await?;
                Ok(PreferenceBackend::Redis(PreferenceStore::new(client, &config.key)))
            }
            (backend, _, _) => Err(CliError::Preferences(format!(
                "{} backend is not configured",
                backend
            ))),
        }
    }

    pub async fn load(&self) -> Preferences {
        match self {
            PreferenceBackend::File(store) => store.load().await,
            PreferenceBackend::Redis(store) => store.load().await,
        }
    }

    pub async fn save(&self, preferences: &Preferences) -> Result<(), CliError> {
        match self {
            PreferenceBackend::File(store) => {
                store.save(preferences).await.map_err(preferences_error)
            }
            PreferenceBackend::Redis(store) => {
                store.save(preferences).await.map_err(preferences_error)
            }
        }
    }

    pub async fn clear(&self) -> Result<(), CliError> {
        match self {
            PreferenceBackend::File(store) => store.clear().await.map_err(preferences_error),
            PreferenceBackend::Redis(store) => store.clear().await.map_err(preferences_error),
        }
    }

    /// The default form with any stored selection applied.
    pub async fn restore_form(&self) -> FormState {
        route_client::preferences::apply(FormState::default(), &self.load().await)
    }
}

/// Like [`PreferenceBackend::restore_form`], falling back to the defaults when the configured
/// backend cannot be reached.
pub async fn restore_form_or_default(config: &PreferencesConfig) -> FormState {
    match PreferenceBackend::build(config).await {
        Ok(preferences) => preferences.restore_form().await,
        Err(err) => {
            warn!("Preferences unavailable, using defaults: {}", err);
            FormState::default()
        }
    }
}

fn preferences_error(err: impl std::error::Error) -> CliError {
    CliError::Preferences(err.to_string())
}
