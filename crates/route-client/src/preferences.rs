use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storage::KeyValueStore;

use crate::form::FormState;
use crate::types::ChainId;

/// The user's last-used selection. Amount and addresses are never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_chain: Option<ChainId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_chain: Option<ChainId>,
}

impl Preferences {
    pub fn from_form(form: &FormState) -> Self {
        Preferences {
            token_symbol: Some(form.token_symbol.clone()),
            from_chain: Some(form.from_chain.clone()),
            to_chain: Some(form.to_chain.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.token_symbol.is_none() && self.from_chain.is_none() && self.to_chain.is_none()
    }
}

#[derive(Debug, Error)]
pub enum PreferenceStoreError<S: KeyValueStore> {
    #[error("Preference storage error: {0}")]
    StoreError(S::Error),

    #[error("Preference serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct PreferenceStore<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> PreferenceStore<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        PreferenceStore { store, key: key.into() }
    }

    /// Never fails: missing, malformed or unreadable preferences all load as empty.
    pub async fn load(&self) -> Preferences {
        let stored = match self.store.get(&self.key).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                debug!("No preferences stored under {}", self.key);
                return Preferences::default();
            }
            Err(err) => {
                warn!("Could not read preferences: {}", err);
                return Preferences::default();
            }
        };

        serde_json::from_str(&stored).unwrap_or_else(|err| {
            warn!("Ignoring malformed preferences under {}: {}", self.key, err);
            Preferences::default()
        })
    }

    pub async fn save(&self, preferences: &Preferences) -> Result<(), PreferenceStoreError<S>> {
        let serialized = serde_json::to_string(preferences)?;
        self.store.set(&self.key, &serialized).await.map_err(PreferenceStoreError::StoreError)?;
        info!("Saved preferences under {}", self.key);
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), PreferenceStoreError<S>> {
        self.store.delete(&self.key).await.map_err(PreferenceStoreError::StoreError)?;
        info!("Cleared preferences under {}", self.key);
        Ok(())
    }
}

/// Overlays the stored fields onto `current`, leaving the rest untouched.
pub fn apply(current: FormState, preferences: &Preferences) -> FormState {
    FormState {
        token_symbol: preferences.token_symbol.clone().unwrap_or(current.token_symbol),
        from_chain: preferences.from_chain.clone().unwrap_or(current.from_chain),
        to_chain: preferences.to_chain.clone().unwrap_or(current.to_chain),
        ..current
    }
}
