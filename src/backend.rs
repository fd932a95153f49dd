use std::sync::{Arc, OnceLock};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend project id is empty")]
    MissingProjectId,
    #[error("backend API key is empty")]
    MissingApiKey,
    #[error("invalid {0} endpoint URL: {1}")]
    InvalidEndpoint(&'static str, String),
}

/// Identifying fields for the hosted backend. Opaque to the rest of the
/// app; only the bootstrap reads them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings {
    pub project_id: String,
    pub api_key: String,
    pub auth_endpoint: String,
    pub store_endpoint: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            project_id: "interview-practice".to_string(),
            api_key: "demo".to_string(),
            auth_endpoint: "https://identitytoolkit.googleapis.com/v1".to_string(),
            store_endpoint: "https://firestore.googleapis.com/v1".to_string(),
        }
    }
}

/// Authentication service handle. A pass-through to the hosted service;
/// nothing in this app calls it.
#[allow(dead_code)]
pub struct AuthHandle {
    http: Client,
    endpoint: Url,
    api_key: String,
}

#[allow(dead_code)]
impl AuthHandle {
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Data-store service handle. Same contract as [`AuthHandle`].
#[allow(dead_code)]
pub struct StoreHandle {
    http: Client,
    endpoint: Url,
    project_id: String,
}

#[allow(dead_code)]
impl StoreHandle {
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

pub struct BackendClient {
    project_id: String,
    auth: AuthHandle,
    store: StoreHandle,
}

static CLIENT: OnceLock<Arc<BackendClient>> = OnceLock::new();

impl BackendClient {
    /// Validate settings and build a client plus its two service handles.
    /// Both handles share one HTTP client.
    pub fn connect(settings: &BackendSettings) -> Result<Self, BackendError> {
        if settings.project_id.trim().is_empty() {
            return Err(BackendError::MissingProjectId);
        }
        if settings.api_key.trim().is_empty() {
            return Err(BackendError::MissingApiKey);
        }
        let auth_endpoint = Url::parse(&settings.auth_endpoint)
            .map_err(|e| BackendError::InvalidEndpoint("auth", e.to_string()))?;
        let store_endpoint = Url::parse(&settings.store_endpoint)
            .map_err(|e| BackendError::InvalidEndpoint("store", e.to_string()))?;

        let http = Client::new();
        Ok(Self {
            project_id: settings.project_id.clone(),
            auth: AuthHandle {
                http: http.clone(),
                endpoint: auth_endpoint,
                api_key: settings.api_key.clone(),
            },
            store: StoreHandle {
                http,
                endpoint: store_endpoint,
                project_id: settings.project_id.clone(),
            },
        })
    }

    /// Process-wide initializer. The first call validates and builds the
    /// client; every later call returns the same instance and ignores the
    /// settings it was given.
    pub fn initialize(settings: &BackendSettings) -> Result<Arc<Self>, BackendError> {
        if let Some(client) = CLIENT.get() {
            return Ok(Arc::clone(client));
        }
        let client = Arc::new(Self::connect(settings)?);
        info!(project = %client.project_id, "backend client initialized");
        Ok(Arc::clone(CLIENT.get_or_init(|| client)))
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    #[allow(dead_code)]
    pub fn auth(&self) -> &AuthHandle {
        &self.auth
    }

    #[allow(dead_code)]
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }
}
