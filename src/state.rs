use crate::auth;
use crate::config::ServerConfig;
use crate::google::GoogleServices;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Produces an authenticated client bundle for one tool invocation.
///
/// The production connector re-resolves credentials on every call;
/// tests swap in a connector returning scripted clients.
#[async_trait]
pub trait ServiceConnector: Send + Sync {
    async fn connect(&self) -> Result<GoogleServices>;
}

pub struct ServiceAccountConnector {
    config: Arc<ServerConfig>,
}

impl ServiceAccountConnector {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ServiceConnector for ServiceAccountConnector {
    async fn connect(&self) -> Result<GoogleServices> {
        let key = auth::resolve_service_account(&self.config.credentials)?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;
        let token = auth::fetch_access_token(&http, &key).await?;
        GoogleServices::connect(token, self.config.default_folder_id.clone())
    }
}

pub struct AppState {
    config: Arc<ServerConfig>,
    connector: Arc<dyn ServiceConnector>,
}

impl AppState {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        let connector = Arc::new(ServiceAccountConnector::new(config.clone()));
        Self { config, connector }
    }

    pub fn with_connector(config: Arc<ServerConfig>, connector: Arc<dyn ServiceConnector>) -> Self {
        Self { config, connector }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Fresh authenticated clients for this invocation.
    pub async fn services(&self) -> Result<GoogleServices> {
        self.connector.connect().await
    }
}
