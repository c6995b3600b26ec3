//! Session-wide service operations: config reset, save/download, protocols.

use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::info;

use crate::error::Result;
use crate::session::{IxNetworkSession, session_path};

/// Name of the saved configuration, both on the appliance and locally.
pub const CONFIG_FILE_NAME: &str = "ixia_config.ixncfg";

impl IxNetworkSession {
    /// Discard the appliance configuration and start from an empty one.
    pub async fn new_config(&self) -> Result<()> {
        info!("Resetting appliance configuration");
        self.post(session_path("/operations/newconfig"), json!({}))
            .await?;
        Ok(())
    }

    /// Save the configuration on the appliance and download it into `dir`.
    ///
    /// The file is written byte for byte as received. Returns its path.
    pub async fn save_and_download_config(&self, dir: &Path) -> Result<PathBuf> {
        self.post(
            session_path("/operations/saveconfig"),
            json!({ "arg1": CONFIG_FILE_NAME }),
        )
        .await?;

        let reply = self
            .get(session_path(&format!("/files?filename={}", CONFIG_FILE_NAME)))
            .await?;

        let path = dir.join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, &reply.body).await?;

        info!(path = %path.display(), bytes = reply.body.len(), "Configuration downloaded");
        Ok(path)
    }

    /// Start every protocol of every topology.
    pub async fn start_all_protocols(&self) -> Result<()> {
        info!("Starting all protocols");
        self.post(session_path("/operations/startallprotocols"), json!([{}]))
            .await?;
        Ok(())
    }

    pub async fn stop_all_protocols(&self) -> Result<()> {
        info!("Stopping all protocols");
        self.post(session_path("/operations/stopallprotocols"), json!([{}]))
            .await?;
        Ok(())
    }
}
