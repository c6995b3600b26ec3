//! Traffic item configuration and the traffic triggers.
//!
//! The appliance session holds a single traffic item, always addressed as
//! `trafficItem/1`. Creating a second item in the same session is not
//! supported.

use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::error::{IxError, Result};
use crate::session::{IxNetworkSession, session_path};
use crate::store::Href;

/// Path of the one traffic item this crate manages.
pub const TRAFFIC_ITEM: &str = "/api/v1/sessions/1/ixnetwork/traffic/trafficItem/1";

/// Path of the traffic root passed to apply/start/stop.
pub const TRAFFIC_ROOT: &str = "/api/v1/sessions/1/ixnetwork/traffic";

/// Frame rate and size of the generated stream.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameParameters {
    pub rate: f64,
    /// Unit of `rate`, e.g. `percentLineRate` or `framesPerSecond`.
    pub rate_type: String,
    /// Fixed frame size in bytes.
    pub fixed_size: u32,
}

impl Default for FrameParameters {
    fn default() -> Self {
        Self {
            rate: 100.0,
            rate_type: "percentLineRate".to_string(),
            fixed_size: 1500,
        }
    }
}

/// Settings for the traffic item.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficItemConfig {
    pub name: String,
    pub traffic_type: String,
    pub bi_directional: bool,
    pub route_mesh: String,
    pub frame: FrameParameters,
    /// Flow-group distribution keys.
    pub flow_groups: Vec<String>,
    /// Tracking keys.
    pub tracking: Vec<String>,
}

impl Default for TrafficItemConfig {
    fn default() -> Self {
        Self {
            name: "Test".to_string(),
            traffic_type: "ipv4".to_string(),
            bi_directional: true,
            route_mesh: "fullMesh".to_string(),
            frame: FrameParameters::default(),
            flow_groups: vec!["ipv4SourceIp0".to_string(), "ipv4DestIp0".to_string()],
            tracking: vec![
                "ethernetIiSourceaddress0".to_string(),
                "ethernetIiDestinationaddress0".to_string(),
            ],
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TrafficItemBody<'a> {
    bi_directional: bool,
    enabled: bool,
    name: &'a str,
    route_mesh: &'a str,
    traffic_type: &'a str,
}

fn item_path(suffix: &str) -> String {
    format!("{}{}", TRAFFIC_ITEM, suffix)
}

impl IxNetworkSession {
    /// Create and configure the session's traffic item.
    ///
    /// **Endpoint order matters:** `endpoints[0]` becomes the *destination*
    /// and `endpoints[1]` the *source*. Any further entries are ignored.
    pub async fn create_traffic_item(
        &self,
        endpoints: &[Href],
        config: &TrafficItemConfig,
    ) -> Result<()> {
        let [destination, source, ..] = endpoints else {
            return Err(IxError::InvalidEndpoints(endpoints.len()));
        };

        info!(
            name = %config.name,
            destination = %destination,
            source = %source,
            "Creating traffic item"
        );

        let item = TrafficItemBody {
            bi_directional: config.bi_directional,
            enabled: true,
            name: &config.name,
            route_mesh: &config.route_mesh,
            traffic_type: &config.traffic_type,
        };
        self.post(session_path("/traffic/trafficItem"), json!([item]))
            .await?;

        self.post(
            item_path("/endpointSet"),
            json!([{ "destinations": [destination], "sources": [source] }]),
        )
        .await?;

        self.patch(
            item_path("/configElement/1/frameRate"),
            json!({ "rate": config.frame.rate, "type": config.frame.rate_type }),
        )
        .await?;

        self.patch(
            item_path("/configElement/1/frameSize"),
            json!({ "fixedSize": config.frame.fixed_size }),
        )
        .await?;

        self.patch(
            item_path("/configElement/1/transmissionDistribution"),
            json!({ "distributions": config.flow_groups }),
        )
        .await?;

        self.patch(item_path("/tracking"), json!({ "trackBy": config.tracking }))
            .await?;

        Ok(())
    }

    /// Regenerate the traffic item from the current topology.
    pub async fn generate_traffic_item(&self) -> Result<()> {
        info!("Generating traffic item");
        self.post(
            session_path("/traffic/trafficItem/operations/generate"),
            json!({ "arg1": [TRAFFIC_ITEM] }),
        )
        .await?;
        Ok(())
    }

    /// Push the traffic configuration to the ports.
    pub async fn apply_traffic_item(&self) -> Result<()> {
        info!("Applying traffic");
        self.traffic_operation("apply").await
    }

    pub async fn start_all_traffic_items(&self) -> Result<()> {
        info!("Starting traffic");
        self.traffic_operation("start").await
    }

    pub async fn stop_all_traffic_items(&self) -> Result<()> {
        info!("Stopping traffic");
        self.traffic_operation("stop").await
    }

    async fn traffic_operation(&self, operation: &str) -> Result<()> {
        self.post(
            session_path(&format!("/traffic/operations/{}", operation)),
            json!({ "arg1": TRAFFIC_ROOT }),
        )
        .await?;
        Ok(())
    }
}
