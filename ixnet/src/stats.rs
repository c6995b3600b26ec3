//! Flow statistics gathering and the one-shot traffic run.

use std::collections::BTreeMap;
use std::future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::{IxError, Result};
use crate::session::{IxNetworkSession, session_path};

/// Export filename identifying the flow statistics view.
pub const FLOW_STATISTICS_VIEW: &str = "Flow Statistics.csv";

const REPORT_WIDTH: usize = 130;

/// Per-direction flow counters, keyed by column caption.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowStatistics {
    pub straight_direction: BTreeMap<String, Value>,
    pub backward_direction: BTreeMap<String, Value>,
    /// Side-by-side text rendering, captions in server order.
    #[serde(skip)]
    pub report: String,
}

impl FlowStatistics {
    /// Build from column captions and one value row per direction.
    pub fn from_rows(captions: &[String], straight: &[Value], backward: &[Value]) -> Result<Self> {
        for (direction, row) in [("straight", straight), ("backward", backward)] {
            if row.len() < captions.len() {
                return Err(IxError::MalformedStatistics(format!(
                    "{} row has {} values for {} captions",
                    direction,
                    row.len(),
                    captions.len()
                )));
            }
        }

        let title = "FLOW STATISTICS";
        let mut report = format!("{:^width$}", title, width = REPORT_WIDTH);
        report.push_str(&format!(
            "\n\n{:<65} {:<65}\n",
            "Straight direction", "Backward direction"
        ));

        let mut straight_direction = BTreeMap::new();
        let mut backward_direction = BTreeMap::new();
        for (index, caption) in captions.iter().enumerate() {
            let (forward, back) = (&straight[index], &backward[index]);
            report.push_str(&format!(
                "\n{:<40} {:<25} {:<40} {:<25}",
                caption,
                display_value(forward),
                caption,
                display_value(back)
            ));
            straight_direction.insert(caption.clone(), forward.clone());
            backward_direction.insert(caption.clone(), back.clone());
        }

        Ok(Self {
            straight_direction,
            backward_direction,
            report,
        })
    }
}

/// Strings render without their JSON quotes.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Deserialize)]
struct SelectReply<T> {
    result: Vec<T>,
}

#[derive(Deserialize)]
struct ViewList {
    #[serde(default)]
    view: Vec<ViewEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewEntry {
    id: Value,
    #[serde(default)]
    csv_file_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewData {
    column_captions: Vec<String>,
    page_values: Vec<Vec<Vec<Value>>>,
}

fn select_body(from: &str, properties: &[&str], child: Option<&str>) -> Value {
    let children: Vec<Value> = child
        .map(|c| json!({ "child": c, "properties": ["*"], "filters": [] }))
        .into_iter()
        .collect();
    json!({
        "selects": [{
            "from": from,
            "properties": properties,
            "children": children,
            "inlines": []
        }]
    })
}

fn first_result<T>(reply: SelectReply<T>, what: &str) -> Result<T> {
    reply
        .result
        .into_iter()
        .next()
        .ok_or_else(|| IxError::MalformedStatistics(format!("empty {} result", what)))
}

/// First row of the page at `index`.
fn direction_row<'a>(pages: &'a [Vec<Vec<Value>>], index: usize, name: &str) -> Result<&'a [Value]> {
    pages
        .get(index)
        .and_then(|page| page.first())
        .map(Vec::as_slice)
        .ok_or_else(|| IxError::MalformedStatistics(format!("missing {} direction row", name)))
}

impl IxNetworkSession {
    /// Locate the flow statistics view and read both direction rows.
    pub async fn gather_flow_statistics(&self) -> Result<FlowStatistics> {
        let select = session_path("/operations/select");

        let views: SelectReply<ViewList> = self
            .post(select.as_str(), select_body("/statistics", &[], Some("view")))
            .await?
            .json()
            .map_err(|e| IxError::MalformedStatistics(e.to_string()))?;
        let view_id = first_result(views, "view list")?
            .view
            .into_iter()
            .find(|view| view.csv_file_name.as_deref() == Some(FLOW_STATISTICS_VIEW))
            .map(|view| display_value(&view.id))
            .ok_or_else(|| IxError::StatisticsViewNotFound(FLOW_STATISTICS_VIEW.to_string()))?;

        info!(view_id = %view_id, "Reading flow statistics");

        let data: SelectReply<ViewData> = self
            .post(
                select.as_str(),
                select_body(
                    &format!("/statistics/view/{}/data", view_id),
                    &["pageValues", "columnCaptions"],
                    None,
                ),
            )
            .await?
            .json()
            .map_err(|e| IxError::MalformedStatistics(e.to_string()))?;
        let data = first_result(data, "view data")?;

        let straight = direction_row(&data.page_values, 0, "straight")?;
        let backward = direction_row(&data.page_values, 1, "backward")?;
        FlowStatistics::from_rows(&data.column_captions, straight, backward)
    }

    /// Generate, apply and start traffic, wait `duration`, collect flow
    /// statistics, then stop traffic.
    pub async fn run_traffic_macro(&self, duration: Duration) -> Result<FlowStatistics> {
        self.run_traffic_macro_until(duration, future::pending()).await
    }

    /// Like [`IxNetworkSession::run_traffic_macro`], aborting the wait as
    /// soon as `cancel` resolves.
    ///
    /// On cancellation nothing further is sent: traffic is left running and
    /// statistics are not read. The caller has to stop traffic itself.
    pub async fn run_traffic_macro_until<C>(
        &self,
        duration: Duration,
        cancel: C,
    ) -> Result<FlowStatistics>
    where
        C: Future<Output = ()>,
    {
        self.generate_traffic_item().await?;
        self.apply_traffic_item().await?;
        self.start_all_traffic_items().await?;

        info!(duration_secs = duration.as_secs(), "Traffic running");
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = cancel => {
                warn!("Traffic run cancelled, traffic left running");
                return Err(IxError::Cancelled);
            }
        }

        let statistics = self.gather_flow_statistics().await?;
        self.stop_all_traffic_items().await?;
        Ok(statistics)
    }
}
