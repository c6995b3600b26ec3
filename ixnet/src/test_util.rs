//! In-memory appliance used by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::Result;
use crate::transport::{Method, RequestObserver, RestRequest, RestResponse, RestTransport};

type Handler = Box<dyn Fn(&RestRequest) -> RestResponse + Send + Sync>;

/// Transport that records every request and answers through a handler.
pub struct MockTransport {
    handler: Handler,
    requests: Mutex<Vec<RestRequest>>,
}

impl MockTransport {
    pub fn new(handler: impl Fn(&RestRequest) -> RestResponse + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A mock that behaves like a cooperative appliance:
    /// creates return numbered hrefs, IPv4 stacks expose their field hrefs,
    /// and the statistics queries return a two-row flow view.
    pub fn appliance() -> Self {
        let counters: Mutex<HashMap<String, usize>> = Mutex::new(HashMap::new());
        Self::new(move |request| match request.method {
            Method::Get => appliance_get(request),
            Method::Patch => Self::reply(200, json!({})),
            Method::Post => {
                if request.path.ends_with("/operations/select") {
                    appliance_select(request)
                } else if request.path.contains("/operations/")
                    || request.path.ends_with("/singleValue")
                {
                    Self::reply(200, json!({"state": "SUCCESS"}))
                } else {
                    let items = match &request.body {
                        Some(Value::Array(items)) => items.len().max(1),
                        _ => 1,
                    };
                    let mut counters = counters.lock().unwrap();
                    let counter = counters.entry(request.path.clone()).or_insert(0);
                    let links: Vec<Value> = (0..items)
                        .map(|_| {
                            *counter += 1;
                            json!({"href": format!("{}/{}", request.path, counter)})
                        })
                        .collect();
                    Self::reply(201, json!({"links": links}))
                }
            }
        })
    }

    pub fn reply(status: u16, body: Value) -> RestResponse {
        RestResponse {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string().into_bytes(),
        }
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<RestRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose path ends with `suffix`.
    pub fn requests_to(&self, suffix: &str) -> Vec<RestRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.ends_with(suffix))
            .collect()
    }

    pub fn clear(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl RestTransport for MockTransport {
    async fn send(&self, request: &RestRequest) -> Result<RestResponse> {
        self.requests.lock().unwrap().push(request.clone());
        Ok((self.handler)(request))
    }
}

fn appliance_get(request: &RestRequest) -> RestResponse {
    if request.path.contains("/files?filename=") {
        return RestResponse {
            status: 200,
            headers: vec![(
                "content-type".to_string(),
                "application/octet-stream".to_string(),
            )],
            body: vec![0x1f, 0x8b, 0x08, 0x00, 0xff],
        };
    }
    if request.path.contains("/ipv4/") {
        return MockTransport::reply(
            200,
            json!({
                "href": request.path,
                "address": format!("{}/address", request.path),
                "prefix": format!("{}/prefix", request.path),
                "gatewayIp": format!("{}/gatewayIp", request.path),
            }),
        );
    }
    MockTransport::reply(200, json!({"href": request.path}))
}

fn appliance_select(request: &RestRequest) -> RestResponse {
    let from = request
        .body
        .as_ref()
        .and_then(|b| b["selects"][0]["from"].as_str())
        .unwrap_or_default();
    if from == "/statistics" {
        MockTransport::reply(200, flow_view_list())
    } else {
        MockTransport::reply(200, flow_view_data())
    }
}

pub fn flow_view_list() -> Value {
    json!({
        "result": [{
            "href": "/api/v1/sessions/1/ixnetwork/statistics",
            "view": [
                {"id": 1, "csvFileName": "Port Statistics.csv"},
                {"id": 7, "csvFileName": "Flow Statistics.csv"},
            ]
        }]
    })
}

pub fn flow_view_data() -> Value {
    json!({
        "result": [{
            "href": "/api/v1/sessions/1/ixnetwork/statistics/view/7/data",
            "columnCaptions": ["Tx Frames", "Rx Frames"],
            "pageValues": [[[100, 98]], [[100, 95]]]
        }]
    })
}

/// Observer remembering `(method, path, status)` of each call.
#[derive(Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<(Method, String, u16)>>,
}

impl RecordingObserver {
    pub fn seen(&self) -> Vec<(Method, String, u16)> {
        self.seen.lock().unwrap().clone()
    }
}

impl RequestObserver for RecordingObserver {
    fn observe(&self, request: &RestRequest, response: &RestResponse) {
        self.seen
            .lock()
            .unwrap()
            .push((request.method, request.path.clone(), response.status));
    }
}
