//! Topology chain: ports, topologies, device groups, Ethernet and IPv4 stacks.
//!
//! Every step reads the href list of its predecessor kind (or an explicit
//! override), issues one create call per input href, and replaces the list of
//! its own kind with the hrefs that came back, in input order. A step whose
//! input is empty sends nothing and stores an empty list.
//!
//! Required order: `assign_ports` → `create_topology` → `create_device_groups`
//! → `create_ethernet` → `create_ipv4` → `set_ipv4_addressing`.

use std::fmt;
use std::str::FromStr;

use ipnet::Ipv4Net;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{IxError, Result};
use crate::session::{IxNetworkSession, session_path};
use crate::store::{Href, ResourceKind, extract_hrefs};

/// One physical port to bind to a virtual port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    /// Logical name, e.g. `port1/1`.
    pub name: String,
    pub card: u16,
    pub port: u16,
    /// Name given to the virtual port on the appliance.
    pub link_id: String,
}

impl PortSpec {
    pub fn new(name: impl Into<String>, card: u16, port: u16, link_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            card,
            port,
            link_id: link_id.into(),
        }
    }
}

/// Parses `name=card/port:linkId`, e.g. `port1/1=1/1:left_side`.
impl FromStr for PortSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (name, rest) = s
            .split_once('=')
            .ok_or("Expected format: name=card/port:linkId".to_string())?;
        let (location, link_id) = rest
            .split_once(':')
            .ok_or("Expected format: name=card/port:linkId".to_string())?;
        let (card, port) = location
            .split_once('/')
            .ok_or("Expected format: name=card/port:linkId".to_string())?;
        let card = card.parse().map_err(|_| format!("Invalid card: {}", card))?;
        let port = port.parse().map_err(|_| format!("Invalid port: {}", port))?;
        Ok(PortSpec::new(name, card, port, link_id))
    }
}

/// An IPv4 interface address and its gateway.
///
/// The gateway's prefix length is what gets written as the stack prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressPair {
    pub address: Ipv4Net,
    pub gateway: Ipv4Net,
}

impl AddressPair {
    pub fn new(address: Ipv4Net, gateway: Ipv4Net) -> Self {
        Self { address, gateway }
    }
}

impl fmt::Display for AddressPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.address, self.gateway)
    }
}

/// Parses `ADDR/LEN@GW/LEN`, e.g. `10.100.0.20/24@10.100.0.10/24`.
impl FromStr for AddressPair {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (address, gateway) = s
            .split_once('@')
            .ok_or("Expected format: ADDR/LEN@GW/LEN".to_string())?;
        let address = address
            .parse()
            .map_err(|e| format!("Invalid address {}: {}", address, e))?;
        let gateway = gateway
            .parse()
            .map_err(|e| format!("Invalid gateway {}: {}", gateway, e))?;
        Ok(AddressPair::new(address, gateway))
    }
}

/// Field hrefs of one IPv4 stack.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ipv4Fields {
    address: Href,
    prefix: Href,
    gateway_ip: Href,
}

/// Last path segment of an href, e.g. `1` for `.../topology/1`.
fn last_segment(href: &str) -> &str {
    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(href)
}

impl IxNetworkSession {
    /// Resolve a step's input: the override if given, else the predecessor's hrefs.
    fn step_input(&self, kind: ResourceKind, overrides: Option<Vec<Href>>) -> Vec<Href> {
        match overrides {
            Some(hrefs) => hrefs,
            None => kind
                .predecessor()
                .map(|p| self.store.get(p).to_vec())
                .unwrap_or_default(),
        }
    }

    /// Issue one create per input href and store one href per reply under `kind`.
    async fn fan_out<F>(
        &mut self,
        kind: ResourceKind,
        inputs: Vec<Href>,
        mut request_for: F,
    ) -> Result<&[Href]>
    where
        F: FnMut(&str) -> (String, Value),
    {
        let mut replies = Vec::with_capacity(inputs.len());
        for input in &inputs {
            let (path, body) = request_for(input.as_str());
            debug!(kind = %kind, parent = %input, path = %path, "Creating resource");
            replies.push(self.post(path, body).await?.text());
        }
        self.store.set(kind, &replies)?;

        info!(kind = %kind, count = self.store.get(kind).len(), "Stored hrefs");
        Ok(self.store.get(kind))
    }

    /// Register the chassis and bind all `ports` in one batched request.
    ///
    /// Every link of the batched reply becomes one vport href.
    pub async fn assign_ports(&mut self, chassis: &str, ports: &[PortSpec]) -> Result<&[Href]> {
        info!(chassis = %chassis, ports = ports.len(), "Assigning ports");

        let reply = self
            .post(
                session_path("/availableHardware/chassis"),
                json!({ "hostname": chassis }),
            )
            .await?;
        let chassis_href = extract_hrefs(&[reply.text()])?
            .into_iter()
            .next()
            .ok_or_else(|| IxError::MalformedResponse("chassis reply has no href".to_string()))?;

        let vports: Vec<Value> = ports
            .iter()
            .map(|spec| {
                json!({
                    "connectedTo": format!(
                        "{}/card/{}/port/{}",
                        chassis_href.trim_end_matches('/'),
                        spec.card,
                        spec.port
                    ),
                    "name": spec.link_id,
                })
            })
            .collect();

        let reply = self.post(session_path("/vport"), Value::Array(vports)).await?;
        self.store.set(ResourceKind::Vports, &[reply.text()])?;

        info!(count = self.store.vports().len(), "Ports assigned");
        Ok(self.store.vports())
    }

    /// Create one topology per vport.
    pub async fn create_topology(&mut self, vports: Option<Vec<Href>>) -> Result<&[Href]> {
        let inputs = self.step_input(ResourceKind::Topologies, vports);
        self.fan_out(ResourceKind::Topologies, inputs, |vport| {
            (session_path("/topology"), json!([{ "ports": [vport] }]))
        })
        .await
    }

    /// Create one device group per topology, each with `multiplier` devices.
    pub async fn create_device_groups(
        &mut self,
        topologies: Option<Vec<Href>>,
        multiplier: u32,
    ) -> Result<&[Href]> {
        let inputs = self.step_input(ResourceKind::DeviceGroups, topologies);
        self.fan_out(ResourceKind::DeviceGroups, inputs, |topology| {
            (
                format!("{}/deviceGroup", topology),
                json!([{ "multiplier": multiplier, "name": last_segment(topology) }]),
            )
        })
        .await
    }

    /// Create one Ethernet stack per device group.
    pub async fn create_ethernet(&mut self, device_groups: Option<Vec<Href>>) -> Result<&[Href]> {
        let inputs = self.step_input(ResourceKind::Ethernets, device_groups);
        self.fan_out(ResourceKind::Ethernets, inputs, |device_group| {
            (format!("{}/ethernet", device_group), json!([{}]))
        })
        .await
    }

    /// Create one IPv4 stack per Ethernet stack.
    pub async fn create_ipv4(&mut self, ethernets: Option<Vec<Href>>) -> Result<&[Href]> {
        let inputs = self.step_input(ResourceKind::Ipv4, ethernets);
        self.fan_out(ResourceKind::Ipv4, inputs, |ethernet| {
            (format!("{}/ipv4", ethernet), json!([{}]))
        })
        .await
    }

    /// Write address, prefix and gateway of `ipv4[i]` from `pairs[i]`.
    ///
    /// The prefix written is the gateway's prefix length, not the address's.
    pub async fn set_ipv4_addressing(&self, pairs: &[AddressPair]) -> Result<()> {
        let stacks = self.store.ipv4();
        if pairs.len() > stacks.len() {
            return Err(IxError::DependencyNotReady {
                kind: ResourceKind::Ipv4,
                needed: pairs.len(),
                available: stacks.len(),
            });
        }

        for (pair, stack) in pairs.iter().zip(stacks) {
            let fields: Ipv4Fields = self.get(stack.as_str()).await?.json()?;

            self.post(
                format!("{}/singleValue", fields.address),
                json!([{ "value": pair.address.addr().to_string() }]),
            )
            .await?;
            self.patch(
                format!("{}/singleValue", fields.prefix),
                json!({ "value": pair.gateway.prefix_len().to_string() }),
            )
            .await?;
            self.post(
                format!("{}/singleValue", fields.gateway_ip),
                json!([{ "value": pair.gateway.addr().to_string() }]),
            )
            .await?;

            info!(stack = %stack, addressing = %pair, "IPv4 addressing set");
        }
        Ok(())
    }
}
