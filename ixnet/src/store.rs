//! Href registry for the resources created during one session.
//!
//! The appliance answers every create call with a body such as
//! `{"links": [{"href": "/api/v1/sessions/1/ixnetwork/topology/1"}]}`.
//! The store flattens those replies into ordered href lists, one list per
//! resource kind. Position matters: the i-th IPv4 stack belongs to the i-th
//! Ethernet stack, and so on down the chain.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{IxError, Result};

/// Opaque server-absolute path naming one remote resource.
pub type Href = String;

/// The fixed set of resource kinds the store tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Vports,
    Topologies,
    DeviceGroups,
    Ethernets,
    Ipv4,
}

impl ResourceKind {
    /// All kinds, in chain order.
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Vports,
        ResourceKind::Topologies,
        ResourceKind::DeviceGroups,
        ResourceKind::Ethernets,
        ResourceKind::Ipv4,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Vports => "vports",
            ResourceKind::Topologies => "topologies",
            ResourceKind::DeviceGroups => "deviceGroups",
            ResourceKind::Ethernets => "ethernets",
            ResourceKind::Ipv4 => "ipv4",
        }
    }

    /// The kind whose hrefs feed the step producing `self`.
    pub fn predecessor(&self) -> Option<ResourceKind> {
        match self {
            ResourceKind::Vports => None,
            ResourceKind::Topologies => Some(ResourceKind::Vports),
            ResourceKind::DeviceGroups => Some(ResourceKind::Topologies),
            ResourceKind::Ethernets => Some(ResourceKind::DeviceGroups),
            ResourceKind::Ipv4 => Some(ResourceKind::Ethernets),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = IxError;

    fn from_str(s: &str) -> Result<Self> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| IxError::InvalidKind(s.to_string()))
    }
}

#[derive(Deserialize)]
struct CreateReply {
    links: Vec<Link>,
}

#[derive(Deserialize)]
struct Link {
    href: String,
}

/// Pull every `links[].href` out of a sequence of raw create replies.
///
/// Each reply must be JSON with a non-empty `links` array. Hrefs come out
/// in reply order, then link order within a reply.
pub fn extract_hrefs<S: AsRef<str>>(responses: &[S]) -> Result<Vec<Href>> {
    let mut hrefs = Vec::with_capacity(responses.len());
    for (index, raw) in responses.iter().enumerate() {
        let raw = raw.as_ref();
        let reply: CreateReply = serde_json::from_str(raw).map_err(|e| {
            IxError::MalformedResponse(format!("reply {}: {} ({})", index, e, raw))
        })?;
        if reply.links.is_empty() {
            return Err(IxError::MalformedResponse(format!(
                "reply {}: empty links ({})",
                index, raw
            )));
        }
        hrefs.extend(reply.links.into_iter().map(|link| link.href));
    }
    Ok(hrefs)
}

/// Ordered href lists for every resource kind of one session.
///
/// A list is only ever replaced as a whole. A failed `set` leaves the
/// previous list untouched.
#[derive(Debug, Clone, Default)]
pub struct ResourceStore {
    vports: Vec<Href>,
    topologies: Vec<Href>,
    device_groups: Vec<Href>,
    ethernets: Vec<Href>,
    ipv4: Vec<Href>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: ResourceKind) -> &Vec<Href> {
        match kind {
            ResourceKind::Vports => &self.vports,
            ResourceKind::Topologies => &self.topologies,
            ResourceKind::DeviceGroups => &self.device_groups,
            ResourceKind::Ethernets => &self.ethernets,
            ResourceKind::Ipv4 => &self.ipv4,
        }
    }

    fn slot_mut(&mut self, kind: ResourceKind) -> &mut Vec<Href> {
        match kind {
            ResourceKind::Vports => &mut self.vports,
            ResourceKind::Topologies => &mut self.topologies,
            ResourceKind::DeviceGroups => &mut self.device_groups,
            ResourceKind::Ethernets => &mut self.ethernets,
            ResourceKind::Ipv4 => &mut self.ipv4,
        }
    }

    /// Replace the list for `kind` with the hrefs found in `responses`.
    pub fn set<S: AsRef<str>>(&mut self, kind: ResourceKind, responses: &[S]) -> Result<()> {
        let hrefs = extract_hrefs(responses)?;
        *self.slot_mut(kind) = hrefs;
        Ok(())
    }

    /// Like [`ResourceStore::set`], addressing the kind by its wire name.
    pub fn set_by_name<S: AsRef<str>>(&mut self, name: &str, responses: &[S]) -> Result<()> {
        let kind: ResourceKind = name.parse()?;
        self.set(kind, responses)
    }

    /// Current hrefs for `kind`; empty until a step produced them.
    pub fn get(&self, kind: ResourceKind) -> &[Href] {
        self.slot(kind)
    }

    pub fn get_by_name(&self, name: &str) -> Result<&[Href]> {
        let kind: ResourceKind = name.parse()?;
        Ok(self.get(kind))
    }

    pub fn vports(&self) -> &[Href] {
        &self.vports
    }

    pub fn topologies(&self) -> &[Href] {
        &self.topologies
    }

    pub fn device_groups(&self) -> &[Href] {
        &self.device_groups
    }

    pub fn ethernets(&self) -> &[Href] {
        &self.ethernets
    }

    pub fn ipv4(&self) -> &[Href] {
        &self.ipv4
    }
}
