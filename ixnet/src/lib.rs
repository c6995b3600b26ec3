//! ixnet: drives an IxNetwork appliance through its REST API.
//!
//! Builds a test topology (ports, topologies, device groups, Ethernet and
//! IPv4 stacks) by threading the href of every created resource into the
//! next request, then configures and runs a traffic item and reads back the
//! flow statistics.

pub mod chain;
pub mod error;
pub mod service;
pub mod session;
pub mod stats;
pub mod store;
pub mod traffic;
pub mod transport;

#[cfg(test)]
mod test_util;

pub use chain::{AddressPair, PortSpec};
pub use error::{IxError, Result};
pub use session::IxNetworkSession;
pub use stats::FlowStatistics;
pub use store::{Href, ResourceKind, ResourceStore};
pub use traffic::{FrameParameters, TrafficItemConfig};
pub use transport::{HttpTransport, RequestObserver, RestTransport, SessionConfig};
