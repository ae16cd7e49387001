// admission control and rerouting for tenant flows on a priority-queued network

pub mod dsa;
pub mod error;
pub mod manager;
pub mod network;
pub mod path_index;
pub mod rerouting;
pub mod routing;
pub mod store;
pub mod tenant;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Result, TenantError};
pub use manager::TenantManager;
pub use network::{HostId, Network};
pub use rerouting::{AvoidRegion, CostIncrease, FlowSelection, LinkGranularity, RerouteLimit,
    ReroutingConfiguration, ReroutingStats, SortFlows};
pub use store::{FlowId, RequestId, TenantId, VmId};
pub use tenant::{FiveTupleMatching, Matching, TrafficContract};
