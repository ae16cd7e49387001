// rerouting of already embedded flows to make room for a blocked one.
//
// the configuration decides which flows are candidates (selection), in which
// order they are tried (sort), which edges a moved flow should stay away from
// (cost increase) and how many flows may be tried at all (limit).

mod orchestrator;
mod ranker;
mod selector;

pub use orchestrator::{RerouteOutcome, ReroutingOrchestrator};
pub use ranker::rank_candidates;
pub use selector::select_candidates;

use crate::error::{Result, TenantError};
use crate::store::FlowId;

#[derive(Clone,Copy,Debug,PartialEq,Eq,Hash)]
pub enum FlowSelection {
    // every flow holding a path
    AllFlows,
    // flows crossing the first shortest path of the blocked request
    OneShortestPath,
    // flows crossing any shortest path
    AllShortestPaths,
    // flows crossing any path of the two shortest tiers
    AllTwoShortestPaths
}

impl FlowSelection {
    fn tiers(&self) -> usize {
        match self {
            Self::AllFlows => 0,
            Self::OneShortestPath | Self::AllShortestPaths => 1,
            Self::AllTwoShortestPaths => 2
        }
    }
}

// candidates are tried in decreasing order of the key, flow id breaks ties
#[derive(Clone,Copy,Debug,PartialEq,Eq,Hash)]
pub enum SortFlows {
    NoSort,
    // links shared with the shortest paths of the blocked request
    CommonEdges,
    Rate,
    Burst,
    // the flow's own latency bound
    Delay
}

impl SortFlows {
    fn tiers(&self) -> usize {
        match self {
            Self::CommonEdges => 1,
            _ => 0
        }
    }
}

#[derive(Clone,Copy,Debug,PartialEq,Eq,Hash)]
pub enum LinkGranularity {
    // every queue of a link on the flow's old path
    PhysicalLink,
    // only the queues the flow's old path used
    QueueLink
}

#[derive(Clone,Copy,Debug,PartialEq,Eq,Hash)]
pub enum AvoidRegion {
    OwnPathOnly,
    // plus the first shortest path of the blocked request
    ShortestPath,
    AllShortestPaths,
    AllTwoShortestPaths
}

impl AvoidRegion {
    fn tiers(&self) -> usize {
        match self {
            Self::OwnPathOnly => 0,
            Self::ShortestPath | Self::AllShortestPaths => 1,
            Self::AllTwoShortestPaths => 2
        }
    }
}

#[derive(Clone,Copy,Debug,PartialEq,Eq,Hash)]
pub struct CostIncrease {
    granularity:LinkGranularity,
    region:AvoidRegion
}

impl CostIncrease {
    pub fn new(granularity:LinkGranularity,region:AvoidRegion) -> Self {
        Self {granularity,region}
    }
    pub fn granularity(&self) -> LinkGranularity {
        self.granularity
    }
    pub fn region(&self) -> AvoidRegion {
        self.region
    }
}

#[derive(Clone,Copy,Debug,PartialEq,Eq,Hash)]
pub enum RerouteLimit {
    Absolute(usize),
    // of the candidate count, rounded down plus one
    Percent(usize)
}

#[derive(Clone,Debug,PartialEq,Eq)]
pub struct ReroutingConfiguration {
    selection:FlowSelection,
    sort:SortFlows,
    cost_increase:CostIncrease,
    limit:RerouteLimit
}

impl ReroutingConfiguration {
    pub fn new(selection:FlowSelection,sort:SortFlows,cost_increase:CostIncrease,limit:RerouteLimit) -> Result<Self> {
        if let RerouteLimit::Percent(percent) = limit {
            if percent > 100 {
                return Err(TenantError::InvalidArgument {reason:format!("reroute limit of {percent}% is above 100%")});
            }
        }
        Ok(Self {selection,sort,cost_increase,limit})
    }
    pub fn selection(&self) -> FlowSelection {
        self.selection
    }
    pub fn sort(&self) -> SortFlows {
        self.sort
    }
    pub fn cost_increase(&self) -> CostIncrease {
        self.cost_increase
    }
    pub fn limit(&self) -> RerouteLimit {
        self.limit
    }
    // how many of `candidates` flows may be tried
    pub fn max_attempts(&self,candidates:usize) -> usize {
        let cap = match self.limit {
            RerouteLimit::Absolute(limit) => limit,
            RerouteLimit::Percent(percent) => candidates*percent/100 + 1
        };
        cap.min(candidates)
    }
    // shortest path tiers the path index has to hold for this configuration
    pub fn index_depth(&self) -> usize {
        self.selection.tiers()
            .max(self.sort.tiers())
            .max(self.cost_increase.region.tiers())
    }
}

// what happened while trying to make room for one flow
#[derive(Clone,Debug,Default,PartialEq,Eq)]
pub struct ReroutingStats {
    // every flow that was tried, in order
    attempts:Vec<FlowId>,
    // flows that were actually moved to a new path
    reconfigured:Vec<FlowId>,
    // the moved flow after which the blocked one fit
    successes:Vec<FlowId>
}

impl ReroutingStats {
    pub fn attempts(&self) -> &[FlowId] {
        &self.attempts
    }
    pub fn reconfigured(&self) -> &[FlowId] {
        &self.reconfigured
    }
    pub fn successes(&self) -> &[FlowId] {
        &self.successes
    }
}
