use log::{debug, info};

use super::{rank_candidates, select_candidates, AvoidRegion, LinkGranularity, ReroutingConfiguration, ReroutingStats};
use crate::dsa::graph::HashSet;
use crate::error::Result;
use crate::network::{EdgeId, Network};
use crate::path_index::PathIndex;
use crate::routing::cost_view::CostView;
use crate::routing::{embed_request, CostFunction, Path, Request, Router};
use crate::store::{FlowId, RequestId, Store};

pub struct RerouteOutcome {
    // the blocked request, embedded, if some move made room for it
    pub request:Option<RequestId>,
    pub stats:ReroutingStats
}

// moves candidate flows one at a time until the blocked request fits.
// a moved flow stays moved even when the blocked request still does not fit.
pub struct ReroutingOrchestrator<'m,R,F:?Sized> {
    store:&'m mut Store,
    network:&'m Network,
    index:&'m PathIndex,
    router:&'m R,
    costs:&'m mut F,
    config:&'m ReroutingConfiguration
}

impl<'m,R:Router,F:CostFunction + ?Sized> ReroutingOrchestrator<'m,R,F> {
    pub fn new(store:&'m mut Store,network:&'m Network,index:&'m PathIndex,router:&'m R,
        costs:&'m mut F,config:&'m ReroutingConfiguration) -> Self
    {
        Self {store,network,index,router,costs,config}
    }

    pub fn run(&mut self,request:&Request) -> Result<RerouteOutcome> {
        let candidates = select_candidates(self.network,self.store,self.index,request,self.config.selection())?;
        let max_attempts = self.config.max_attempts(candidates.len());
        info!("will try at most {max_attempts} reroutings out of {} candidates",candidates.len());
        let ranked = rank_candidates(self.network,self.store,self.index,request,&candidates,self.config.sort())?;

        let mut stats = ReroutingStats::default();
        for flow in ranked.into_iter().take(max_attempts) {
            stats.attempts.push(flow);
            info!("rerouting attempt #{}, {flow:?}",stats.attempts.len());
            if !self.reroute(flow,request)? {
                continue;
            }
            stats.reconfigured.push(flow);
            let retried = embed_request(self.store,self.network,self.router,
                &mut CostView::base(&mut *self.costs),request,None);
            if let Some(id) = retried {
                info!("blocked request fits after moving {flow:?}");
                stats.successes.push(flow);
                return Ok(RerouteOutcome {request:Some(id),stats});
            }
            debug!("blocked request still does not fit after moving {flow:?}");
        }
        Ok(RerouteOutcome {request:None,stats})
    }

    // edges the moved flow should avoid: the region around the blocked
    // request minus its host links, and the flow's own path minus its first hop
    fn penalized_edges(&self,old_path:&Path,blocked:&Request) -> Result<HashSet<EdgeId>> {
        let increase = self.config.cost_increase();
        let (source,destination) = (blocked.source(),blocked.destination());
        let region:Vec<&Path> = match increase.region() {
            AvoidRegion::OwnPathOnly => vec![],
            AvoidRegion::ShortestPath => self.index.paths_up_to(source,destination,1)?.into_iter().take(1).collect(),
            AvoidRegion::AllShortestPaths => self.index.paths_up_to(source,destination,1)?,
            AvoidRegion::AllTwoShortestPaths => self.index.paths_up_to(source,destination,2)?
        };

        let mut edges = HashSet::default();
        for path in region {
            let links = path.edges();
            if links.len() > 2 {
                for link_edge in &links[1..links.len() - 1] {
                    edges.extend(self.network.queue_edges(*link_edge));
                }
            }
        }
        for queue_edge in old_path.edges().iter().skip(1) {
            match increase.granularity() {
                LinkGranularity::QueueLink => {
                    edges.insert(*queue_edge);
                }
                LinkGranularity::PhysicalLink => {
                    if let Some(link_edge) = self.network.link_edge_of(*queue_edge) {
                        edges.extend(self.network.queue_edges(link_edge));
                    }
                }
            }
        }
        Ok(edges)
    }

    // make before break: the old path keeps its reservation until the new
    // one is registered. false if the flow could not be moved.
    fn reroute(&mut self,flow:FlowId,blocked:&Request) -> Result<bool> {
        let Some(old_request) = self.store.get(flow).and_then(|record| record.request()) else {return Ok(false)};
        let Some(record) = self.store.get(old_request).cloned() else {return Ok(false)};
        let Some(old_path) = record.path() else {return Ok(false)};

        let penalized = self.penalized_edges(old_path,blocked)?;
        let moved = embed_request(self.store,self.network,self.router,
            &mut CostView::inflated(&mut *self.costs,penalized),record.request(),Some(old_request));
        let Some(new_request) = moved else {
            debug!("no alternative path for {flow:?}");
            return Ok(false);
        };

        let mut txn = self.store.begin();
        let locked = txn.read_lock(flow);
        debug_assert!(locked,"{flow:?} vanished while being moved");
        txn.detach_request(old_request);
        txn.update(flow,|record| record.set_request(Some(new_request)));
        txn.update(new_request,|record| record.set_flow(Some(flow)));
        txn.commit().apply(self.network,&mut *self.costs);
        info!("moved {flow:?} from {old_request:?} to {new_request:?}");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::ReroutingOrchestrator;
    use crate::network::{EdgeId, Network};
    use crate::path_index::PathIndex;
    use crate::rerouting::{AvoidRegion, CostIncrease, FlowSelection, LinkGranularity, RerouteLimit,
        ReroutingConfiguration, SortFlows};
    use crate::routing::admission::TokenBucketAdmission;
    use crate::routing::router::KspRouter;
    use crate::routing::{Path, Request};
    use crate::store::Store;
    use crate::test_support::{init_logging, nic};

    #[test]
    fn test_penalized_edges_follow_granularity_and_region() {
        init_logging();
        // lundi -> s1 -> s2 -> mardi, two queues per link
        let mut network = Network::new();
        let lundi = network.create_host("lundi");
        let mardi = network.create_host("mardi");
        let (from,to) = (nic(&network,lundi),nic(&network,mardi));
        let s1 = network.create_node("s1");
        let s2 = network.create_node("s2");
        let mut links = vec![];
        for (source,destination) in [(from,s1),(s1,s2),(s2,to)] {
            let link = network.create_link(source,destination,1e6,0.0,&[100.0,100.0]).unwrap();
            links.push(network.queue_edges(link));
        }
        let index = PathIndex::build(network.link_graph(),1);
        let old_path = Path::new(vec![links[0][0],links[1][1],links[2][0]]);
        let blocked = Request::new(from,to,100.0,10.0,1.0);

        let penalized = |granularity,region| -> BTreeSet<EdgeId> {
            let config = ReroutingConfiguration::new(FlowSelection::AllShortestPaths,SortFlows::NoSort,
                CostIncrease::new(granularity,region),RerouteLimit::Absolute(1)).unwrap();
            let mut store = Store::new();
            let mut costs = TokenBucketAdmission::new();
            let router = KspRouter::default();
            let orchestrator = ReroutingOrchestrator::new(&mut store,&network,&index,&router,&mut costs,&config);
            orchestrator.penalized_edges(&old_path,&blocked).unwrap().into_iter().collect()
        };

        // the first hop of the moved flow is never penalized
        assert_eq!(penalized(LinkGranularity::QueueLink,AvoidRegion::OwnPathOnly),
            BTreeSet::from([links[1][1],links[2][0]]));
        assert_eq!(penalized(LinkGranularity::PhysicalLink,AvoidRegion::OwnPathOnly),
            BTreeSet::from([links[1][0],links[1][1],links[2][0],links[2][1]]));
        // the region drops the host links at both ends
        assert_eq!(penalized(LinkGranularity::QueueLink,AvoidRegion::ShortestPath),
            BTreeSet::from([links[1][0],links[1][1],links[2][0]]));
        assert_eq!(penalized(LinkGranularity::PhysicalLink,AvoidRegion::AllShortestPaths),
            BTreeSet::from([links[1][0],links[1][1],links[2][0],links[2][1]]));
    }
}
