use std::collections::BTreeSet;

use super::FlowSelection;
use crate::error::Result;
use crate::network::{EdgeId, Network};
use crate::path_index::PathIndex;
use crate::routing::{Path, Request};
use crate::store::{FlowId, Store};

// flows that may be moved to make room for `request`
pub fn select_candidates(network:&Network,store:&Store,index:&PathIndex,request:&Request,
    selection:FlowSelection) -> Result<BTreeSet<FlowId>>
{
    let (source,destination) = (request.source(),request.destination());
    let region:Vec<&Path> = match selection {
        FlowSelection::AllFlows => {
            return Ok(store.routed_requests().into_iter()
                .filter_map(|id| store.get(id)?.flow())
                .collect());
        }
        FlowSelection::OneShortestPath => index.paths_up_to(source,destination,1)?.into_iter().take(1).collect(),
        FlowSelection::AllShortestPaths => index.paths_up_to(source,destination,1)?,
        FlowSelection::AllTwoShortestPaths => index.paths_up_to(source,destination,2)?
    };

    let queue_edges:BTreeSet<EdgeId> = region.iter()
        .flat_map(|path| path.edges())
        .flat_map(|link_edge| network.queue_edges(*link_edge))
        .collect();
    Ok(queue_edges.into_iter()
        .flat_map(|edge| store.requests_on(edge))
        .filter_map(|id| store.get(id)?.flow())
        .collect())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::select_candidates;
    use crate::manager::TenantManager;
    use crate::path_index::PathIndex;
    use crate::rerouting::FlowSelection;
    use crate::routing::admission::TokenBucketAdmission;
    use crate::routing::router::KspRouter;
    use crate::routing::Request;
    use crate::tenant::TrafficContract;
    use crate::test_support::{bottleneck, init_logging, matching, nic, Bottleneck};

    #[test]
    fn test_candidates_follow_the_region() {
        init_logging();
        let Bottleneck {network,a,b,c,d,..} = bottleneck();
        let (na,nb,nc) = (nic(&network,a),nic(&network,b),nic(&network,c));
        let mut manager = TenantManager::new(network,KspRouter::default(),TokenBucketAdmission::new());
        let tenant = manager.create_tenant("tenant").unwrap();
        let vc = manager.create_virtual_machine(tenant,"vc",Some(c)).unwrap();
        let vb = manager.create_virtual_machine(tenant,"vb",Some(b)).unwrap();
        let vd = manager.create_virtual_machine(tenant,"vd",Some(d)).unwrap();
        let contract = TrafficContract::token_bucket(800,10);
        let towards_b = manager.create_flow("towards b",vc,vb,matching(1),contract,1000.0).unwrap();
        let towards_d = manager.create_flow("towards d",vc,vd,matching(2),contract,1000.0).unwrap();
        let local = manager.create_flow("local",vd,vd,matching(3),contract,1000.0).unwrap();

        let index = PathIndex::build(manager.network().link_graph(),2);
        let select = |source,destination,selection| {
            let request = Request::new(source,destination,100.0,10.0,1.0);
            select_candidates(manager.network(),manager.store(),&index,&request,selection).unwrap()
        };

        // unrouted flows are never candidates
        let all = select(na,nb,FlowSelection::AllFlows);
        assert_eq!(all,BTreeSet::from([towards_b,towards_d]));
        assert!(!all.contains(&local));

        assert_eq!(select(na,nb,FlowSelection::OneShortestPath),BTreeSet::from([towards_b]));
        assert_eq!(select(na,nb,FlowSelection::AllTwoShortestPaths),BTreeSet::from([towards_b]));
        assert_eq!(select(nc,nb,FlowSelection::AllShortestPaths),BTreeSet::from([towards_b]));
        // the second tier from c to b runs over s3 and s4
        assert_eq!(select(nc,nb,FlowSelection::AllTwoShortestPaths),BTreeSet::from([towards_b,towards_d]));
        // nothing reaches a
        assert!(select(nb,na,FlowSelection::AllShortestPaths).is_empty());

        let request = Request::new(na,9999,100.0,10.0,1.0);
        assert!(select_candidates(manager.network(),manager.store(),&index,&request,FlowSelection::OneShortestPath).is_err());
    }
}
