use lazy_static::lazy_static;
use log::trace;

use super::{CostFunction, Path, Request, Router};
use crate::dsa::ksp::YenPaths;
use crate::network::Network;

//free parameters, that can be tweaked
lazy_static! {
    static ref MAX_CANDIDATE_PATHS:usize = 32;
}

// cheapest accessible paths first, the first one within the deadline wins
#[derive(Clone,Debug)]
pub struct KspRouter {
    max_candidates:usize
}

impl Default for KspRouter {
    fn default() -> Self {
        Self {max_candidates:*MAX_CANDIDATE_PATHS}
    }
}

impl KspRouter {
    pub fn with_max_candidates(max_candidates:usize) -> Self {
        Self {max_candidates}
    }
}

impl Router for KspRouter {
    fn route<C:CostFunction + ?Sized>(&self,network:&Network,request:&Request,costs:&C) -> Option<Path> {
        let weight = |edge| {
            costs.has_access(network,edge,request).then(|| costs.cost(network,edge,request))
        };
        YenPaths::new(network.queue_graph(),request.source(),request.destination(),weight)
            .take(self.max_candidates)
            .find(|(cost,edges)| {
                let delay:f64 = edges.iter().map(|edge| costs.delay(network,*edge,request)).sum();
                trace!("candidate {edges:?} cost {cost} delay {delay}");
                delay <= request.deadline()
            })
            .map(|(_,edges)| Path::new(edges))
    }
}

#[cfg(test)]
mod tests {
    use super::KspRouter;
    use crate::network::Network;
    use crate::routing::admission::TokenBucketAdmission;
    use crate::routing::cost_view::CostView;
    use crate::routing::{Request, Router};

    // a -> b directly over a slow link, or a -> s -> b over fast ones
    fn diamond() -> (Network,usize,usize,usize,usize) {
        let mut network = Network::new();
        let a = network.create_node("a");
        let s = network.create_node("s");
        let b = network.create_node("b");
        let direct = network.create_link(a,b,100.0,0.0,&[100.0]).unwrap();
        let first = network.create_link(a,s,1e6,0.0,&[100.0]).unwrap();
        network.create_link(s,b,1e6,0.0,&[100.0]).unwrap();
        (network,a,b,direct,first)
    }

    #[test]
    fn test_fewest_hops_within_deadline() {
        let (network,a,b,direct,first) = diamond();
        let router = KspRouter::default();
        let admission = TokenBucketAdmission::new();

        let relaxed = Request::new(a,b,10.0,10.0,2.0);
        let path = router.route(&network,&relaxed,&admission).unwrap();
        assert_eq!(path.edges(),network.queue_edges(direct).as_slice());

        // the direct link needs one second to drain its buffer
        let tight = Request::new(a,b,10.0,10.0,0.5);
        let path = router.route(&network,&tight,&admission).unwrap();
        assert_eq!(path.len(),2);
        assert_eq!(path.edges()[0],network.queue_edges(first)[0]);

        let impossible = Request::new(a,b,10.0,10.0,1e-6);
        assert!(router.route(&network,&impossible,&admission).is_none());
        assert!(KspRouter::with_max_candidates(1).route(&network,&tight,&admission).is_none());
    }

    #[test]
    fn test_penalized_edges_are_avoided() {
        let (network,a,b,direct,_) = diamond();
        let mut admission = TokenBucketAdmission::new();
        let view = CostView::inflated(&mut admission,network.queue_edges(direct));
        let path = KspRouter::default().route(&network,&Request::new(a,b,10.0,10.0,2.0),&view).unwrap();
        assert_eq!(path.len(),2);
    }
}
