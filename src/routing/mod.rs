pub mod admission;
pub mod cost_view;
pub mod router;

use log::{debug, warn};

use crate::network::{Bytes, BytesPerSecond, EdgeId, Network, NodeId, Seconds};
use crate::store::{FlowId, RequestId, Store};

// what the routing layer is asked to carry between two network nodes
#[derive(Clone,Debug,PartialEq)]
pub struct Request {
    source:NodeId,
    destination:NodeId,
    rate:BytesPerSecond,
    burst:Bytes,
    deadline:Seconds
}

impl Request {
    pub fn new(source:NodeId,destination:NodeId,rate:BytesPerSecond,burst:Bytes,deadline:Seconds) -> Self {
        Self {source,destination,rate,burst,deadline}
    }
    pub fn source(&self) -> NodeId {
        self.source
    }
    pub fn destination(&self) -> NodeId {
        self.destination
    }
    pub fn rate(&self) -> BytesPerSecond {
        self.rate
    }
    pub fn burst(&self) -> Bytes {
        self.burst
    }
    pub fn deadline(&self) -> Seconds {
        self.deadline
    }
}

// ordered, non-empty list of edges. depending on where it comes from these
// are queue edges (routed requests) or link edges (path index).
#[derive(Clone,Debug,PartialEq,Eq,Hash)]
pub struct Path {
    edges:Vec<EdgeId>
}

impl Path {
    pub fn new(edges:Vec<EdgeId>) -> Self {
        debug_assert!(!edges.is_empty(),"a path needs at least one edge");
        Self {edges}
    }
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }
    pub fn len(&self) -> usize {
        self.edges.len()
    }
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

// admission model of the queue graph. register/deregister are the only
// mutating calls: a registered path holds its resources until deregistered.
pub trait CostFunction {
    fn has_access(&self,network:&Network,edge:EdgeId,request:&Request) -> bool;
    fn cost(&self,network:&Network,edge:EdgeId,request:&Request) -> f64;
    // worst case time a packet of the request spends on this edge
    fn delay(&self,network:&Network,edge:EdgeId,request:&Request) -> Seconds;
    // false if the path cannot take the request, nothing is reserved then
    fn register(&mut self,network:&Network,path:&Path,request:&Request) -> bool;
    fn deregister(&mut self,network:&Network,path:&Path,request:&Request) -> bool;
}

pub trait Router {
    // a path over the queue graph meeting the request deadline, or None.
    // never registers anything.
    fn route<C:CostFunction + ?Sized>(&self,network:&Network,request:&Request,costs:&C) -> Option<Path>;
}

// a request together with the path it was given, if any
#[derive(Clone,Debug)]
pub struct RequestRecord {
    request:Request,
    path:Option<Path>,
    flow:Option<FlowId>,
    // the request this one replaced during rerouting
    rerouted_from:Option<RequestId>
}

impl RequestRecord {
    pub fn new(request:Request,rerouted_from:Option<RequestId>) -> Self {
        Self {request,path:None,flow:None,rerouted_from}
    }
    pub fn request(&self) -> &Request {
        &self.request
    }
    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }
    pub fn flow(&self) -> Option<FlowId> {
        self.flow
    }
    pub fn rerouted_from(&self) -> Option<RequestId> {
        self.rerouted_from
    }
    pub(crate) fn set_path(&mut self,path:Option<Path>) {
        self.path = path;
    }
    pub(crate) fn set_flow(&mut self,flow:Option<FlowId>) {
        self.flow = flow;
    }
}

// route a request and keep it only if its path could be registered.
// on None the store and the cost function are exactly as before.
pub(crate) fn embed_request<R,C>(store:&mut Store,network:&Network,router:&R,costs:&mut C,
    request:&Request,rerouted_from:Option<RequestId>) -> Option<RequestId>
    where R:Router, C:CostFunction + ?Sized
{
    let mut txn = store.begin();
    let id = txn.insert(RequestRecord::new(request.clone(),rerouted_from));
    let Some(path) = router.route(network,request,&*costs) else {
        debug!("no feasible path for {id:?} from node {} to node {}",request.source,request.destination);
        return None;
    };
    if !costs.register(network,&path,request) {
        warn!("path {path:?} for {id:?} was feasible but could not be registered");
        return None;
    }
    txn.attach_path(id,path);
    txn.commit().apply(network,costs);
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::router::KspRouter;
    use super::admission::TokenBucketAdmission;
    use super::{embed_request, Request};
    use crate::network::Network;
    use crate::store::Store;

    #[test]
    fn test_embed_request_is_all_or_nothing() {
        let mut network = Network::new();
        let a = network.create_node("a");
        let b = network.create_node("b");
        let edge = network.create_link(a,b,1000.0,0.0,&[100.0]).unwrap();
        let queue = network.queue_edges(edge)[0];
        let mut store = Store::new();
        let mut costs = TokenBucketAdmission::new();
        let router = KspRouter::default();

        let request = Request::new(a,b,600.0,10.0,1.0);
        let first = embed_request(&mut store,&network,&router,&mut costs,&request,None).unwrap();
        assert_eq!(store.get(first).unwrap().path().unwrap().edges(),&[queue]);
        assert_eq!(costs.reserved_rate(queue),600.0);

        // does not fit next to the first one
        assert!(embed_request(&mut store,&network,&router,&mut costs,&request,None).is_none());
        assert_eq!(store.routed_requests(),vec![first]);
        assert_eq!(costs.reserved_rate(queue),600.0);
        assert_eq!(store.read_lock_count(),0);
    }
}
