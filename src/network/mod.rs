// topology model of a priority-scheduled packet network.
// every physical link appears once in the link graph and once per priority
// queue in the queue graph; both graphs share the same node ids, so a path
// in either graph starts and ends at the same network nodes.

use std::sync::atomic::{AtomicUsize, Ordering};

use lazy_static::lazy_static;

use crate::dsa::graph::{DirectedGraph, HashMap};
use crate::error::{Result, TenantError};

pub type NodeId = usize;
pub type EdgeId = usize;

// unit in bytes
pub type Bytes = f64;
// unit in bytes per second
pub type BytesPerSecond = f64;
// unit in seconds
pub type Seconds = f64;

//free parameters, that can be tweaked
lazy_static! {
    static ref DEFAULT_BUFFER:Bytes = 30000.0;
    static ref DEFAULT_PROPAGATION_DELAY:Seconds = 0.0;
}

static NEXT_NETWORK_ID:AtomicUsize = AtomicUsize::new(0);

#[derive(Clone,Copy,Debug,PartialEq,Eq,Hash,PartialOrd,Ord)]
pub struct NetworkId(usize);

#[derive(Clone,Copy,Debug,PartialEq,Eq,Hash,PartialOrd,Ord)]
pub struct HostId {
    network:NetworkId,
    index:usize
}

impl HostId {
    pub fn network(&self) -> NetworkId {
        self.network
    }
}

#[derive(Clone,Debug)]
pub struct Host {
    id:HostId,
    name:String,
    // network nodes standing for the host's NICs
    interfaces:Vec<NodeId>
}

impl Host {
    pub fn id(&self) -> HostId {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn interfaces(&self) -> &[NodeId] {
        &self.interfaces
    }
}

#[derive(Clone,Debug)]
pub struct NetworkNode {
    id:NodeId,
    name:String,
    host:Option<HostId>
}

impl NetworkNode {
    pub fn id(&self) -> NodeId {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn host(&self) -> Option<HostId> {
        self.host
    }
}

#[derive(Clone,Debug)]
pub struct Queue {
    edge:EdgeId,
    // 0 is served first
    priority:usize,
    buffer:Bytes,
    rate_share:f64
}

impl Queue {
    pub fn edge(&self) -> EdgeId {
        self.edge
    }
    pub fn priority(&self) -> usize {
        self.priority
    }
    pub fn buffer(&self) -> Bytes {
        self.buffer
    }
    pub fn rate_share(&self) -> f64 {
        self.rate_share
    }
}

#[derive(Clone,Debug)]
pub struct Link {
    link_edge:EdgeId,
    source:NodeId,
    destination:NodeId,
    rate:BytesPerSecond,
    propagation_delay:Seconds,
    queues:Vec<Queue>
}

impl Link {
    pub fn link_edge(&self) -> EdgeId {
        self.link_edge
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
    pub fn propagation_delay(&self) -> Seconds {
        self.propagation_delay
    }
    pub fn queues(&self) -> &[Queue] {
        &self.queues
    }
}

pub struct Network {
    id:NetworkId,
    link_graph:DirectedGraph,
    queue_graph:DirectedGraph,
    hosts:Vec<Host>,
    nodes:HashMap<NodeId,NetworkNode>,
    // keyed by link edge
    links:HashMap<EdgeId,Link>,
    // queue edge -> link edge
    queue_owner:HashMap<EdgeId,EdgeId>,
    // nodes and edges draw from the same counter
    next_id:usize
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    pub fn new() -> Self {
        Self {
            id:NetworkId(NEXT_NETWORK_ID.fetch_add(1,Ordering::Relaxed)),
            link_graph:DirectedGraph::new(),
            queue_graph:DirectedGraph::new(),
            hosts:vec![],
            nodes:HashMap::default(),
            links:HashMap::default(),
            queue_owner:HashMap::default(),
            next_id:0
        }
    }
    pub fn id(&self) -> NetworkId {
        self.id
    }
    fn allocate_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
    fn push_node(&mut self,name:String,host:Option<HostId>) -> NodeId {
        let id = self.allocate_id();
        self.link_graph.push_node(id);
        self.queue_graph.push_node(id);
        self.nodes.insert(id,NetworkNode {id,name,host});
        id
    }

    // a host always starts with a single interface
    pub fn create_host(&mut self,name:&str) -> HostId {
        let id = HostId {network:self.id,index:self.hosts.len()};
        let interface = self.push_node(format!("{name}/nic0"),Some(id));
        self.hosts.push(Host {id,name:name.to_string(),interfaces:vec![interface]});
        id
    }
    pub fn add_interface(&mut self,host:HostId) -> Result<NodeId> {
        if !self.contains_host(host) {
            return Err(TenantError::NetworkMismatch {what:format!("host {host:?}")});
        }
        let name = format!("{}/nic{}",self.hosts[host.index].name,self.hosts[host.index].interfaces.len());
        let interface = self.push_node(name,Some(host));
        self.hosts[host.index].interfaces.push(interface);
        Ok(interface)
    }
    pub fn create_node(&mut self,name:&str) -> NodeId {
        self.push_node(name.to_string(),None)
    }

    // one queue per buffer entry, in decreasing priority order.
    // the link rate is split evenly between the queues.
    pub fn create_link(&mut self,source:NodeId,destination:NodeId,rate:BytesPerSecond,
        propagation_delay:Seconds,buffers:&[Bytes]) -> Result<EdgeId>
    {
        if !self.nodes.contains_key(&source) || !self.nodes.contains_key(&destination) {
            return Err(TenantError::InvalidArgument {
                reason:format!("link {source} -> {destination} references an unknown node")
            });
        }
        if source == destination {
            return Err(TenantError::InvalidArgument {reason:format!("link {source} -> {destination} is a loop")});
        }
        if !(rate > 0.0) || !(propagation_delay >= 0.0) || buffers.is_empty()
            || buffers.iter().any(|buffer| !(*buffer > 0.0))
        {
            return Err(TenantError::InvalidArgument {
                reason:format!("link {source} -> {destination} needs a positive rate and at least one positive buffer")
            });
        }

        let link_edge = self.allocate_id();
        self.link_graph.push_edge(link_edge,source,destination);
        let rate_share = 1.0/buffers.len() as f64;
        let mut queues = Vec::with_capacity(buffers.len());
        for (priority,buffer) in buffers.iter().enumerate() {
            let edge = self.allocate_id();
            self.queue_graph.push_edge(edge,source,destination);
            self.queue_owner.insert(edge,link_edge);
            queues.push(Queue {edge,priority,buffer:*buffer,rate_share});
        }
        self.links.insert(link_edge,Link {link_edge,source,destination,rate,propagation_delay,queues});
        Ok(link_edge)
    }
    pub fn create_simple_link(&mut self,source:NodeId,destination:NodeId,rate:BytesPerSecond) -> Result<EdgeId> {
        self.create_link(source,destination,rate,*DEFAULT_PROPAGATION_DELAY,&[*DEFAULT_BUFFER])
    }

    pub fn contains_host(&self,host:HostId) -> bool {
        host.network == self.id && host.index < self.hosts.len()
    }
    pub fn host(&self,host:HostId) -> Option<&Host> {
        if host.network != self.id {
            return None;
        }
        self.hosts.get(host.index)
    }
    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }
    pub fn node(&self,node:NodeId) -> Option<&NetworkNode> {
        self.nodes.get(&node)
    }
    pub fn link(&self,link_edge:EdgeId) -> Option<&Link> {
        self.links.get(&link_edge)
    }
    pub fn link_graph(&self) -> &DirectedGraph {
        &self.link_graph
    }
    pub fn queue_graph(&self) -> &DirectedGraph {
        &self.queue_graph
    }
    pub fn queue_edges(&self,link_edge:EdgeId) -> Vec<EdgeId> {
        self.links.get(&link_edge)
            .map(|link| link.queues.iter().map(|queue| queue.edge).collect())
            .unwrap_or_default()
    }
    pub fn link_edge_of(&self,queue_edge:EdgeId) -> Option<EdgeId> {
        self.queue_owner.get(&queue_edge).copied()
    }
    pub fn queue(&self,queue_edge:EdgeId) -> Option<(&Link,&Queue)> {
        let link = self.links.get(self.queue_owner.get(&queue_edge)?)?;
        let queue = link.queues.iter().find(|queue| queue.edge == queue_edge)?;
        Some((link,queue))
    }
}

#[cfg(test)]
mod tests {
    use super::Network;
    use crate::error::TenantError;

    #[test]
    fn test_link_and_queue_graphs() {
        let mut network = Network::new();
        let host = network.create_host("lundi");
        let interface = network.host(host).unwrap().interfaces()[0];
        let switch = network.create_node("s1");
        let link = network.create_link(interface,switch,1e9/8.0,0.0,&[3000.0,6000.0]).unwrap();

        assert_eq!(network.link_graph().edges_len(),1);
        assert_eq!(network.queue_graph().edges_len(),2);
        let queues = network.queue_edges(link);
        assert_eq!(queues.len(),2);
        for queue_edge in queues.iter() {
            assert_eq!(network.link_edge_of(*queue_edge),Some(link));
            assert_eq!(network.queue_graph().endpoints(*queue_edge),Some((interface,switch)));
            let (owner,queue) = network.queue(*queue_edge).unwrap();
            assert_eq!(owner.link_edge(),link);
            assert_eq!(queue.rate_share(),0.5);
        }
        assert_eq!(network.node(interface).unwrap().host(),Some(host));
        assert!(network.node(switch).unwrap().host().is_none());
        assert!(network.queue_edges(queues[0]).is_empty());
    }

    #[test]
    fn test_hosts_belong_to_their_network() {
        let mut first = Network::new();
        let mut second = Network::new();
        let host = first.create_host("mardi");
        assert!(first.contains_host(host));
        assert!(!second.contains_host(host));
        assert!(second.host(host).is_none());
        assert!(matches!(second.add_interface(host),Err(TenantError::NetworkMismatch {..})));
        first.add_interface(host).unwrap();
        assert_eq!(first.host(host).unwrap().interfaces().len(),2);
    }

    #[test]
    fn test_invalid_links() {
        let mut network = Network::new();
        let a = network.create_node("a");
        let b = network.create_node("b");
        assert!(network.create_link(a,b,0.0,0.0,&[1.0]).is_err());
        assert!(network.create_link(a,b,1.0,0.0,&[]).is_err());
        assert!(network.create_link(a,a,1.0,0.0,&[1.0]).is_err());
        assert!(network.create_link(a,999,1.0,0.0,&[1.0]).is_err());
        assert!(network.create_simple_link(a,b,1.0).is_ok());
    }
}
