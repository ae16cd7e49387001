// topologies and flow parameters shared by the tests

use std::net::{IpAddr, Ipv4Addr};

use crate::network::{EdgeId, HostId, Network, NodeId};
use crate::tenant::{FiveTupleMatching, Matching};

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// tcp from 10.0.0.1:<port> to 10.0.0.2:80
pub(crate) fn matching(port:u16) -> Matching {
    FiveTupleMatching::new(
        IpAddr::V4(Ipv4Addr::new(10,0,0,1)),
        IpAddr::V4(Ipv4Addr::new(10,0,0,2)),
        port,
        80,
        6
    ).into()
}

pub(crate) fn nic(network:&Network,host:HostId) -> NodeId {
    network.host(host).map(|h| h.interfaces()[0]).unwrap()
}

// two hosts on one switch, 1 Gbit/s both ways
pub(crate) struct TwoHosts {
    pub network:Network,
    pub lundi:HostId,
    pub mardi:HostId
}

pub(crate) fn two_hosts() -> TwoHosts {
    let mut network = Network::new();
    let lundi = network.create_host("lundi");
    let mardi = network.create_host("mardi");
    let switch = network.create_node("s1");
    for host in [lundi,mardi] {
        let interface = nic(&network,host);
        network.create_simple_link(interface,switch,1e9/8.0).unwrap();
        network.create_simple_link(switch,interface,1e9/8.0).unwrap();
    }
    TwoHosts {network,lundi,mardi}
}

// a -> s1, c -> s1, s1 -> s2, s2 -> b
// c -> s3, s3 -> s4, s4 -> s2, s4 -> d
//
// s1 -> s2 is the only slow link (1000 B/s), everything else runs at 1 MB/s.
// every link has a single 100 byte queue. a reaches b only over s1 -> s2,
// c reaches b over s1 -> s2 or, one hop longer, over s3 and s4.
pub(crate) struct Bottleneck {
    pub network:Network,
    pub a:HostId,
    pub b:HostId,
    pub c:HostId,
    pub d:HostId,
    pub bottleneck:EdgeId,
    pub detour:EdgeId
}

pub(crate) fn bottleneck() -> Bottleneck {
    let mut network = Network::new();
    let a = network.create_host("a");
    let b = network.create_host("b");
    let c = network.create_host("c");
    let d = network.create_host("d");
    let (na,nb,nc,nd) = (nic(&network,a),nic(&network,b),nic(&network,c),nic(&network,d));
    let s1 = network.create_node("s1");
    let s2 = network.create_node("s2");
    let s3 = network.create_node("s3");
    let s4 = network.create_node("s4");
    let link = |network:&mut Network,from:NodeId,to:NodeId,rate:f64| network.create_link(from,to,rate,0.0,&[100.0]).unwrap();
    link(&mut network,na,s1,1e6);
    link(&mut network,nc,s1,1e6);
    link(&mut network,nc,s3,1e6);
    let bottleneck = link(&mut network,s1,s2,1000.0);
    let detour = link(&mut network,s3,s4,1e6);
    link(&mut network,s4,s2,1e6);
    link(&mut network,s2,nb,1e6);
    link(&mut network,s4,nd,1e6);
    Bottleneck {network,a,b,c,d,bottleneck,detour}
}
