use std::fmt;
use std::net::IpAddr;

// packet classifier selecting the traffic of a flow
#[derive(Clone,Debug,PartialEq,Eq,Hash)]
pub enum Matching {
    FiveTuple(FiveTupleMatching)
}

#[derive(Clone,Debug,PartialEq,Eq,Hash)]
pub struct FiveTupleMatching {
    source_ip:IpAddr,
    destination_ip:IpAddr,
    source_port:u16,
    destination_port:u16,
    protocol:u8
}

impl FiveTupleMatching {
    pub fn new(source_ip:IpAddr,destination_ip:IpAddr,source_port:u16,destination_port:u16,protocol:u8) -> Self {
        Self {source_ip,destination_ip,source_port,destination_port,protocol}
    }
    pub fn source_ip(&self) -> IpAddr {
        self.source_ip
    }
    pub fn destination_ip(&self) -> IpAddr {
        self.destination_ip
    }
    pub fn source_port(&self) -> u16 {
        self.source_port
    }
    pub fn destination_port(&self) -> u16 {
        self.destination_port
    }
    pub fn protocol(&self) -> u8 {
        self.protocol
    }
}

impl From<FiveTupleMatching> for Matching {
    fn from(value: FiveTupleMatching) -> Self {
        Self::FiveTuple(value)
    }
}

impl fmt::Display for Matching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FiveTuple(m) => write!(f,"{}:{} -> {}:{} proto {}",
                m.source_ip,m.source_port,m.destination_ip,m.destination_port,m.protocol)
        }
    }
}
