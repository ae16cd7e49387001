use thiserror::Error;

use crate::network::NodeId;
use crate::rerouting::ReroutingStats;

#[derive(Error,Debug)]
pub enum TenantError {
    #[error("{kind} name {name:?} already exists")]
    DuplicateName{kind:&'static str,name:String},
    #[error("invalid argument: {reason}")]
    InvalidArgument{reason:String},
    #[error("VMs {source_vm:?} and {destination_vm:?} do not belong to the same tenant")]
    CrossTenantMismatch{source_vm:String,destination_vm:String},
    #[error("{what} is not in the same network")]
    NetworkMismatch{what:String},
    #[error("no hosts in the network to place VM {vm:?}")]
    NoHostsAvailable{vm:String},
    #[error("{role} host {host:?} has {interfaces} interfaces, only single-interface hosts are supported")]
    UnsupportedTopology{role:&'static str,host:String,interfaces:usize},
    #[error("this matching already exists for source VM {vm:?}")]
    DuplicateMatching{vm:String},
    // carries the rerouting record when rerouting was attempted
    #[error("unable to embed flow {flow:?}")]
    EmbeddingInfeasible{flow:String,rerouting:Option<ReroutingStats>},
    #[error("no shortest path tier {level} from node {from_node} to node {to_node}")]
    UnknownIndexQuery{from_node:NodeId,to_node:NodeId,level:usize},
}

pub type Result<T> = std::result::Result<T,TenantError>;
