mod matching;
mod traffic;

pub use matching::{FiveTupleMatching, Matching};
pub use traffic::TrafficContract;

use crate::network::HostId;
use crate::rerouting::ReroutingStats;
use crate::store::{FlowId, RequestId, TenantId, VmId};

#[derive(Clone,Debug)]
pub struct Tenant {
    name:String,
    vms:Vec<VmId>
}

impl Tenant {
    pub fn new(name:&str) -> Self {
        Self {name:name.to_string(),vms:vec![]}
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn vms(&self) -> &[VmId] {
        &self.vms
    }
    pub(crate) fn add_vm(&mut self,vm:VmId) {
        if !self.vms.contains(&vm) {
            self.vms.push(vm);
        }
    }
    pub(crate) fn remove_vm(&mut self,vm:VmId) {
        self.vms.retain(|other| *other != vm);
    }
}

#[derive(Clone,Debug)]
pub struct VirtualMachine {
    name:String,
    tenant:TenantId,
    host:HostId,
    // flows sourced at or destined to this VM
    flows:Vec<FlowId>,
    // opaque, whatever the orchestration layer uses to reach the VM
    management_connection:Option<String>
}

impl VirtualMachine {
    pub(crate) fn new(name:&str,tenant:TenantId,host:HostId) -> Self {
        Self {name:name.to_string(),tenant,host,flows:vec![],management_connection:None}
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn tenant(&self) -> TenantId {
        self.tenant
    }
    pub fn host(&self) -> HostId {
        self.host
    }
    pub fn flows(&self) -> &[FlowId] {
        &self.flows
    }
    pub fn management_connection(&self) -> Option<&str> {
        self.management_connection.as_deref()
    }
    pub(crate) fn set_management_connection(&mut self,connection:Option<String>) {
        self.management_connection = connection;
    }
    pub(crate) fn add_flow(&mut self,flow:FlowId) {
        if !self.flows.contains(&flow) {
            self.flows.push(flow);
        }
    }
    pub(crate) fn remove_flow(&mut self,flow:FlowId) {
        self.flows.retain(|other| *other != flow);
    }
}

#[derive(Clone,Debug)]
pub struct Flow {
    name:String,
    source:VmId,
    destination:VmId,
    matching:Matching,
    contract:TrafficContract,
    // unit in milliseconds
    latency:f64,
    // None when both VMs share a host
    request:Option<RequestId>,
    // Some whenever rerouting was configured at creation time
    rerouting:Option<ReroutingStats>
}

impl Flow {
    pub(crate) fn new(name:&str,source:VmId,destination:VmId,matching:Matching,
        contract:TrafficContract,latency:f64) -> Self
    {
        Self {
            name:name.to_string(),
            source,
            destination,
            matching,
            contract,
            latency,
            request:None,
            rerouting:None
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn source(&self) -> VmId {
        self.source
    }
    pub fn destination(&self) -> VmId {
        self.destination
    }
    pub fn matching(&self) -> &Matching {
        &self.matching
    }
    pub fn contract(&self) -> &TrafficContract {
        &self.contract
    }
    pub fn latency(&self) -> f64 {
        self.latency
    }
    pub fn request(&self) -> Option<RequestId> {
        self.request
    }
    pub fn rerouting(&self) -> Option<&ReroutingStats> {
        self.rerouting.as_ref()
    }
    pub(crate) fn set_request(&mut self,request:Option<RequestId>) {
        self.request = request;
    }
    pub(crate) fn set_rerouting(&mut self,stats:Option<ReroutingStats>) {
        self.rerouting = stats;
    }
}
