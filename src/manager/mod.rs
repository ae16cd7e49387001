// tenant, VM and flow lifecycle on top of one network.
//
// every public operation runs in its own store transaction: it either
// completes or leaves no trace. resources given back by a committed
// transaction are released from the cost function right after.

mod flows;

use log::info;
use rand::Rng;

use crate::error::{Result, TenantError};
use crate::network::{HostId, Network, NodeId};
use crate::path_index::PathIndex;
use crate::rerouting::ReroutingConfiguration;
use crate::routing::admission::TokenBucketAdmission;
use crate::routing::router::KspRouter;
use crate::routing::{CostFunction, Router};
use crate::store::{Store, TenantId, VmId};
use crate::tenant::{Tenant, VirtualMachine};

pub struct TenantManager<R:Router = KspRouter,F:CostFunction = TokenBucketAdmission> {
    network:Network,
    router:R,
    costs:F,
    store:Store,
    rerouting:Option<ReroutingConfiguration>,
    path_index:PathIndex
}

fn require_name(kind:&str,name:&str) -> Result<()> {
    if name.is_empty() {
        return Err(TenantError::InvalidArgument {reason:format!("{kind} name must not be empty")});
    }
    Ok(())
}

fn stale(kind:&str,handle:impl std::fmt::Debug) -> TenantError {
    TenantError::InvalidArgument {reason:format!("unknown {kind} {handle:?}")}
}

// the only interface of a host, hosts with several are not supported
fn single_interface(network:&Network,host:HostId,role:&'static str) -> Result<NodeId> {
    let host = network.host(host).ok_or_else(|| TenantError::NetworkMismatch {what:format!("{role} host {host:?}")})?;
    match host.interfaces() {
        [interface] => Ok(*interface),
        interfaces => Err(TenantError::UnsupportedTopology {
            role,
            host:host.name().to_string(),
            interfaces:interfaces.len()
        })
    }
}

impl<R:Router,F:CostFunction> TenantManager<R,F> {
    pub fn new(network:Network,router:R,costs:F) -> Self {
        Self {network,router,costs,store:Store::new(),rerouting:None,path_index:PathIndex::default()}
    }
    pub fn with_rerouting(network:Network,router:R,costs:F,config:ReroutingConfiguration) -> Self {
        let path_index = PathIndex::build(network.link_graph(),config.index_depth());
        Self {network,router,costs,store:Store::new(),rerouting:Some(config),path_index}
    }

    pub fn network(&self) -> &Network {
        &self.network
    }
    pub fn router(&self) -> &R {
        &self.router
    }
    pub fn costs(&self) -> &F {
        &self.costs
    }
    pub fn store(&self) -> &Store {
        &self.store
    }
    pub fn rerouting(&self) -> Option<&ReroutingConfiguration> {
        self.rerouting.as_ref()
    }
    pub fn path_index(&self) -> &PathIndex {
        &self.path_index
    }

    // the path index follows the topology
    pub fn update_topology<T>(&mut self,update:impl FnOnce(&mut Network) -> T) -> T {
        let result = update(&mut self.network);
        if let Some(config) = self.rerouting.as_ref() {
            self.path_index = PathIndex::build(self.network.link_graph(),config.index_depth());
        }
        result
    }

    pub fn create_tenant(&mut self,name:&str) -> Result<TenantId> {
        require_name("tenant",name)?;
        let mut txn = self.store.begin();
        for id in txn.store().handles::<Tenant>() {
            if txn.read(id).is_some_and(|tenant| tenant.name() == name) {
                return Err(TenantError::DuplicateName {kind:"tenant",name:name.to_string()});
            }
        }
        let id = txn.insert(Tenant::new(name));
        txn.commit().apply(&self.network,&mut self.costs);
        info!("created tenant {name:?} as {id:?}");
        Ok(id)
    }

    // placed on `host` or, without one, on a random host of the network
    pub fn create_virtual_machine(&mut self,tenant:TenantId,name:&str,host:Option<HostId>) -> Result<VmId> {
        require_name("VM",name)?;
        if let Some(host) = host {
            if !self.network.contains_host(host) {
                return Err(TenantError::NetworkMismatch {what:format!("host {host:?}")});
            }
        }
        let mut txn = self.store.begin();
        let vms = txn.read(tenant).ok_or_else(|| stale("tenant",tenant))?.vms().to_vec();
        for vm in vms {
            if txn.read(vm).is_some_and(|other| other.name() == name) {
                return Err(TenantError::DuplicateName {kind:"VM",name:name.to_string()});
            }
        }
        let host = match host {
            Some(host) => host,
            None => {
                let hosts = self.network.hosts();
                if hosts.is_empty() {
                    return Err(TenantError::NoHostsAvailable {vm:name.to_string()});
                }
                hosts[rand::rng().random_range(0..hosts.len())].id()
            }
        };
        let id = txn.insert(VirtualMachine::new(name,tenant,host));
        txn.update(tenant,|record| record.add_vm(id));
        txn.commit().apply(&self.network,&mut self.costs);
        info!("created VM {name:?} as {id:?} on {host:?}");
        Ok(id)
    }

    pub fn set_management_connection(&mut self,vm:VmId,connection:Option<String>) -> Result<()> {
        let mut txn = self.store.begin();
        if !txn.update(vm,|record| record.set_management_connection(connection)) {
            return Err(stale("VM",vm));
        }
        let _ = txn.commit();
        Ok(())
    }

    // its flows go first; unknown VMs are ignored
    pub fn delete_virtual_machine(&mut self,vm:VmId) {
        let mut txn = self.store.begin();
        let Some(record) = txn.read(vm).cloned() else {return};
        for flow in record.flows() {
            flows::remove_flow(&mut txn,*flow);
        }
        txn.update(record.tenant(),|tenant| tenant.remove_vm(vm));
        txn.remove(vm);
        txn.commit().apply(&self.network,&mut self.costs);
        info!("deleted VM {vm:?}");
    }

    // every flow of every VM, then the VMs, then the tenant itself
    pub fn delete_tenant(&mut self,tenant:TenantId) {
        let mut txn = self.store.begin();
        let Some(record) = txn.read(tenant).cloned() else {return};
        let mut tenant_flows = std::collections::BTreeSet::new();
        for vm in record.vms() {
            if let Some(vm) = txn.read(*vm) {
                tenant_flows.extend(vm.flows().iter().copied());
            }
        }
        for flow in tenant_flows {
            flows::remove_flow(&mut txn,flow);
        }
        for vm in record.vms() {
            txn.remove(*vm);
        }
        txn.remove(tenant);
        txn.commit().apply(&self.network,&mut self.costs);
        info!("deleted tenant {tenant:?}");
    }

    pub fn tenant(&self,tenant:TenantId) -> Option<&Tenant> {
        self.store.get(tenant)
    }
    pub fn tenants(&self) -> Vec<TenantId> {
        self.store.handles()
    }
    pub fn tenant_by_name(&self,name:&str) -> Option<TenantId> {
        self.tenants().into_iter().find(|id| self.tenant(*id).is_some_and(|tenant| tenant.name() == name))
    }
    pub fn virtual_machine(&self,vm:VmId) -> Option<&VirtualMachine> {
        self.store.get(vm)
    }
}
