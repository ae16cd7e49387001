use log::info;

use super::{require_name, single_interface, stale, TenantManager};
use crate::error::{Result, TenantError};
use crate::rerouting::{ReroutingOrchestrator, ReroutingStats};
use crate::routing::cost_view::CostView;
use crate::routing::{embed_request, CostFunction, Path, Request, Router};
use crate::store::{FlowId, RequestId, Transaction, VmId};
use crate::tenant::{Flow, Matching, TrafficContract};

// detach a flow from both VMs and give its path back on commit
pub(super) fn remove_flow(txn:&mut Transaction<'_>,flow:FlowId) -> bool {
    let Some(record) = txn.read(flow).cloned() else {return false};
    txn.update(record.source(),|vm| vm.remove_flow(flow));
    txn.update(record.destination(),|vm| vm.remove_flow(flow));
    if let Some(request) = record.request() {
        txn.detach_request(request);
    }
    txn.remove(flow);
    true
}

impl<R:Router,F:CostFunction> TenantManager<R,F> {
    // admission control for a new flow between two VMs of one tenant.
    // when no path fits and rerouting is configured, already embedded flows
    // are moved around to make room. `latency` is in milliseconds.
    pub fn create_flow(&mut self,name:&str,source:VmId,destination:VmId,matching:impl Into<Matching>,
        contract:TrafficContract,latency:f64) -> Result<FlowId>
    {
        require_name("flow",name)?;
        let matching = matching.into();
        info!("flow creation request {name:?}: {source:?} -> {destination:?}, {matching}, {contract:?}, {latency} ms");

        let (source_node,destination_node) = {
            let mut txn = self.store.begin();
            let source_vm = txn.read(source).cloned().ok_or_else(|| stale("VM",source))?;
            let destination_vm = txn.read(destination).cloned().ok_or_else(|| stale("VM",destination))?;
            if source_vm.tenant() != destination_vm.tenant() {
                return Err(TenantError::CrossTenantMismatch {
                    source_vm:source_vm.name().to_string(),
                    destination_vm:destination_vm.name().to_string()
                });
            }
            for (vm,role) in [(&source_vm,"source"),(&destination_vm,"destination")] {
                if !self.network.contains_host(vm.host()) {
                    return Err(TenantError::NetworkMismatch {what:format!("{role} VM {:?}",vm.name())});
                }
            }
            for flow in source_vm.flows() {
                let duplicate = txn.read(*flow)
                    .is_some_and(|other| other.source() == source && *other.matching() == matching);
                if duplicate {
                    return Err(TenantError::DuplicateMatching {vm:source_vm.name().to_string()});
                }
            }
            let source_node = single_interface(&self.network,source_vm.host(),"source")?;
            let destination_node = single_interface(&self.network,destination_vm.host(),"destination")?;
            if contract.rate() == 0 || contract.burst() == 0 || !(latency > 0.0) {
                return Err(TenantError::InvalidArgument {
                    reason:format!("flow {name:?} needs a positive rate, burst and latency")
                });
            }
            (source_node,destination_node)
        };

        let mut flow = Flow::new(name,source,destination,matching,contract,latency);
        if source_node == destination_node {
            info!("both VMs of flow {name:?} share a host, nothing to route");
            return Ok(self.insert_flow(flow,None));
        }

        let request = Request::new(source_node,destination_node,contract.rate_bytes_per_second(),
            contract.burst_bytes(),latency/1000.0);
        let direct = embed_request(&mut self.store,&self.network,&self.router,
            &mut CostView::base(&mut self.costs),&request,None);
        if let Some(id) = direct {
            flow.set_rerouting(self.rerouting.as_ref().map(|_| ReroutingStats::default()));
            return Ok(self.insert_flow(flow,Some(id)));
        }

        let Some(config) = self.rerouting.as_ref() else {
            info!("flow {name:?} does not fit and rerouting is off");
            return Err(TenantError::EmbeddingInfeasible {flow:name.to_string(),rerouting:None});
        };
        let outcome = ReroutingOrchestrator::new(&mut self.store,&self.network,&self.path_index,
            &self.router,&mut self.costs,config).run(&request)?;
        match outcome.request {
            Some(id) => {
                flow.set_rerouting(Some(outcome.stats));
                Ok(self.insert_flow(flow,Some(id)))
            }
            None => {
                info!("flow {name:?} does not fit after {} rerouting attempts",outcome.stats.attempts().len());
                Err(TenantError::EmbeddingInfeasible {flow:name.to_string(),rerouting:Some(outcome.stats)})
            }
        }
    }

    fn insert_flow(&mut self,mut flow:Flow,request:Option<RequestId>) -> FlowId {
        let (source,destination) = (flow.source(),flow.destination());
        flow.set_request(request);
        let mut txn = self.store.begin();
        let id = txn.insert(flow);
        if let Some(request) = request {
            txn.update(request,|record| record.set_flow(Some(id)));
        }
        txn.update(source,|vm| vm.add_flow(id));
        txn.update(destination,|vm| vm.add_flow(id));
        txn.commit().apply(&self.network,&mut self.costs);
        info!("created flow {id:?}");
        id
    }

    // unknown flows are ignored
    pub fn delete_flow(&mut self,flow:FlowId) {
        let mut txn = self.store.begin();
        if !remove_flow(&mut txn,flow) {
            return;
        }
        txn.commit().apply(&self.network,&mut self.costs);
        info!("deleted flow {flow:?}");
    }

    pub fn flow(&self,flow:FlowId) -> Option<&Flow> {
        self.store.get(flow)
    }
    // queue edges the flow is routed over, None for unrouted flows
    pub fn flow_path(&self,flow:FlowId) -> Option<&Path> {
        let request = self.flow(flow)?.request()?;
        self.store.get(request)?.path()
    }
    pub fn flow_rerouting(&self,flow:FlowId) -> Option<&ReroutingStats> {
        self.flow(flow)?.rerouting()
    }
}
