use std::collections::BTreeSet;

use super::SortFlows;
use crate::dsa::graph::HashSet;
use crate::error::Result;
use crate::network::{EdgeId, Network};
use crate::path_index::PathIndex;
use crate::routing::Request;
use crate::store::{FlowId, Store};

// order in which candidates are tried: decreasing key, increasing flow id
pub fn rank_candidates(network:&Network,store:&Store,index:&PathIndex,request:&Request,
    candidates:&BTreeSet<FlowId>,sort:SortFlows) -> Result<Vec<FlowId>>
{
    if sort == SortFlows::NoSort {
        return Ok(candidates.iter().copied().collect());
    }
    let shortest_links:HashSet<EdgeId> = match sort {
        SortFlows::CommonEdges => index.paths_up_to(request.source(),request.destination(),1)?
            .into_iter()
            .flat_map(|path| path.edges().iter().copied())
            .collect(),
        _ => HashSet::default()
    };

    let key = |flow:FlowId| -> f64 {
        let Some(record) = store.get(flow) else {return 0.0};
        match sort {
            SortFlows::NoSort => 0.0,
            SortFlows::Rate => record.contract().rate() as f64,
            SortFlows::Burst => record.contract().burst() as f64,
            SortFlows::Delay => record.latency(),
            SortFlows::CommonEdges => {
                let Some(path) = record.request().and_then(|id| store.get(id)).and_then(|r| r.path()) else {
                    return 0.0;
                };
                path.edges().iter()
                    .filter_map(|queue_edge| network.link_edge_of(*queue_edge))
                    .filter(|link_edge| shortest_links.contains(link_edge))
                    .count() as f64
            }
        }
    };
    let mut keyed:Vec<(f64,FlowId)> = candidates.iter().map(|flow| (key(*flow),*flow)).collect();
    keyed.sort_by(|(a_key,a),(b_key,b)| b_key.total_cmp(a_key).then_with(|| a.cmp(b)));
    Ok(keyed.into_iter().map(|(_,flow)| flow).collect())
}
