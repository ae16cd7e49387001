// precomputed shortest path tiers over the link graph.
//
// for every ordered node pair the simple paths are grouped by hop count:
// tier 0 holds every path of minimal length, tier 1 every path of the next
// length that exists, and so on. only as many tiers as asked for are kept.

use log::debug;

use crate::dsa::graph::{DirectedGraph, HashMap};
use crate::dsa::ksp::YenPaths;
use crate::error::{Result, TenantError};
use crate::network::NodeId;
use crate::routing::Path;

#[derive(Clone,Debug,Default)]
pub struct PathTierTable {
    // destination -> tiers, a pair without any path has no tiers
    tiers:HashMap<NodeId,Vec<Vec<Path>>>
}

impl PathTierTable {
    pub fn destinations(&self) -> Vec<NodeId> {
        let mut destinations:Vec<NodeId> = self.tiers.keys().copied().collect();
        destinations.sort_unstable();
        destinations
    }
    pub fn tiers(&self,destination:NodeId) -> Option<&[Vec<Path>]> {
        self.tiers.get(&destination).map(|tiers| tiers.as_slice())
    }
}

#[derive(Clone,Debug,Default)]
pub struct PathIndex {
    depth:usize,
    // source -> table
    tables:HashMap<NodeId,PathTierTable>
}

fn build_tiers(graph:&DirectedGraph,source:NodeId,destination:NodeId,depth:usize) -> Vec<Vec<Path>> {
    let mut tiers:Vec<Vec<Path>> = vec![];
    let mut tier_len = None;
    for (_,edges) in YenPaths::new(graph,source,destination,|_| Some(1.0)) {
        if tier_len != Some(edges.len()) {
            if tiers.len() == depth {
                break;
            }
            tier_len = Some(edges.len());
            tiers.push(vec![]);
        }
        if let Some(tier) = tiers.last_mut() {
            tier.push(Path::new(edges));
        }
    }
    tiers
}

impl PathIndex {
    // depth 0 indexes nothing
    pub fn build(graph:&DirectedGraph,depth:usize) -> Self {
        let mut tables = HashMap::default();
        if depth > 0 {
            let nodes = graph.nodes();
            for source in nodes.iter() {
                let mut table = PathTierTable::default();
                for destination in nodes.iter().filter(|node| *node != source) {
                    table.tiers.insert(*destination,build_tiers(graph,*source,*destination,depth));
                }
                tables.insert(*source,table);
            }
        }
        debug!("indexed {} sources with {depth} shortest path tiers",tables.len());
        Self {depth,tables}
    }
    pub fn depth(&self) -> usize {
        self.depth
    }
    pub fn table(&self,source:NodeId) -> Option<&PathTierTable> {
        self.tables.get(&source)
    }
    fn pair(&self,source:NodeId,destination:NodeId) -> Result<&[Vec<Path>]> {
        self.table(source)
            .and_then(|table| table.tiers(destination))
            .ok_or(TenantError::UnknownIndexQuery {from_node:source,to_node:destination,level:0})
    }
    // number of populated tiers, 0 for an unreachable pair
    pub fn tier_count(&self,source:NodeId,destination:NodeId) -> Result<usize> {
        Ok(self.pair(source,destination)?.len())
    }
    pub fn tiers(&self,source:NodeId,destination:NodeId,level:usize) -> Result<&[Path]> {
        self.pair(source,destination)
            .map_err(|_| TenantError::UnknownIndexQuery {from_node:source,to_node:destination,level})?
            .get(level)
            .map(|tier| tier.as_slice())
            .ok_or(TenantError::UnknownIndexQuery {from_node:source,to_node:destination,level})
    }
    // every path of the first `levels` tiers, shortest first.
    // tiers beyond the populated ones contribute nothing.
    pub fn paths_up_to(&self,source:NodeId,destination:NodeId,levels:usize) -> Result<Vec<&Path>> {
        let tiers = self.pair(source,destination)?;
        Ok(tiers.iter().take(levels).flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::PathIndex;
    use crate::dsa::graph::DirectedGraph;
    use crate::error::TenantError;

    // 0 -> 1 -> 3, 0 -> 2 -> 3, 0 -> 4 -> 5 -> 3, 0 -> 3 -> 6
    fn graph() -> DirectedGraph {
        let edges:[(usize,usize,usize);8] = [(10,0,1),(11,1,3),(12,0,2),(13,2,3),(14,0,4),(15,4,5),(16,5,3),(17,3,6)];
        edges.into_iter().collect()
    }

    #[test]
    fn test_tiers_group_by_hop_count() {
        let index = PathIndex::build(&graph(),2);
        assert_eq!(index.tier_count(0,3).unwrap(),2);
        let first = index.tiers(0,3,0).unwrap();
        assert_eq!(first.len(),2);
        assert!(first.iter().all(|path| path.len() == 2));
        let second = index.tiers(0,3,1).unwrap();
        assert_eq!(second.len(),1);
        assert_eq!(second[0].edges(),&[14,15,16]);
        assert_eq!(index.paths_up_to(0,3,5).unwrap().len(),3);
        assert_eq!(index.paths_up_to(0,3,1).unwrap().len(),2);
        assert_eq!(index.tiers(0,6,0).unwrap().len(),2);
    }

    #[test]
    fn test_depth_limits_tiers() {
        let index = PathIndex::build(&graph(),1);
        assert_eq!(index.tier_count(0,3).unwrap(),1);
        assert!(matches!(index.tiers(0,3,1),Err(TenantError::UnknownIndexQuery {level:1,..})));
        assert!(PathIndex::build(&graph(),0).tier_count(0,3).is_err());
    }

    #[test]
    fn test_unreachable_and_unknown_pairs() {
        let index = PathIndex::build(&graph(),2);
        // reachable in the other direction only
        assert_eq!(index.tier_count(3,0).unwrap(),0);
        assert!(index.paths_up_to(3,0,2).unwrap().is_empty());
        assert!(index.tiers(3,0,0).is_err());
        assert!(matches!(index.tier_count(0,99),Err(TenantError::UnknownIndexQuery {from_node:0,to_node:99,..})));
        assert!(index.tier_count(0,0).is_err());
        assert_eq!(index.table(0).unwrap().destinations(),vec![1,2,3,4,5,6]);
    }
}
