use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::graph::{DirectedGraph, HashSet};

// yen's k shortest simple paths, produced lazily in non-decreasing cost order.
// a path is the list of edge ids from start to end.

struct Candidate {
    cost:f64,
    // insertion order, keeps equal-cost candidates in discovery order
    sequence:usize,
    path:Vec<usize>
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // reversed, BinaryHeap pops the cheapest first
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.total_cmp(&self.cost)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

pub struct YenPaths<'g,W> {
    graph:&'g DirectedGraph,
    start:usize,
    end:usize,
    weight:W,
    accepted:Vec<Vec<usize>>,
    candidates:BinaryHeap<Candidate>,
    seen:std::collections::HashSet<Vec<usize>>,
    sequence:usize,
    started:bool,
    exhausted:bool
}

impl<'g,W> YenPaths<'g,W>
    where W:FnMut(usize) -> Option<f64>
{
    // weight semantics are those of DirectedGraph::shortest_path
    pub fn new(graph:&'g DirectedGraph,start:usize,end:usize,weight:W) -> Self {
        Self {
            graph,
            start,
            end,
            weight,
            accepted:vec![],
            candidates:BinaryHeap::new(),
            seen:std::collections::HashSet::new(),
            sequence:0,
            started:false,
            exhausted:false
        }
    }

    fn push_candidate(&mut self,cost:f64,path:Vec<usize>) {
        if !self.seen.insert(path.clone()) {
            return;
        }
        self.sequence += 1;
        self.candidates.push(Candidate {cost,sequence:self.sequence,path});
    }

    // deviate from the last accepted path at every one of its nodes
    fn expand_last(&mut self) {
        let Some(last) = self.accepted.last().cloned() else {return};
        let Some(last_nodes) = self.graph.path_nodes(&last) else {return};
        let graph = self.graph;

        for i in 0..last.len() {
            let spur_node = last_nodes[i];
            let root = &last[..i];

            let mut blocked_edges:HashSet<usize> = HashSet::default();
            for path in self.accepted.iter() {
                if path.len() > i && path[..i] == *root {
                    blocked_edges.insert(path[i]);
                }
            }
            // root nodes except the spur node itself, keeps the result simple
            let blocked_nodes:HashSet<usize> = last_nodes[..i].iter().copied().collect();

            let weight = &mut self.weight;
            let Some(root_cost) = root.iter().map(|edge| weight(*edge)).sum::<Option<f64>>()
                else {continue};
            let spur = graph.shortest_path(spur_node,self.end,|edge| {
                if blocked_edges.contains(&edge) {
                    return None;
                }
                let (_,to) = graph.endpoints(edge)?;
                if blocked_nodes.contains(&to) {
                    return None;
                }
                weight(edge)
            });
            if let Some((spur_cost,spur_path)) = spur {
                let mut total = Vec::with_capacity(root.len() + spur_path.len());
                total.extend_from_slice(root);
                total.extend(spur_path);
                self.push_candidate(root_cost + spur_cost,total);
            }
        }
    }
}

impl<W> Iterator for YenPaths<'_,W>
    where W:FnMut(usize) -> Option<f64>
{
    type Item = (f64,Vec<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        if !self.started {
            self.started = true;
            let Some((cost,path)) = self.graph.shortest_path(self.start,self.end,&mut self.weight) else {
                self.exhausted = true;
                return None;
            };
            self.seen.insert(path.clone());
            self.accepted.push(path.clone());
            return Some((cost,path));
        }

        self.expand_last();
        let Some(Candidate {cost,path,..}) = self.candidates.pop() else {
            self.exhausted = true;
            return None;
        };
        self.accepted.push(path.clone());
        Some((cost,path))
    }
}
