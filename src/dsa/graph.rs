use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

pub(crate) type HashMap<K,V> = std::collections::hash_map::HashMap<K,V,nohash::BuildNoHashHasher<usize>>;
pub(crate) type HashSet<K> = std::collections::hash_set::HashSet<K,nohash::BuildNoHashHasher<usize>>;

// an edge-identified multigraph: two nodes may be joined by several
// parallel edges (one per priority queue of a link), so every traversal
// works on edge ids rather than on node pairs

#[derive(Clone)]
struct Neighbours {
    // edge ids leaving / entering the node
    to:HashSet<usize>,
    from:HashSet<usize>,
}

impl Neighbours {
    fn new() -> Self {
        Self {
            to:HashSet::with_hasher(nohash::BuildNoHashHasher::default()),
            from:HashSet::with_hasher(nohash::BuildNoHashHasher::default())
        }
    }
    fn shrink_to_fit(&mut self) {
        self.to.shrink_to_fit();
        self.from.shrink_to_fit();
    }
}

impl Default for Neighbours {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
struct EdgeEnds {
    start:usize,
    end:usize
}

#[derive(Clone)]
struct Visited {
    visited_nodes:HashSet<usize>,
    unvisited_nodes:HashSet<usize>
}

impl Visited {
    fn with_capacity(capacity:usize) -> Self {
        Self {visited_nodes:HashSet::with_capacity_and_hasher(capacity,nohash::BuildNoHashHasher::default()),
            unvisited_nodes:HashSet::with_capacity_and_hasher(capacity,nohash::BuildNoHashHasher::default())
        }
    }
    fn push_node(&mut self,node:&usize) {
        if self.visited_nodes.contains(node) {
            debug_assert!(!self.unvisited_nodes.contains(node));
            return;
        }
        self.unvisited_nodes.insert(*node);
    }
    fn visit(&mut self,node:&usize) {
        // only nodes that are known and not yet visited move over
        if !self.unvisited_nodes.remove(node) {
            return
        };
        self.visited_nodes.insert(*node);
    }
    //None: unknown node
    //Some(false): known, not visited yet
    //Some(true): known and visited
    fn is_visited(&self,node:&usize) -> Option<bool> {
        if self.unvisited_nodes.contains(node) {
            debug_assert!(!self.visited_nodes.contains(node));
            return Some(false);
        }
        if self.visited_nodes.contains(node) {
            return Some(true)
        }
        None
    }
}

impl<A:Borrow<usize>> FromIterator<A> for Visited {
    fn from_iter<T: IntoIterator<Item = A>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let size = match iter.size_hint() {
            (_,Some(higher)) => {higher},
            (lower,None) => {lower}
        };
        let mut v = Self::with_capacity(size);
        for elem in iter {
            v.push_node(elem.borrow());
        }
        v
    }
}

// min-heap entry for dijkstra, ties broken on the node id so that
// the settle order never depends on hash iteration
#[derive(Clone,Copy,Debug)]
struct Frontier {
    cost:f64,
    node:usize
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

#[derive(Clone,Default)]
pub struct DirectedGraph {
    nodes:HashMap<usize,Neighbours>,
    edges:HashMap<usize,EdgeEnds>
}

impl DirectedGraph {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
        self.edges.shrink_to_fit();
        for neighbours in self.nodes.values_mut() {
            neighbours.shrink_to_fit();
        }
    }
    pub fn nodes_len(&self) -> usize {
        self.nodes.len()
    }
    pub fn edges_len(&self) -> usize {
        self.edges.len()
    }
    pub fn contains_node(&self,node:usize) -> bool {
        self.nodes.contains_key(&node)
    }
    // sorted, so callers iterating over every node get a stable order
    pub fn nodes(&self) -> Vec<usize> {
        let mut nodes:Vec<usize> = self.nodes.keys().copied().collect();
        nodes.sort_unstable();
        nodes
    }
    pub fn endpoints(&self,edge:usize) -> Option<(usize,usize)> {
        self.edges.get(&edge).map(|ends| (ends.start,ends.end))
    }
    pub fn out_edges(&self,node:usize) -> Vec<usize> {
        let Some(neighbours) = self.nodes.get(&node) else {return vec![]};
        let mut edges:Vec<usize> = neighbours.to.iter().copied().collect();
        edges.sort_unstable();
        edges
    }
    fn assert_edge(&self,edge:usize) {
        let ends = self.edges.get(&edge).unwrap_or_else(|| panic!("Edge {edge} non-existent"));
        let start_node = self.nodes.get(&ends.start).unwrap_or_else(|| panic!("Start node {} non-existent",ends.start));
        let end_node = self.nodes.get(&ends.end).unwrap_or_else(|| panic!("End node {} non-existent",ends.end));
        if !start_node.to.contains(&edge) {
            panic!("Edge {edge} defined, but is not in {}'s to list",ends.start);
        }
        if !end_node.from.contains(&edge) {
            panic!("Edge {edge} defined, but is not in {}'s from list",ends.end);
        }
    }
    pub fn push_node(&mut self,node:usize) {
        // insert a node without adding edges
        self.nodes.entry(node).or_default();
    }
    // false if the edge id is already taken, the graph is left untouched then
    pub fn push_edge(&mut self,edge:usize,start:usize,end:usize) -> bool {
        if self.edges.contains_key(&edge) {
            return false;
        }
        self.nodes.entry(start).or_default().to.insert(edge);
        self.nodes.entry(end).or_default().from.insert(edge);
        self.edges.insert(edge,EdgeEnds {start,end});

        #[cfg(debug_assertions)]
        self.assert_edge(edge);
        true
    }
    // nodes visited by a path of edges, starting node included
    pub fn path_nodes(&self,path:&[usize]) -> Option<Vec<usize>> {
        let first = *path.first()?;
        let mut nodes = Vec::with_capacity(path.len() + 1);
        nodes.push(self.edges.get(&first)?.start);
        for edge in path {
            let ends = self.edges.get(edge)?;
            debug_assert_eq!(nodes.last(),Some(&ends.start));
            nodes.push(ends.end);
        }
        Some(nodes)
    }

    // dijkstra from start to end.
    // weight returns None for edges that may not be used, weights must be >= 0.
    // a path is never empty, so start == end yields None
    pub fn shortest_path<W>(&self,start:usize,end:usize,mut weight:W) -> Option<(f64,Vec<usize>)>
        where W:FnMut(usize) -> Option<f64>
    {
        if start == end || !self.contains_node(start) || !self.contains_node(end) {
            return None;
        }
        let mut visited:Visited = self.nodes.keys().collect();
        let mut distance:HashMap<usize,f64> = HashMap::with_capacity_and_hasher(
            self.nodes_len(), nohash::BuildNoHashHasher::default()
        );
        // node -> edge it was last relaxed through
        let mut via:HashMap<usize,usize> = HashMap::with_capacity_and_hasher(
            self.nodes_len(), nohash::BuildNoHashHasher::default()
        );
        let mut heap = BinaryHeap::with_capacity(self.nodes_len());
        distance.insert(start,0.0);
        heap.push(Frontier {cost:0.0,node:start});

        while let Some(Frontier {cost,node}) = heap.pop() {
            if visited.is_visited(&node)? {
                continue;
            }
            visited.visit(&node);
            if node == end {
                break;
            }
            for edge in self.out_edges(node) {
                let Some(w) = weight(edge) else {continue};
                debug_assert!(w >= 0.0, "negative weight {w} on edge {edge}");
                let next = self.edges.get(&edge)?.end;
                if visited.is_visited(&next)? {
                    continue;
                }
                let candidate = cost + w;
                if distance.get(&next).is_none_or(|known| candidate < *known) {
                    distance.insert(next,candidate);
                    via.insert(next,edge);
                    heap.push(Frontier {cost:candidate,node:next});
                }
            }
        }

        let total = *distance.get(&end)?;
        let mut path = Vec::new();
        let mut current = end;
        while current != start {
            let edge = *via.get(&current)?;
            path.push(edge);
            current = self.edges.get(&edge)?.start;
        }
        path.reverse();
        Some((total,path))
    }
}

impl<A:Borrow<(usize,usize,usize)>> FromIterator<A> for DirectedGraph {
    // (edge, start, end) triples
    fn from_iter<T: IntoIterator<Item = A>>(iter: T) -> Self {
        let mut new_graph = Self::new();
        for triple in iter {
            let (edge,start,end) = triple.borrow();
            new_graph.push_edge(*edge,*start,*end);
        }
        new_graph.shrink_to_fit();
        new_graph
    }
}

#[cfg(test)]
mod tests{
    use rand::{Rng, RngCore};

    use super::DirectedGraph;

    #[test]
    fn test_chain_shortest_path() {
        let mut nodes:Vec<usize> = vec![];
        let mut rng = rand::rng();
        while nodes.len() < 16 {
            let node = rng.next_u32() as usize;
            if !nodes.contains(&node) {
                nodes.push(node);
            }
        }
        let edges:Vec<(usize,usize,usize)> = (0..nodes.len() - 1)
            .map(|i| (i,nodes[i],nodes[i+1]))
            .collect();
        let graph:DirectedGraph = edges.iter().collect();
        let (cost,path) = graph.shortest_path(nodes[0],nodes[15],|_| Some(1.0)).unwrap();
        assert_eq!(cost,15.0);
        assert_eq!(path,(0..15).collect::<Vec<usize>>());
        assert_eq!(graph.path_nodes(&path).unwrap(),nodes);
        // edges only go forward
        assert!(graph.shortest_path(nodes[15],nodes[0],|_| Some(1.0)).is_none());
    }

    #[test]
    fn test_parallel_edges_and_exclusion() {
        // 0 -> 1 twice (edges 10 and 11), 1 -> 2 once, 0 -> 2 directly
        let edges:[(usize,usize,usize);4] = [(10,0,1),(11,0,1),(12,1,2),(13,0,2)];
        let graph:DirectedGraph = edges.into_iter().collect();
        assert_eq!(graph.edges_len(),4);
        assert_eq!(graph.out_edges(0),vec![10,11,13]);

        let weight = |edge:usize| match edge {
            10 => Some(3.0),
            11 => Some(1.0),
            12 => Some(1.0),
            _ => Some(5.0)
        };
        let (cost,path) = graph.shortest_path(0,2,weight).unwrap();
        assert_eq!(cost,2.0);
        assert_eq!(path,vec![11,12]);

        // hiding the middle edge forces the direct one
        let (cost,path) = graph.shortest_path(0,2,|e| if e == 12 {None} else {weight(e)}).unwrap();
        assert_eq!(cost,5.0);
        assert_eq!(path,vec![13]);
    }

    #[test]
    fn test_duplicate_edge_rejected() {
        let mut graph = DirectedGraph::new();
        assert!(graph.push_edge(1,0,1));
        assert!(!graph.push_edge(1,1,0));
        assert_eq!(graph.endpoints(1),Some((0,1)));
        assert!(graph.shortest_path(0,0,|_| Some(1.0)).is_none());
    }

    #[test]
    fn test_random_graph_costs_are_optimal() {
        let mut rng = rand::rng();
        let node_len:usize = rng.random_range(5..30);
        let mut graph = DirectedGraph::new();
        let mut edge_id = 0;
        for start in 0..node_len {
            graph.push_node(start);
            for end in 0..node_len {
                if start != end && rng.random_bool(0.3) {
                    graph.push_edge(edge_id,start,end);
                    edge_id += 1;
                }
            }
        }
        // with unit weights dijkstra agrees with a plain bfs hop count
        for target in 1..node_len {
            let mut hops = vec![usize::MAX;node_len];
            hops[0] = 0;
            let mut queue = std::collections::VecDeque::from([0usize]);
            while let Some(node) = queue.pop_front() {
                for edge in graph.out_edges(node) {
                    let (_,next) = graph.endpoints(edge).unwrap();
                    if hops[next] == usize::MAX {
                        hops[next] = hops[node] + 1;
                        queue.push_back(next);
                    }
                }
            }
            match graph.shortest_path(0,target,|_| Some(1.0)) {
                Some((cost,path)) => {
                    assert_eq!(cost as usize,hops[target]);
                    assert_eq!(path.len(),hops[target]);
                }
                None => assert_eq!(hops[target],usize::MAX)
            }
        }
    }
}
