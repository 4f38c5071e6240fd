//! Data structures and algorithms to operate on weighted undirected graphs.
//!
//! Everything the local search needs lives here: adjacency bookkeeping,
//! heap-optimized Dijkstra (single source, multiple sources, single pair),
//! Kruskal's minimum spanning tree, connected components, boundaries and
//! subgraph views. All iteration that can influence a result is ordered by
//! vertex id, so every algorithm is reproducible run to run.

use std::cmp::Reverse;
use std::collections::HashSet;

use indexmap::IndexMap;
use priority_queue::PriorityQueue;

use crate::{NodeId, Weight};

/// An undirected graph with positive integer edge weights.
///
/// Backed by a doubly-linked adjacency map: an edge (u, v, w) is stored
/// under both endpoints. Parallel edges are not representable; adding an
/// edge that already exists replaces its weight.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Graph {
	adjacency: IndexMap<NodeId, IndexMap<NodeId, Weight>>,
}

impl Graph {
	/// Adds a node without edges (no-op if present)
	pub fn add_node(&mut self, n: NodeId) {
		self.adjacency.entry(n).or_default();
	}
	/// Whether the node is present
	pub fn has_node(&self, n: NodeId) -> bool {
		self.adjacency.contains_key(&n)
	}
	/// Adds an edge, creating missing endpoints
	pub fn add_edge(&mut self, u: NodeId, v: NodeId, w: Weight) {
		self.adjacency.entry(u).or_default().insert(v, w);
		self.adjacency.entry(v).or_default().insert(u, w);
	}
	/// Removes an edge, keeping its endpoints
	pub fn remove_edge(&mut self, u: NodeId, v: NodeId) -> bool {
		let fwd = self.adjacency.get_mut(&u).map_or(false, |m| m.swap_remove(&v).is_some());
		let bwd = self.adjacency.get_mut(&v).map_or(false, |m| m.swap_remove(&u).is_some());
		fwd && bwd
	}
	/// Removes a node and all its edges
	pub fn remove_node(&mut self, n: NodeId) -> bool {
		match self.adjacency.swap_remove(&n) {
			Some(nbrs) => {
				for (v, _) in nbrs {
					if let Some(m) = self.adjacency.get_mut(&v) {
						m.swap_remove(&n);
					}
				}
				true
			}
			None => false,
		}
	}
	/// Whether the edge (u, v) is present
	pub fn contains_edge(&self, u: NodeId, v: NodeId) -> bool {
		self.weight(u, v).is_some()
	}
	/// Weight of the edge (u, v), if present
	pub fn weight(&self, u: NodeId, v: NodeId) -> Option<Weight> {
		self.adjacency.get(&u).and_then(|m| m.get(&v)).cloned()
	}
	/// Neighbors of a node with edge weights, in ascending id order
	pub fn neighbors(&self, n: NodeId) -> Vec<(NodeId, Weight)> {
		let mut nbrs: Vec<_> = self.adjacency.get(&n).map(|m| m.iter().map(|(v, w)| (*v, *w)).collect()).unwrap_or_default();
		nbrs.sort_unstable_by_key(|(v, _)| *v);
		nbrs
	}
	/// Number of edges incident to a node (0 for absent nodes)
	pub fn degree(&self, n: NodeId) -> usize {
		self.adjacency.get(&n).map_or(0, IndexMap::len)
	}
	/// All nodes, in ascending id order
	pub fn nodes(&self) -> Vec<NodeId> {
		let mut ns: Vec<_> = self.adjacency.keys().cloned().collect();
		ns.sort_unstable();
		ns
	}
	/// All nodes as a set
	pub fn node_set(&self) -> HashSet<NodeId> {
		self.adjacency.keys().cloned().collect()
	}
	/// All edges as (u, v, w) with u < v, in ascending (u, v) order
	pub fn edges(&self) -> Vec<(NodeId, NodeId, Weight)> {
		let mut es = Vec::with_capacity(self.edge_count());
		for (u, nbrs) in &self.adjacency {
			for (v, w) in nbrs {
				if u < v {
					es.push((*u, *v, *w));
				}
			}
		}
		es.sort_unstable();
		es
	}
	/// Number of nodes
	pub fn node_count(&self) -> usize {
		self.adjacency.len()
	}
	/// Number of edges
	pub fn edge_count(&self) -> usize {
		self.adjacency.values().map(IndexMap::len).sum::<usize>() / 2
	}
	/// Whether the graph has no nodes
	pub fn is_empty(&self) -> bool {
		self.adjacency.is_empty()
	}
	/// The subgraph induced by the given nodes
	pub fn subgraph(&self, keep: &HashSet<NodeId>) -> Graph {
		let mut g = Graph::default();
		for n in self.nodes() {
			if keep.contains(&n) {
				g.add_node(n);
			}
		}
		for (u, v, w) in self.edges() {
			if keep.contains(&u) && keep.contains(&v) {
				g.add_edge(u, v, w);
			}
		}
		g
	}
	/// The subgraph made of the given edges (and their endpoints), weighted as in `self`.
	///
	/// Every listed edge must exist in `self`.
	pub fn edge_subgraph(&self, edges: &[(NodeId, NodeId)]) -> Graph {
		let mut g = Graph::default();
		for (u, v) in edges {
			g.add_edge(*u, *v, self.weight(*u, *v).unwrap());
		}
		g
	}
	/// Find all edges going from one region to another
	///
	/// Arguments:
	/// - `s1`: nodes of the first region
	/// - `s2`: nodes of the second region
	///
	/// Returns: edges (u, v, w) with u in `s1` and v in `s2`, in ascending edge order
	pub fn edge_boundary(&self, s1: &HashSet<NodeId>, s2: &HashSet<NodeId>) -> Vec<(NodeId, NodeId, Weight)> {
		let mut es = Vec::new();
		for (u, v, w) in self.edges() {
			if s1.contains(&u) && s2.contains(&v) {
				es.push((u, v, w));
			} else if s1.contains(&v) && s2.contains(&u) {
				es.push((v, u, w));
			}
		}
		es
	}
	/// Detect all connected components, each reported as a node set.
	///
	/// Components are discovered from ascending start ids, so their order
	/// (and the traversal inside each) is reproducible.
	pub fn connected_components(&self) -> Vec<HashSet<NodeId>> {
		let mut components = Vec::new();
		let mut seen = HashSet::new();
		for n in self.nodes() {
			if seen.contains(&n) {
				continue;
			}
			let mut component = HashSet::new();
			let mut stack = vec![n];
			while let Some(u) = stack.pop() {
				if !component.insert(u) {
					continue;
				}
				seen.insert(u);
				for (v, _) in self.neighbors(u) {
					if !component.contains(&v) {
						stack.push(v);
					}
				}
			}
			components.push(component);
		}
		components
	}
	/// Whether the graph is connected (an empty graph is not)
	pub fn is_connected(&self) -> bool {
		!self.is_empty() && self.connected_components().len() == 1
	}
	/// Whether the graph is a tree
	pub fn is_tree(&self) -> bool {
		self.is_connected() && self.edge_count() == self.node_count() - 1
	}
	/// Minimum spanning tree (spanning forest on disconnected graphs) by Kruskal's algorithm.
	///
	/// Edges are considered in ascending (weight, u, v) order, which fixes
	/// the tree picked among equal-weight alternatives. All nodes of the
	/// graph are kept, edged or not.
	pub fn minimum_spanning_tree(&self) -> Graph {
		let nodes = self.nodes();
		let index: IndexMap<NodeId, usize> = nodes.iter().cloned().zip(0..).collect();
		let mut subgraphs = UnionFind::new(nodes.len());
		let mut mst = Graph::default();
		for n in &nodes {
			mst.add_node(*n);
		}
		let mut edges = self.edges();
		edges.sort_unstable_by_key(|(u, v, w)| (*w, *u, *v));
		for (u, v, w) in edges {
			// an edge is kept iff it connects two disjoint pre-MST parts
			if subgraphs.union(index[&u], index[&v]) {
				mst.add_edge(u, v, w);
			}
		}
		mst
	}
	/// Heap-optimized Dijkstra from one or more sources.
	///
	/// Priorities are (distance, vertex id), so of equally distant frontier
	/// vertices the lowest-numbered one settles first; a predecessor is
	/// replaced only on strict improvement. With a target, stops as soon as
	/// the target settles.
	///
	/// Returns: distance and predecessor maps; sources carry no predecessor.
	fn dijkstra(&self, sources: &[NodeId], target: Option<NodeId>) -> (IndexMap<NodeId, Weight>, IndexMap<NodeId, NodeId>) {
		let mut dists: IndexMap<NodeId, Weight> = IndexMap::new();
		let mut parents: IndexMap<NodeId, NodeId> = IndexMap::new();
		let mut q: PriorityQueue<NodeId, Reverse<(Weight, NodeId)>> = PriorityQueue::new();
		for s in sources {
			dists.insert(*s, 0);
			q.push(*s, Reverse((0, *s)));
		}
		while let Some((u, Reverse((d, _)))) = q.pop() {
			if target == Some(u) {
				break;
			}
			for (v, w) in self.neighbors(u) {
				let dv = d + w;
				if dists.get(&v).map_or(true, |best| *best > dv) {
					dists.insert(v, dv);
					parents.insert(v, u);
					q.push(v, Reverse((dv, v)));
				}
			}
		}
		(dists, parents)
	}
	/// Shortest path distances and predecessors from a single source
	pub fn single_source_dijkstra(&self, source: NodeId) -> (IndexMap<NodeId, Weight>, IndexMap<NodeId, NodeId>) {
		self.dijkstra(&[source], None)
	}
	/// Shortest path distances and predecessors from a set of sources.
	///
	/// Each reachable vertex is assigned to the nearest source (ties to the
	/// lowest vertex id); `assemble_path` recovers the source-to-vertex path.
	pub fn multi_source_dijkstra(&self, sources: &[NodeId]) -> (IndexMap<NodeId, Weight>, IndexMap<NodeId, NodeId>) {
		self.dijkstra(sources, None)
	}
	/// Find the shortest path between 2 nodes, as the visited node sequence, if any exists
	pub fn shortest_path(&self, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
		let (dists, parents) = self.dijkstra(&[from], Some(to));
		if !dists.contains_key(&to) {
			return None;
		}
		Some(assemble_path(&parents, to))
	}
}

/// Walk a Dijkstra predecessor map back from `to`, returning the path from
/// the originating source to `to`.
pub fn assemble_path(parents: &IndexMap<NodeId, NodeId>, to: NodeId) -> Vec<NodeId> {
	let mut path = vec![to];
	let mut v = to;
	while let Some(p) = parents.get(&v) {
		v = *p;
		path.push(v);
	}
	path.reverse();
	path
}

/// Disjoint-set forest with union by rank and path halving, tracking the
/// connectedness of the pre-MST in Kruskal's algorithm.
struct UnionFind {
	parent: Vec<usize>,
	rank: Vec<u8>,
}

impl UnionFind {
	fn new(n: usize) -> Self {
		Self {
			parent: (0..n).collect(),
			rank: vec![0; n],
		}
	}
	fn find(&mut self, mut x: usize) -> usize {
		while self.parent[x] != x {
			self.parent[x] = self.parent[self.parent[x]];
			x = self.parent[x];
		}
		x
	}
	/// Union the sets of `a` and `b`; false iff they already were one set
	fn union(&mut self, a: usize, b: usize) -> bool {
		let (ra, rb) = (self.find(a), self.find(b));
		if ra == rb {
			return false;
		}
		match self.rank[ra].cmp(&self.rank[rb]) {
			std::cmp::Ordering::Less => self.parent[ra] = rb,
			std::cmp::Ordering::Greater => self.parent[rb] = ra,
			std::cmp::Ordering::Equal => {
				self.parent[rb] = ra;
				self.rank[ra] += 1;
			}
		}
		true
	}
}

#[cfg(test)]
mod test {
	use super::*;

	macro_rules! graph {
		($edges:expr) => {{
			let mut g = Graph::default();
			for (u, v, w) in $edges {
				g.add_edge(u, v, w);
			}
			g
		}};
	}

	fn node_set(ns: &[NodeId]) -> HashSet<NodeId> {
		ns.iter().cloned().collect()
	}

	#[test]
	fn test_adjacency() {
		let mut g = graph!(vec![(1, 2, 3), (2, 3, 4)]);
		assert_eq!(g.node_count(), 3);
		assert_eq!(g.edge_count(), 2);
		assert_eq!(g.weight(2, 1), Some(3));
		assert_eq!(g.degree(2), 2);
		assert_eq!(g.neighbors(2), vec![(1, 3), (3, 4)]);
		g.remove_node(2);
		assert_eq!(g.node_count(), 2);
		assert_eq!(g.edge_count(), 0);
		assert!(!g.contains_edge(1, 2));
	}

	#[test]
	fn test_mst_kruskal() {
		// triangle with a cheap center: the star wins
		let g = graph!(vec![(1, 2, 10), (2, 3, 10), (1, 3, 10), (1, 4, 1), (2, 4, 1), (3, 4, 1)]);
		let mst = g.minimum_spanning_tree();
		assert_eq!(mst.edges(), vec![(1, 4, 1), (2, 4, 1), (3, 4, 1)]);
		assert!(mst.is_tree());
	}

	#[test]
	fn test_mst_keeps_all_nodes() {
		let mut g = graph!(vec![(1, 2, 1)]);
		g.add_node(7);
		let mst = g.minimum_spanning_tree();
		assert_eq!(mst.nodes(), vec![1, 2, 7]);
		assert_eq!(mst.edge_count(), 1);
	}

	#[test]
	fn test_shortest_path() {
		let g = graph!(vec![(1, 2, 1), (2, 3, 1), (3, 4, 1), (1, 4, 10)]);
		assert_eq!(g.shortest_path(1, 4), Some(vec![1, 2, 3, 4]));
		assert_eq!(g.shortest_path(1, 1), Some(vec![1]));
		let g = graph!(vec![(1, 2, 1), (3, 4, 1)]);
		assert_eq!(g.shortest_path(1, 4), None);
	}

	#[test]
	fn test_dijkstra_tie_break() {
		// two equal 1-4 paths, the one through the lower id settles first
		let g = graph!(vec![(1, 2, 1), (1, 3, 1), (2, 4, 1), (3, 4, 1)]);
		assert_eq!(g.shortest_path(1, 4), Some(vec![1, 2, 4]));
	}

	#[test]
	fn test_multi_source_dijkstra() {
		let g = graph!(vec![(1, 2, 1), (2, 3, 1), (3, 4, 1), (4, 5, 1)]);
		let (dists, parents) = g.multi_source_dijkstra(&[1, 5]);
		assert_eq!(dists[&3], 2);
		// equidistant from both sources: claimed by the lower-id one
		assert_eq!(assemble_path(&parents, 3), vec![1, 2, 3]);
		assert_eq!(assemble_path(&parents, 4), vec![5, 4]);
	}

	#[test]
	fn test_connected_components() {
		let g = graph!(vec![(1, 2, 1), (2, 3, 1), (5, 6, 1)]);
		let comps = g.connected_components();
		assert_eq!(comps, vec![node_set(&[1, 2, 3]), node_set(&[5, 6])]);
		assert!(!g.is_connected());
		assert!(graph!(vec![(1, 2, 1), (2, 3, 1)]).is_connected());
	}

	#[test]
	fn test_edge_boundary() {
		let g = graph!(vec![(1, 2, 1), (2, 3, 2), (3, 4, 3), (1, 4, 4)]);
		let es = g.edge_boundary(&node_set(&[1, 2]), &node_set(&[3, 4]));
		assert_eq!(es, vec![(1, 4, 4), (2, 3, 2)]);
	}

	#[test]
	fn test_subgraphs() {
		let g = graph!(vec![(1, 2, 1), (2, 3, 2), (3, 4, 3), (1, 4, 4)]);
		let sub = g.subgraph(&node_set(&[1, 2, 3]));
		assert_eq!(sub.edges(), vec![(1, 2, 1), (2, 3, 2)]);
		let sub = g.edge_subgraph(&[(2, 3), (3, 4)]);
		assert_eq!(sub.nodes(), vec![2, 3, 4]);
		assert_eq!(sub.edges(), vec![(2, 3, 2), (3, 4, 3)]);
	}
}
