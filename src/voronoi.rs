//! Voronoi diagrams over graphs, the auxiliary distance network, and the
//! distance network heuristic.
//!
//! Given a graph G and a set of bases A, the Voronoi diagram partitions the
//! vertices of G into |A| cells, assigning each vertex to its nearest base
//! under shortest-path distance. Alongside the base, each vertex carries its
//! distance and the shortest path from the base (the path always starts at
//! the base). The diagram is what makes key-path exchange affordable: after
//! tearing a key path out of the current tree, only the cells of the removed
//! vertices need to be repaired, and the cheapest reconnection is found by
//! scanning boundary edges.

use std::collections::HashSet;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::*;
use graph::Graph;

/// A Voronoi diagram of a graph around a set of bases.
#[derive(Clone, Debug)]
pub struct VoronoiDiagram {
	bases: IndexMap<NodeId, NodeId>,
	dists: IndexMap<NodeId, Weight>,
	paths: IndexMap<NodeId, Vec<NodeId>>,
}

impl VoronoiDiagram {
	/// Build the diagram by a single multi-source Dijkstra from all bases.
	///
	/// Bases must be given in ascending id order; of equidistant bases a
	/// vertex goes to the one settling it first, i.e. the lowest-numbered.
	pub fn new(g: &Graph, bases: &[NodeId]) -> Self {
		let (dists, parents) = g.multi_source_dijkstra(bases);
		let mut base_of = IndexMap::with_capacity(dists.len());
		let mut paths = IndexMap::with_capacity(dists.len());
		for v in dists.keys() {
			let path = graph::assemble_path(&parents, *v);
			base_of.insert(*v, path[0]);
			paths.insert(*v, path);
		}
		Self { bases: base_of, dists, paths }
	}
	/// The base of the cell containing v
	pub fn base_of(&self, v: NodeId) -> NodeId {
		self.bases[&v]
	}
	/// Distance from v to its base
	pub fn dist_of(&self, v: NodeId) -> Weight {
		self.dists[&v]
	}
	/// Shortest path from the base of v to v
	pub fn path_of(&self, v: NodeId) -> &[NodeId] {
		&self.paths[&v]
	}
	/// The cells of the diagram: a mapping from each base to the vertices it owns
	pub fn cells(&self) -> IndexMap<NodeId, HashSet<NodeId>> {
		let mut cells: IndexMap<NodeId, HashSet<NodeId>> = IndexMap::new();
		let mut vs: Vec<NodeId> = self.bases.keys().cloned().collect();
		vs.sort_unstable();
		for v in vs {
			cells.entry(self.bases[&v]).or_default().insert(v);
		}
		cells
	}
	/// Cost of the boundary edge (u, v, w): dist(u) + w + dist(v)
	pub fn boundary_cost(&self, u: NodeId, v: NodeId, w: Weight) -> Weight {
		debug_assert_ne!(self.bases[&u], self.bases[&v]);
		self.dists[&u] + w + self.dists[&v]
	}
	/// The walk connecting base(u) and base(v) through the boundary edge (u, v)
	pub fn base_path(&self, u: NodeId, v: NodeId) -> Vec<NodeId> {
		debug_assert_ne!(self.bases[&u], self.bases[&v]);
		self.paths[&u].iter().chain(self.paths[&v].iter().rev()).cloned().collect()
	}
	/// Repair the diagram after removing a key path from the tree `s`.
	///
	/// Removing the path's edges and internal vertices splits `s` in two
	/// subtrees; the cells of the removed vertices become unassigned, and
	/// each of their members is re-homed to its nearest vertex of either
	/// subtree (ties to the lowest id).
	///
	/// Arguments:
	/// - `g`: the instance graph the diagram was built on
	/// - `s`: the current tree, whose vertices are exactly the bases
	/// - `key_path`: vertex sequence with both ends crucial in `s`
	///
	/// Returns: the two cell unions partitioning the vertices of `g`,
	/// first the one around `key_path[0]`, then the one around its far end.
	pub fn repair(&mut self, g: &Graph, s: &Graph, key_path: &[NodeId]) -> (HashSet<NodeId>, HashSet<NodeId>) {
		let internal = &key_path[1..key_path.len() - 1];
		let mut split = s.clone();
		for (a, b) in key_path.iter().cloned().tuple_windows::<(_, _)>() {
			split.remove_edge(a, b);
		}
		for v in internal {
			split.remove_node(*v);
		}

		// The vertices of the two subtrees created by removing the key path
		let components = split.connected_components();
		debug_assert_eq!(components.len(), 2);
		let (mut s1, mut s2) = (HashSet::new(), HashSet::new());
		for component in components {
			if component.contains(&key_path[0]) {
				s1 = component;
			} else {
				s2 = component;
			}
		}

		// Join the Voronoi cells of each side
		let cells = self.cells();
		let union_of = |side: &HashSet<NodeId>| {
			let mut joined = HashSet::new();
			for v in side {
				joined.extend(cells[v].iter().cloned());
			}
			joined
		};
		let mut cells1 = union_of(&s1);
		let mut cells2 = union_of(&s2);

		if !internal.is_empty() {
			// Re-home every vertex whose cell was torn out with the path
			let mut unassigned: Vec<NodeId> = internal.iter().flat_map(|v| cells[v].iter().cloned()).collect();
			unassigned.sort_unstable();
			debug_assert_eq!(cells1.len() + cells2.len() + unassigned.len(), g.node_count());

			let mut candidates: Vec<NodeId> = s1.iter().chain(s2.iter()).cloned().collect();
			candidates.sort_unstable();

			for u in unassigned {
				let (dists, parents) = g.single_source_dijkstra(u);
				let mut nearest: Option<(Weight, NodeId)> = None;
				for v in &candidates {
					if let Some(d) = dists.get(v) {
						if nearest.map_or(true, |best| (*d, *v) < best) {
							nearest = Some((*d, *v));
						}
					}
				}
				let (d, base) = nearest.unwrap();
				// a stored path starts at the base, so the u-to-base walk flips
				let mut path = graph::assemble_path(&parents, base);
				path.reverse();
				self.bases.insert(u, base);
				self.dists.insert(u, d);
				self.paths.insert(u, path);
				if s1.contains(&base) {
					cells1.insert(u);
				} else {
					cells2.insert(u);
				}
			}
		}

		(cells1, cells2)
	}
}

/// The auxiliary distance network of a graph w.r.t. a Voronoi diagram.
///
/// Its nodes are the bases; two bases are linked iff some boundary edge
/// joins their cells, and the link weight is the smallest boundary cost
/// between them. The boundary edge realizing each link is kept so that a
/// link can be expanded back into a walk in the original graph.
pub struct AuxiliaryGraph {
	pub graph: Graph,
	boundary: IndexMap<(NodeId, NodeId), (NodeId, NodeId)>,
}

impl AuxiliaryGraph {
	pub fn new(g: &Graph, voronoi: &VoronoiDiagram) -> Self {
		let mut cheapest: IndexMap<(NodeId, NodeId), (Weight, (NodeId, NodeId))> = IndexMap::new();
		for (u, v, w) in g.edges() {
			let (base_u, base_v) = (voronoi.base_of(u), voronoi.base_of(v));
			// skip non-boundary edges
			if base_u == base_v {
				continue;
			}
			let key = if base_u < base_v { (base_u, base_v) } else { (base_v, base_u) };
			let cost = voronoi.boundary_cost(u, v, w);
			let entry = cheapest.entry(key).or_insert((cost, (u, v)));
			if cost < entry.0 {
				*entry = (cost, (u, v));
			}
		}
		let mut graph = Graph::default();
		let mut boundary = IndexMap::new();
		for ((a, b), (cost, edge)) in cheapest {
			graph.add_edge(a, b, cost);
			boundary.insert((a, b), edge);
		}
		Self { graph, boundary }
	}
	/// The boundary edge realizing the link between bases a and b
	pub fn boundary_edge(&self, a: NodeId, b: NodeId) -> (NodeId, NodeId) {
		self.boundary[&if a < b { (a, b) } else { (b, a) }]
	}
}

/// Distance network heuristic: a 2-approximate constructive Steiner tree.
///
/// Builds the Voronoi diagram around `bases`, takes the MST of the
/// auxiliary network, and expands every MST link back into a walk of `g`
/// through its boundary edge. The union of the walks is connected and
/// spans all bases; the caller typically prunes it to the terminals.
pub fn distance_network_heuristic(g: &Graph, bases: &HashSet<NodeId>) -> Graph {
	let mut bases: Vec<NodeId> = bases.iter().cloned().collect();
	bases.sort_unstable();
	if bases.len() < 2 {
		let mut lone = Graph::default();
		for b in bases {
			lone.add_node(b);
		}
		return lone;
	}
	let voronoi = VoronoiDiagram::new(g, &bases);
	let aux = AuxiliaryGraph::new(g, &voronoi);
	let mst = aux.graph.minimum_spanning_tree();
	let mut edges = Vec::new();
	for (a, b, _) in mst.edges() {
		let (u, v) = aux.boundary_edge(a, b);
		for pair in voronoi.base_path(u, v).into_iter().tuple_windows::<(_, _)>() {
			edges.push(pair);
		}
	}
	g.edge_subgraph(&edges)
}
