//! Local-search neighbourhoods over a Steiner tree.
//!
//! Four moves, each taking the instance graph, the current solution and the
//! terminal set, and returning a solution at most as heavy:
//! - insertion of a single Steiner vertex,
//! - elimination of a single Steiner vertex,
//! - exchange of a key path against a cheaper reconnection,
//! - elimination of a key vertex via the distance network heuristic.
//!
//! With `early_stop` a move returns at the first improvement found;
//! otherwise it scans its whole neighbourhood, constructing candidates from
//! the solution it entered with while chaining the acceptance threshold
//! through the best candidate so far, and returns the last one accepted.
//! All scans run in ascending vertex id order.

use std::collections::HashSet;

use itertools::Itertools;

use crate::*;
use graph::Graph;
use tree::{crucial_vertices, graph_weight, key_vertices, prune_tree};
use voronoi::{distance_network_heuristic, VoronoiDiagram};

/// Try to insert the edge e = (u, v) with weight `w_e` into the tree `s`.
///
/// The heaviest edge on the tree path between u and v (the first such edge
/// walking from u, on ties) is replaced by e iff it is strictly heavier.
/// Tree-ness is preserved and the weight never increases.
pub fn try_insert_edge(s: &mut Graph, e: (NodeId, NodeId), w_e: Weight) {
	let path = s.shortest_path(e.0, e.1).unwrap();
	let mut heaviest = (path[0], path[1]);
	let mut heaviest_w = s.weight(path[0], path[1]).unwrap();
	for (a, b) in path.iter().cloned().tuple_windows::<(_, _)>().skip(1) {
		let w = s.weight(a, b).unwrap();
		if w > heaviest_w {
			heaviest = (a, b);
			heaviest_w = w;
		}
	}
	if heaviest_w > w_e {
		s.remove_edge(heaviest.0, heaviest.1);
		s.add_edge(e.0, e.1, w_e);
	}
}

/// Look for a vertex v outside the tree such that MST(G[V_S ∪ v]) is cheaper.
///
/// For each candidate, the edges between v and the tree are added one at a
/// time: the first connects v, every further one goes through
/// `try_insert_edge` so the intermediate stays the MST of the grown edge set.
pub fn steiner_vertices_insertion(g: &Graph, s: Graph, terminals: &HashSet<NodeId>, early_stop: bool) -> Graph {
	let s_nodes = s.node_set();
	let available: Vec<NodeId> = g.nodes().into_iter().filter(|n| !s_nodes.contains(n)).collect();
	if available.is_empty() {
		return s;
	}
	let original = s.clone();
	let mut accepted = s;
	let mut accepted_weight = graph_weight(&accepted);
	for v in available {
		let connecting: Vec<(NodeId, Weight)> = g.neighbors(v).into_iter().filter(|(u, _)| s_nodes.contains(u)).collect();
		if connecting.is_empty() {
			continue;
		}
		let mut candidate = original.clone();
		for (i, (u, w)) in connecting.into_iter().enumerate() {
			if i == 0 {
				candidate.add_edge(v, u, w);
			} else {
				try_insert_edge(&mut candidate, (v, u), w);
			}
		}
		let candidate_weight = graph_weight(&candidate);
		if candidate_weight < accepted_weight {
			log::trace!("inserting {} drops the weight to {}", v, candidate_weight);
			accepted = candidate;
			accepted_weight = candidate_weight;
			if early_stop {
				break;
			}
		}
	}
	prune_tree(accepted, terminals)
}

/// Look for a vertex v in V_S \ T such that MST(G[V_S \ v]) is cheaper.
///
/// Each removal is evaluated by rerunning Kruskal's algorithm on the
/// induced subgraph; removals that disconnect it are skipped.
pub fn steiner_vertices_elimination(g: &Graph, s: Graph, terminals: &HashSet<NodeId>, early_stop: bool) -> Graph {
	let available: Vec<NodeId> = s.nodes().into_iter().filter(|n| !terminals.contains(n)).collect();
	if available.is_empty() {
		return s;
	}
	let original_nodes = s.node_set();
	let mut accepted = s;
	let mut accepted_weight = graph_weight(&accepted);
	for v in available {
		let mut keep = original_nodes.clone();
		keep.remove(&v);
		let induced = g.subgraph(&keep);
		if !induced.is_connected() {
			continue;
		}
		let candidate = induced.minimum_spanning_tree();
		let candidate_weight = graph_weight(&candidate);
		if candidate_weight < accepted_weight {
			log::trace!("eliminating {} drops the weight to {}", v, candidate_weight);
			if early_stop {
				return prune_tree(candidate, terminals);
			}
			accepted = candidate;
			accepted_weight = candidate_weight;
		}
	}
	prune_tree(accepted, terminals)
}

/// Find all the key paths of the tree `s` w.r.t. its crucial vertices.
///
/// A key path connects two crucial vertices and passes through none. Since
/// every leaf of a pruned tree is crucial, peeling pendant chains off a
/// working copy, leaf by leaf until a crucial vertex is hit, enumerates
/// paths whose edge sets partition the edges of `s`.
pub fn find_key_paths(s: &Graph, crucial: &HashSet<NodeId>) -> Vec<Vec<NodeId>> {
	let mut key_paths = Vec::new();
	let mut t = s.clone();
	'peel: while t.edge_count() > 0 {
		let leaves: Vec<NodeId> = t.nodes().into_iter().filter(|n| t.degree(*n) == 1).collect();
		debug_assert!(leaves.iter().all(|leaf| crucial.contains(leaf)));
		for leaf in leaves {
			let mut v = leaf;
			let mut path = vec![v];
			loop {
				let neighbors = t.neighbors(v);
				if neighbors.is_empty() {
					// the single last vertex of the tree
					break 'peel;
				}
				let next = neighbors[0].0;
				t.remove_node(v);
				path.push(next);
				v = next;
				if crucial.contains(&next) {
					break;
				}
			}
			key_paths.push(path);
		}
	}
	key_paths
}

/// Replace `old_path` of the tree `s` by `new_path`, weighted as in `g`.
pub fn replace_path(g: &Graph, s: &Graph, old_path: &[NodeId], new_path: &[NodeId]) -> Graph {
	let mut next = s.clone();
	for (a, b) in old_path.iter().cloned().tuple_windows::<(_, _)>() {
		next.remove_edge(a, b);
	}
	for v in &old_path[1..old_path.len() - 1] {
		next.remove_node(*v);
	}
	for (a, b) in new_path.iter().cloned().tuple_windows::<(_, _)>() {
		next.add_edge(a, b, g.weight(a, b).unwrap());
	}
	next
}

/// Look for a key path whose removal admits a cheaper reconnection of the
/// two remaining subtrees.
///
/// One Voronoi diagram is built per call, with all tree vertices as bases;
/// per candidate path a copy of it is repaired, and the reconnection is the
/// cheapest boundary edge between the two repaired sides.
pub fn key_path_exchange(g: &Graph, s: Graph, terminals: &HashSet<NodeId>, early_stop: bool) -> Graph {
	let crucial = crucial_vertices(&s, terminals);
	let key_paths = find_key_paths(&s, &crucial);
	if key_paths.is_empty() {
		return s;
	}
	let voronoi = VoronoiDiagram::new(g, &s.nodes());
	let mut improvement = 0;
	let mut path_to_del: Option<&Vec<NodeId>> = None;
	let mut path_to_add: Option<Vec<NodeId>> = None;
	for key_path in &key_paths {
		let key_path_weight: Weight = key_path.iter().cloned().tuple_windows::<(_, _)>().map(|(a, b)| g.weight(a, b).unwrap()).sum();

		// tear the path out of a copy of the diagram and re-partition
		let mut repaired = voronoi.clone();
		let (cells1, cells2) = repaired.repair(g, &s, key_path);

		let mut cheapest: Option<(Weight, (NodeId, NodeId))> = None;
		for (u, v, w) in g.edge_boundary(&cells1, &cells2) {
			let cost = repaired.boundary_cost(u, v, w);
			if cheapest.map_or(true, |(best, _)| cost < best) {
				cheapest = Some((cost, (u, v)));
			}
		}
		let (cost, (u, v)) = match cheapest {
			Some(found) => found,
			None => continue,
		};

		if cost < key_path_weight {
			log::trace!("exchanging a key path of weight {} for a reconnection of cost {}", key_path_weight, cost);
			if key_path_weight - cost > improvement {
				improvement = key_path_weight - cost;
				path_to_del = Some(key_path);
				path_to_add = Some(repaired.base_path(u, v));
			}
			if early_stop {
				break;
			}
		}
	}
	match (path_to_del, path_to_add) {
		(Some(del), Some(add)) => replace_path(g, &s, del, &add),
		_ => s,
	}
}

/// Look for a key vertex whose removal from the crucial set yields a
/// cheaper tree, rebuilt by the distance network heuristic on the
/// remaining key vertices plus the terminals.
pub fn key_vertex_elimination(g: &Graph, s: Graph, terminals: &HashSet<NodeId>, early_stop: bool) -> Graph {
	let mut keys: Vec<NodeId> = key_vertices(&s, terminals).into_iter().collect();
	keys.sort_unstable();
	if keys.is_empty() {
		return s;
	}
	let s_weight = graph_weight(&s);
	let mut improvement = 0;
	let mut best: Option<Graph> = None;
	for v in &keys {
		let mut bases: HashSet<NodeId> = keys.iter().filter(|k| *k != v).cloned().collect();
		bases.extend(terminals.iter().cloned());
		// the heuristic spans non-terminals too, so the result needs pruning
		let candidate = prune_tree(distance_network_heuristic(g, &bases), terminals);
		let candidate_weight = graph_weight(&candidate);
		if candidate_weight < s_weight {
			log::trace!("eliminating key vertex {} drops the weight to {}", v, candidate_weight);
			if early_stop {
				return candidate;
			}
			if s_weight - candidate_weight > improvement {
				improvement = s_weight - candidate_weight;
				best = Some(candidate);
			}
		}
	}
	best.unwrap_or(s)
}
