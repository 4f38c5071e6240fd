//! Operations on Steiner trees: pruning, weighing, vertex classification.

use std::collections::HashSet;

use crate::*;
use graph::Graph;

/// Total weight of a graph
pub fn graph_weight(g: &Graph) -> Weight {
	g.edges().into_iter().map(|(_, _, w)| w).sum()
}

/// Iteratively strip non-terminal leaves off a tree, until every leaf is a terminal.
///
/// Pruning an already-pruned tree is a no-op.
pub fn prune_tree(mut tree: Graph, terminals: &HashSet<NodeId>) -> Graph {
	let leaves: Vec<NodeId> = tree.nodes().into_iter().filter(|n| tree.degree(*n) == 1 && !terminals.contains(n)).collect();
	for leaf in leaves {
		let mut leaf = leaf;
		while tree.degree(leaf) == 1 && !terminals.contains(&leaf) {
			let next = tree.neighbors(leaf)[0].0;
			tree.remove_node(leaf);
			leaf = next;
		}
	}
	tree
}

/// Crucial vertices of a tree: terminals and vertices of degree at least 3
pub fn crucial_vertices(s: &Graph, terminals: &HashSet<NodeId>) -> HashSet<NodeId> {
	s.node_set().into_iter().filter(|n| s.degree(*n) >= 3 || terminals.contains(n)).collect()
}

/// Key vertices of a tree: non-terminals of degree at least 3
pub fn key_vertices(s: &Graph, terminals: &HashSet<NodeId>) -> HashSet<NodeId> {
	s.node_set().into_iter().filter(|n| s.degree(*n) >= 3 && !terminals.contains(n)).collect()
}

/// Check that a solution is a tree, spans the terminals, and has no non-terminal leaf
pub fn check_solution(s: &Graph, terminals: &HashSet<NodeId>) -> Result<(), SolveError> {
	if !s.is_tree() {
		return Err(SolveError::InvariantViolation("solution is not a tree".to_string()));
	}
	for t in terminals {
		if !s.has_node(*t) {
			return Err(SolveError::InvariantViolation(format!("terminal {} is missing from the solution", t)));
		}
	}
	for n in s.nodes() {
		if s.degree(n) == 1 && !terminals.contains(&n) {
			return Err(SolveError::InvariantViolation(format!("non-terminal leaf {}", n)));
		}
	}
	Ok(())
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

	fn terminals(ts: &[NodeId]) -> HashSet<NodeId> {
		ts.iter().cloned().collect()
	}

	#[test]
	fn test_prune_strips_pendant_chains() {
		// 5-4-1-2-3 with terminals 1, 2: both pendant chains go
		let tree = graph!(vec![(1, 2, 1), (2, 3, 1), (1, 4, 1), (4, 5, 1)]);
		let pruned = prune_tree(tree, &terminals(&[1, 2]));
		assert_eq!(pruned.edges(), vec![(1, 2, 1)]);
	}

	#[test]
	fn test_prune_to_single_terminal() {
		let tree = graph!(vec![(1, 2, 1), (2, 3, 1)]);
		let pruned = prune_tree(tree, &terminals(&[1]));
		assert_eq!(pruned.nodes(), vec![1]);
		assert_eq!(pruned.edge_count(), 0);
	}

	#[test]
	fn test_prune_idempotent() {
		let tree = graph!(vec![(1, 4, 1), (2, 4, 1), (3, 4, 1)]);
		let once = prune_tree(tree.clone(), &terminals(&[1, 2, 3]));
		let twice = prune_tree(once.clone(), &terminals(&[1, 2, 3]));
		assert_eq!(once, tree);
		assert_eq!(once, twice);
	}

	#[test]
	fn test_vertex_classification() {
		// 4 branches at the non-terminal 4, terminal 3 is a pass-through
		let s = graph!(vec![(1, 4, 1), (2, 4, 1), (3, 4, 1), (3, 5, 1)]);
		let ts = terminals(&[1, 2, 3, 5]);
		assert_eq!(key_vertices(&s, &ts), terminals(&[4]));
		assert_eq!(crucial_vertices(&s, &ts), terminals(&[1, 2, 3, 4, 5]));
	}

	#[test]
	fn test_graph_weight() {
		let g = graph!(vec![(1, 2, 3), (2, 3, 4)]);
		assert_eq!(graph_weight(&g), 7);
	}

	#[test]
	fn test_check_solution() {
		let s = graph!(vec![(1, 2, 1), (2, 3, 1)]);
		assert!(check_solution(&s, &terminals(&[1, 3])).is_ok());
		// non-terminal leaf
		assert!(check_solution(&s, &terminals(&[1, 2])).is_err());
		// missing terminal
		assert!(check_solution(&s, &terminals(&[1, 3, 9])).is_err());
		// not a tree
		let cyclic = graph!(vec![(1, 2, 1), (2, 3, 1), (1, 3, 1)]);
		assert!(check_solution(&cyclic, &terminals(&[1, 2, 3])).is_err());
	}
}
