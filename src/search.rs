//! The local search engine: compose neighbourhood moves into epochs, and
//! run epochs until no improvement (or the deadline) remains.

use std::collections::HashSet;
use std::time::Instant;

use crate::*;
use graph::Graph;
use meta::{Method, Parameters, Start};
use moves::*;
use tree::{graph_weight, prune_tree};
use voronoi::distance_network_heuristic;

/// Construct a starting solution: a valid Steiner tree to improve upon.
pub fn starting_solution(g: &Graph, terminals: &HashSet<NodeId>, algo: Start) -> Graph {
	let tree = match algo {
		Start::Dnh => distance_network_heuristic(g, terminals),
		Start::Mst => g.minimum_spanning_tree(),
	};
	prune_tree(tree, terminals)
}

/// One full composition of moves, per the configured method.
fn compose(g: &Graph, s: Graph, terminals: &HashSet<NodeId>, method: Method, early_stop: bool) -> Graph {
	match method {
		Method::SteinerVertices => {
			let s = steiner_vertices_elimination(g, s, terminals, early_stop);
			steiner_vertices_insertion(g, s, terminals, early_stop)
		}
		Method::KeyVertices => {
			let s = steiner_vertices_insertion(g, s, terminals, early_stop);
			let s = key_vertex_elimination(g, s, terminals, early_stop);
			key_path_exchange(g, s, terminals, early_stop)
		}
	}
}

/// Per-epoch record of an engine run.
///
/// `weights[0]` is the starting weight; each accepted epoch appends its
/// weight and its duration (seconds, rounded to milliseconds). The final,
/// non-improving epoch appends nothing.
#[derive(Clone, PartialEq, Debug)]
pub struct Trace {
	pub weights: Vec<Weight>,
	pub epoch_times: Vec<f64>,
}

/// Improve a starting solution until an epoch brings no improvement.
///
/// The deadline, if any, is only consulted between epochs: an epoch is a
/// unit of atomic work, and on expiry the best solution known so far is
/// returned together with the partial trace.
///
/// Arguments:
/// - `g`: the instance graph
/// - `s`: starting solution, a valid Steiner tree for `terminals`
/// - `terminals`: the vertices every solution must span
/// - `params`: method, early stopping
/// - `deadline`: monotonic instant to stop at, if any
pub fn local_search(g: &Graph, s: Graph, terminals: &HashSet<NodeId>, params: &Parameters, deadline: Option<Instant>) -> (Graph, Trace) {
	let mut s = s;
	let mut s_weight = graph_weight(&s);
	let mut weights = vec![s_weight];
	let mut epoch_times = Vec::new();
	let mut epoch = 0u32;
	loop {
		if deadline.map_or(false, |d| Instant::now() >= d) {
			log::debug!("deadline expired after {} epochs at weight {}", epoch, s_weight);
			break;
		}
		epoch += 1;
		let epoch_start = Instant::now();
		let next = compose(g, s.clone(), terminals, params.method, params.early_stop);
		let next_weight = graph_weight(&next);
		let epoch_time = (epoch_start.elapsed().as_secs_f64() * 1000.0).round() / 1000.0;
		if next_weight >= s_weight {
			log::debug!("epoch {} brought no improvement, settling at weight {}", epoch, s_weight);
			break;
		}
		log::debug!("epoch {} improved {} -> {} in {:.3}s", epoch, s_weight, next_weight, epoch_time);
		debug_assert!(tree::check_solution(&next, terminals).is_ok());
		s = next;
		s_weight = next_weight;
		weights.push(next_weight);
		epoch_times.push(epoch_time);
	}
	(s, Trace { weights, epoch_times })
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

	fn params(method: Method, early_stop: bool) -> Parameters {
		Parameters {
			start: Start::Mst,
			method,
			early_stop,
			timeout: 0,
		}
	}

	fn triangle_with_hub() -> Graph {
		graph!(vec![(1, 2, 10), (2, 3, 10), (1, 3, 10), (1, 4, 1), (2, 4, 1), (3, 4, 1)])
	}

	#[test]
	fn test_starting_solutions_are_valid() {
		let g = triangle_with_hub();
		let ts = terminals(&[1, 2, 3]);
		for algo in [Start::Dnh, Start::Mst].iter() {
			let s = starting_solution(&g, &ts, *algo);
			assert!(tree::check_solution(&s, &ts).is_ok());
			assert_eq!(graph_weight(&s), 3);
		}
	}

	#[test]
	fn test_single_terminal_start() {
		let g = graph!(vec![(1, 2, 1), (2, 3, 1)]);
		let ts = terminals(&[2]);
		for algo in [Start::Dnh, Start::Mst].iter() {
			let s = starting_solution(&g, &ts, *algo);
			assert_eq!(s.nodes(), vec![2]);
			let (done, trace) = local_search(&g, s, &ts, &params(Method::KeyVertices, true), None);
			assert_eq!(done.nodes(), vec![2]);
			assert_eq!(trace.weights, vec![0]);
		}
	}

	#[test]
	fn test_engine_keeps_hub_tree() {
		let g = triangle_with_hub();
		let ts = terminals(&[1, 2, 3]);
		for method in [Method::KeyVertices, Method::SteinerVertices].iter() {
			let s = starting_solution(&g, &ts, Start::Mst);
			let (done, trace) = local_search(&g, s, &ts, &params(*method, true), None);
			assert_eq!(done.edges(), vec![(1, 4, 1), (2, 4, 1), (3, 4, 1)]);
			assert_eq!(trace.weights, vec![3]);
			assert!(trace.epoch_times.is_empty());
		}
	}

	#[test]
	fn test_engine_no_op_on_forced_path() {
		// the only Steiner tree of a path graph is the path itself
		let g = graph!(vec![(1, 2, 1), (2, 3, 1), (3, 4, 1), (4, 5, 1)]);
		let ts = terminals(&[1, 5]);
		let s = starting_solution(&g, &ts, Start::Mst);
		let (done, trace) = local_search(&g, s.clone(), &ts, &params(Method::KeyVertices, true), None);
		assert_eq!(done, s);
		assert_eq!(trace.weights, vec![4]);
	}

	#[test]
	fn test_engine_improves_path_start() {
		// insertion pulls the outer path onto the hub 5, then nothing improves
		let g = graph!(vec![(1, 2, 5), (2, 3, 5), (3, 4, 5), (1, 5, 2), (2, 5, 2), (3, 5, 2), (4, 5, 2)]);
		let ts = terminals(&[1, 3, 4]);
		let s = graph!(vec![(1, 2, 5), (2, 3, 5), (3, 4, 5)]);
		let (done, trace) = local_search(&g, s, &ts, &params(Method::KeyVertices, true), None);
		assert_eq!(graph_weight(&done), 6);
		assert_eq!(trace.weights, vec![15, 6]);
		assert_eq!(trace.epoch_times.len(), 1);
	}

	#[test]
	fn test_epoch_weights_strictly_decrease() {
		let g = graph!(vec![(1, 2, 5), (2, 3, 5), (3, 4, 5), (1, 5, 2), (2, 5, 2), (3, 5, 2), (4, 5, 2)]);
		let ts = terminals(&[1, 3, 4]);
		let s = graph!(vec![(1, 2, 5), (2, 3, 5), (3, 4, 5)]);
		for early_stop in [true, false].iter() {
			let (_, trace) = local_search(&g, s.clone(), &ts, &params(Method::SteinerVertices, *early_stop), None);
			assert!(trace.weights.windows(2).all(|w| w[1] < w[0]));
		}
	}

	#[test]
	fn test_deterministic_replay() {
		let g = graph!(vec![(1, 2, 5), (2, 3, 5), (3, 4, 5), (1, 5, 2), (2, 5, 2), (3, 5, 2), (4, 5, 2)]);
		let ts = terminals(&[1, 3, 4]);
		let s = graph!(vec![(1, 2, 5), (2, 3, 5), (3, 4, 5)]);
		let (first, first_trace) = local_search(&g, s.clone(), &ts, &params(Method::KeyVertices, true), None);
		let (second, second_trace) = local_search(&g, s, &ts, &params(Method::KeyVertices, true), None);
		assert_eq!(first, second);
		assert_eq!(first_trace.weights, second_trace.weights);
	}

	#[test]
	fn test_distant_deadline_changes_nothing() {
		let g = triangle_with_hub();
		let ts = terminals(&[1, 2, 3]);
		let s = starting_solution(&g, &ts, Start::Mst);
		let far = Some(Instant::now() + std::time::Duration::from_secs(1_000_000_000));
		let (without, trace_without) = local_search(&g, s.clone(), &ts, &params(Method::KeyVertices, true), None);
		let (with, trace_with) = local_search(&g, s, &ts, &params(Method::KeyVertices, true), far);
		assert_eq!(without, with);
		assert_eq!(trace_without.weights, trace_with.weights);
	}

	#[test]
	fn test_expired_deadline_returns_start() {
		let g = triangle_with_hub();
		let ts = terminals(&[1, 2, 3]);
		let s = starting_solution(&g, &ts, Start::Mst);
		let (done, trace) = local_search(&g, s.clone(), &ts, &params(Method::KeyVertices, true), Some(Instant::now()));
		assert_eq!(done, s);
		assert_eq!(trace.weights, vec![graph_weight(&s)]);
		assert!(trace.epoch_times.is_empty());
	}

	#[test]
	fn test_engine_sheds_useless_detour() {
		// the expensive chord and the far side of the cycle both stay out
		let g = graph!(vec![(1, 2, 1), (2, 3, 1), (3, 4, 1), (1, 4, 1), (2, 4, 100)]);
		let ts = terminals(&[1, 3]);
		let s = starting_solution(&g, &ts, Start::Mst);
		let (done, _) = local_search(&g, s, &ts, &params(Method::SteinerVertices, true), None);
		assert_eq!(done.edges(), vec![(1, 2, 1), (2, 3, 1)]);
		assert_eq!(graph_weight(&done), 2);
	}

	#[test]
	fn test_full_scan_no_heavier_than_early_stop() {
		let g = graph!(vec![(1, 2, 5), (2, 3, 5), (3, 4, 5), (1, 5, 2), (2, 5, 2), (3, 5, 2), (4, 5, 2)]);
		let ts = terminals(&[1, 3, 4]);
		let s = graph!(vec![(1, 2, 5), (2, 3, 5), (3, 4, 5)]);
		let (eager, _) = local_search(&g, s.clone(), &ts, &params(Method::KeyVertices, true), None);
		let (thorough, _) = local_search(&g, s, &ts, &params(Method::KeyVertices, false), None);
		assert!(graph_weight(&thorough) <= graph_weight(&eager));
	}
}
