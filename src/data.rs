//! Data types and file formats: benchmark instances, serialized trees, and
//! result reports.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::*;
use graph::Graph;
use serde::*;

/// A parsed benchmark instance: a connected weighted graph and its terminals
#[derive(Clone, Debug)]
pub struct Instance {
	pub graph: Graph,
	pub terminals: HashSet<NodeId>,
}

/// Path of a benchmark instance inside the instance directory
pub fn instance_path(dir: &Path, id: u32) -> PathBuf {
	dir.join(format!("instance{:03}.gr", id))
}

fn eof(path: &Path) -> SolveError {
	SolveError::InputFormat(format!("{}: unexpected end of file", path.display()))
}

fn bad_line(path: &Path, lineno: usize, what: &str) -> SolveError {
	SolveError::InputFormat(format!("{}:{}: {}", path.display(), lineno + 1, what))
}

fn int_field<T: std::str::FromStr>(line: &str, idx: usize) -> Option<T> {
	line.split_whitespace().nth(idx).and_then(|token| token.parse().ok())
}

/// Parse an instance file.
///
/// The format is line-oriented: a skipped header, `Nodes <n>`, `Edges <m>`,
/// m lines whose last 3 tokens are `<u> <v> <w>`, 3 separator lines, then
/// `Terminals <k>` and k lines whose last token is a terminal id. Vertex
/// ids are positive integers and are used as-is; weights are strictly
/// positive integers.
pub fn parse_instance(path: &Path) -> Result<Instance, SolveError> {
	let text = std::fs::read_to_string(path)?;
	let mut lines = text.lines().enumerate();

	lines.next().ok_or_else(|| eof(path))?;

	let (lineno, line) = lines.next().ok_or_else(|| eof(path))?;
	let _nodes: usize = int_field(line, 1).ok_or_else(|| bad_line(path, lineno, "expected `Nodes <n>`"))?;
	let (lineno, line) = lines.next().ok_or_else(|| eof(path))?;
	let n_edges: usize = int_field(line, 1).ok_or_else(|| bad_line(path, lineno, "expected `Edges <m>`"))?;

	let edge_lines: Vec<(usize, &str)> = (&mut lines).take(n_edges).collect();
	if edge_lines.len() < n_edges {
		return Err(eof(path));
	}
	let mut graph = Graph::default();
	for (u, v, w) in edge_lines.into_iter().try_map_all(|(lineno, line)| {
		let tokens: Vec<&str> = line.split_whitespace().collect();
		if tokens.len() < 3 {
			return Err(bad_line(path, lineno, "expected `E <u> <v> <w>`"));
		}
		let u: NodeId = tokens[tokens.len() - 3].parse().map_err(|_| bad_line(path, lineno, "vertex ids must be positive integers"))?;
		let v: NodeId = tokens[tokens.len() - 2].parse().map_err(|_| bad_line(path, lineno, "vertex ids must be positive integers"))?;
		let w: Weight = tokens[tokens.len() - 1].parse().map_err(|_| bad_line(path, lineno, "edge weights must be integers"))?;
		if u == 0 || v == 0 || u == v {
			return Err(bad_line(path, lineno, "edges must join two distinct positive vertex ids"));
		}
		if w == 0 {
			return Err(bad_line(path, lineno, "edge weights must be strictly positive"));
		}
		Ok((u, v, w))
	})? {
		graph.add_edge(u, v, w);
	}

	for _ in 0..3 {
		lines.next().ok_or_else(|| eof(path))?;
	}

	let (lineno, line) = lines.next().ok_or_else(|| eof(path))?;
	let n_terminals: usize = int_field(line, 1).ok_or_else(|| bad_line(path, lineno, "expected `Terminals <k>`"))?;

	let terminal_lines: Vec<(usize, &str)> = (&mut lines).take(n_terminals).collect();
	if terminal_lines.len() < n_terminals {
		return Err(eof(path));
	}
	let terminals: HashSet<NodeId> = terminal_lines
		.into_iter()
		.try_map_all(|(lineno, line)| {
			let t: NodeId = line.split_whitespace().last().and_then(|token| token.parse().ok()).ok_or_else(|| bad_line(path, lineno, "expected `T <t>`"))?;
			if !graph.has_node(t) {
				return Err(bad_line(path, lineno, "terminal does not appear in any edge"));
			}
			Ok(t)
		})?
		.collect();
	if terminals.is_empty() {
		return Err(SolveError::InputFormat(format!("{}: no terminals", path.display())));
	}

	Ok(Instance { graph, terminals })
}

/// A tree serialized to JSON, for cached starting solutions and saved results
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct TreeFile {
	pub nodes: Vec<NodeId>,
	pub edges: Vec<(NodeId, NodeId, Weight)>,
}

impl From<&Graph> for TreeFile {
	fn from(g: &Graph) -> Self {
		Self {
			nodes: g.nodes(),
			edges: g.edges(),
		}
	}
}

impl From<TreeFile> for Graph {
	fn from(tree: TreeFile) -> Self {
		let mut g = Graph::default();
		for n in tree.nodes {
			g.add_node(n);
		}
		for (u, v, w) in tree.edges {
			g.add_edge(u, v, w);
		}
		g
	}
}

pub fn load_tree(path: &Path) -> Result<Graph, SolveError> {
	let tree: TreeFile = serde_json::from_reader(std::fs::File::open(path)?)?;
	Ok(tree.into())
}

pub fn save_tree(path: &Path, tree: &Graph) -> Result<(), SolveError> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	serde_json::to_writer(&std::fs::File::create(path)?, &TreeFile::from(tree))?;
	Ok(())
}

/// Per-instance entry of the result report
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct InstanceReport {
	/// starting weight followed by the weight after each accepted epoch
	pub weights: Vec<Weight>,
	/// duration of each accepted epoch, in seconds
	pub epoch_times: Vec<f64>,
	/// wall time of the whole instance, in seconds
	pub run_time: f64,
}

/// The full report, instance id to its result, ordered by id
pub type Results = std::collections::BTreeMap<u32, InstanceReport>;

#[cfg(test)]
mod test {
	use super::*;

	const TINY: &str = "SECTION Graph\n\
		Nodes 4\n\
		Edges 4\n\
		E 1 2 10\n\
		E 2 3 10\n\
		E 1 4 1\n\
		E 3 4 1\n\
		END\n\
		\n\
		SECTION Terminals\n\
		Terminals 2\n\
		T 1\n\
		T 3\n";

	fn write_instance(name: &str, text: &str) -> PathBuf {
		let path = std::env::temp_dir().join(name);
		std::fs::write(&path, text).unwrap();
		path
	}

	#[test]
	fn test_parse_instance() {
		let path = write_instance("steiner-parse-ok.gr", TINY);
		let instance = parse_instance(&path).unwrap();
		assert_eq!(instance.graph.node_count(), 4);
		assert_eq!(instance.graph.edge_count(), 4);
		assert_eq!(instance.graph.weight(1, 2), Some(10));
		assert_eq!(instance.graph.weight(3, 4), Some(1));
		assert_eq!(instance.terminals, vec![1, 3].into_iter().collect());
	}

	#[test]
	fn test_parse_rejects_garbage() {
		let broken = vec![
			("steiner-parse-short.gr", "SECTION Graph\nNodes 2\nEdges 2\nE 1 2 1\n".to_string()),
			("steiner-parse-weight.gr", TINY.replace("E 1 2 10", "E 1 2 zero")),
			("steiner-parse-loop.gr", TINY.replace("E 1 2 10", "E 2 2 10")),
			("steiner-parse-terminal.gr", TINY.replace("T 3", "T 9")),
		];
		for (name, text) in &broken {
			let path = write_instance(name, text);
			match parse_instance(&path) {
				Err(SolveError::InputFormat(_)) => {}
				other => panic!("{} parsed as {:?}", name, other.map(|i| i.graph.edge_count())),
			}
		}
	}

	#[test]
	fn test_tree_file_round_trip() {
		let mut tree = Graph::default();
		tree.add_edge(1, 4, 1);
		tree.add_edge(3, 4, 1);
		let json = serde_json::to_string(&TreeFile::from(&tree)).unwrap();
		let back: Graph = serde_json::from_str::<TreeFile>(&json).unwrap().into();
		assert_eq!(back, tree);
	}

	#[test]
	fn test_instance_path_zero_pads() {
		assert_eq!(instance_path(Path::new("public"), 1), Path::new("public").join("instance001.gr"));
		assert_eq!(instance_path(Path::new("public"), 113), Path::new("public").join("instance113.gr"));
	}
}
