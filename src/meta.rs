//! Meta parameters for the Steiner tree local search solver

use serde::*;

/// Starting solution construction algorithm
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Start {
	/// distance network heuristic seeded with the terminals
	#[serde(rename = "dnh")]
	Dnh,
	/// minimum spanning tree of the whole graph, pruned to the terminals
	#[serde(rename = "mst")]
	Mst,
}

impl Start {
	pub fn name(self) -> &'static str {
		match self {
			Start::Dnh => "dnh",
			Start::Mst => "mst",
		}
	}
}

impl std::str::FromStr for Start {
	type Err = String;
	fn from_str(s: &str) -> Result<Self, String> {
		match s {
			"dnh" => Ok(Start::Dnh),
			"mst" => Ok(Start::Mst),
			other => Err(format!("Unknown starting algorithm {:?} (expected dnh or mst)", other)),
		}
	}
}

/// Local search composition, applied once per epoch
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Method {
	/// insertion, then key vertex elimination, then key path exchange
	#[serde(rename = "kv")]
	KeyVertices,
	/// elimination, then insertion, of single Steiner vertices
	#[serde(rename = "sv")]
	SteinerVertices,
}

impl Method {
	pub fn name(self) -> &'static str {
		match self {
			Method::KeyVertices => "kv",
			Method::SteinerVertices => "sv",
		}
	}
}

impl std::str::FromStr for Method {
	type Err = String;
	fn from_str(s: &str) -> Result<Self, String> {
		match s {
			"kv" => Ok(Method::KeyVertices),
			"sv" => Ok(Method::SteinerVertices),
			other => Err(format!("Unknown method {:?} (expected kv or sv)", other)),
		}
	}
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct Parameters {
	#[serde(default = "default_start")]
	pub start: Start,
	#[serde(default = "default_method")]
	pub method: Method,
	/// accept the first improvement found inside each move, instead of the best
	#[serde(default = "default_early_stop")]
	pub early_stop: bool,
	/// per-instance time budget in seconds, 0 disables the deadline
	#[serde(default = "default_timeout")]
	pub timeout: u64,
}

impl Default for Parameters {
	fn default() -> Self {
		Self {
			start: default_start(),
			method: default_method(),
			early_stop: default_early_stop(),
			timeout: default_timeout(),
		}
	}
}

fn default_start() -> Start {
	Start::Dnh
}
fn default_method() -> Method {
	Method::KeyVertices
}
fn default_early_stop() -> bool {
	true
}
fn default_timeout() -> u64 {
	3600
}
