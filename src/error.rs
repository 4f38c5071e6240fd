//! Error kinds of the solver.
//!
//! A timeout is not an error: the engine returns its best-known solution
//! and a partial trace as a normal result.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolveError {
	#[error("malformed instance file: {0}")]
	InputFormat(String),

	#[error("solution invariant violated: {0}")]
	InvariantViolation(String),

	#[error("i/o error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("YAML error: {0}")]
	Yaml(#[from] serde_yaml::Error),
}
