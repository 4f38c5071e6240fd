//! # Steiner tree local search
//!
//! CLI for computing approximate solutions to the Steiner tree problem in
//! graphs: starting from a constructive tree, a composition of neighbourhood
//! moves is applied epoch after epoch until no improvement remains.
//! Instances are solved in parallel, each on its own worker.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{crate_version, App, Arg};

mod data;
mod error;
mod graph;
mod meta;
mod moves;
mod search;
mod tree;
mod voronoi;

pub use error::SolveError;
pub use try_all::TryMapAll;

/// Vertex identifier, as appearing in the instance files
pub type NodeId = u32;
/// Edge (and tree) weight
pub type Weight = u64;

#[derive(Clone, Debug)]
struct Config {
	instances: PathBuf,
	output: PathBuf,
	cache: Option<PathBuf>,
	save: bool,
	params: meta::Parameters,
}

fn invalid_args(message: &str) -> ! {
	eprintln!("{}", message);
	std::process::exit(2);
}

fn main() -> std::io::Result<()> {
	let matches = App::new("Steiner Tree Local Search")
		.version(crate_version!())
		.about("Approximate Steiner trees on benchmark instances, one neighbourhood at a time")
		.arg(Arg::with_name("instances")
				.takes_value(true)
				.required(true)
				.index(1)
				.help("Directory containing instanceNNN.gr files"))
		.arg(Arg::with_name("output")
				.takes_value(true)
				.required(true)
				.index(2)
				.help("Result JSON path"))
		.arg(Arg::with_name("start")
				.long("start")
				.takes_value(true)
				.help("Starting solution algorithm: dnh or mst (default dnh)"))
		.arg(Arg::with_name("method")
				.long("method")
				.takes_value(true)
				.help("Local search composition: kv or sv (default kv)"))
		.arg(Arg::with_name("no-early-stop")
				.long("no-early-stop")
				.takes_value(false)
				.help("Scan each whole neighbourhood for the best improvement instead of taking the first"))
		.arg(Arg::with_name("all")
				.long("all")
				.takes_value(false)
				.help("Solve every odd instance id in [1,199]"))
		.arg(Arg::with_name("id")
				.long("id")
				.takes_value(true)
				.multiple(true)
				.help("Instance ids to solve (odd, in [1,199])"))
		.arg(Arg::with_name("timeout")
				.long("timeout")
				.takes_value(true)
				.help("Per-instance time budget in seconds, 0 disables (default 3600)"))
		.arg(Arg::with_name("save")
				.long("save")
				.takes_value(false)
				.help("Persist each final tree as JSON next to the results"))
		.arg(Arg::with_name("verbose")
				.long("verbose")
				.takes_value(false)
				.help("Debug logging, only valid with exactly one --id"))
		.arg(Arg::with_name("meta")
				.long("meta")
				.takes_value(true)
				.help("YAML parameters file, overridden by explicit flags"))
		.arg(Arg::with_name("cache")
				.long("cache")
				.takes_value(true)
				.help("Starting-solution cache directory"))
		.get_matches();
	env_logger::init_from_env(env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, if matches.is_present("verbose") { "debug" } else { "info" }));

	let mut params = match matches.value_of("meta") {
		Some(file) => match std::fs::File::open(file).map_err(SolveError::from).and_then(|f| serde_yaml::from_reader(f).map_err(SolveError::from)) {
			Ok(params) => params,
			Err(e) => invalid_args(&format!("Invalid meta parameters {}: {}", file, e)),
		},
		None => meta::Parameters::default(),
	};
	if let Some(start) = matches.value_of("start") {
		params.start = start.parse().unwrap_or_else(|e: String| invalid_args(&e));
	}
	if let Some(method) = matches.value_of("method") {
		params.method = method.parse().unwrap_or_else(|e: String| invalid_args(&e));
	}
	if matches.is_present("no-early-stop") {
		params.early_stop = false;
	}
	if let Some(timeout) = matches.value_of("timeout") {
		params.timeout = timeout.parse().unwrap_or_else(|_| invalid_args("--timeout expects a number of seconds"));
	}

	let ids: Vec<u32> = if matches.is_present("all") {
		if matches.is_present("id") {
			invalid_args("--all and --id are mutually exclusive");
		}
		(1..200).step_by(2).collect()
	} else {
		match matches.values_of("id") {
			None => invalid_args("Select instances with --all or --id"),
			Some(values) => {
				let mut ids: Vec<u32> = values
					.map(|value| match value.parse::<u32>() {
						Ok(id) if id % 2 == 1 && id <= 199 => id,
						_ => invalid_args(&format!("Invalid instance id {:?}: expected an odd integer in [1,199]", value)),
					})
					.collect();
				ids.sort_unstable();
				ids.dedup();
				ids
			}
		}
	};
	if matches.is_present("verbose") && ids.len() != 1 {
		invalid_args("--verbose requires exactly one --id");
	}

	let config = Config {
		instances: PathBuf::from(matches.value_of("instances").unwrap()),
		output: PathBuf::from(matches.value_of("output").unwrap()),
		cache: matches.value_of("cache").map(PathBuf::from),
		save: matches.is_present("save"),
		params,
	};

	log::info!("Solving {} instances with {} ({} start)", ids.len(), config.params.method.name(), config.params.start.name());
	let started = Instant::now();
	let workers: Vec<_> = ids
		.iter()
		.map(|id| {
			let config = config.clone();
			let id = *id;
			(id, std::thread::spawn(move || solve_instance(&config, id)))
		})
		.collect();
	let mut results = data::Results::new();
	for (id, worker) in workers {
		match worker.join() {
			Ok(Ok(report)) => {
				results.insert(id, report);
			}
			Ok(Err(e @ SolveError::InvariantViolation(_))) => {
				log::error!("Instance #{} ({}): {}", id, config.params.method.name(), e);
				results.insert(id, data::InstanceReport::default());
			}
			Ok(Err(e)) => log::error!("Instance #{} ({}): {}", id, config.params.method.name(), e),
			Err(_) => log::error!("Instance #{} ({}): worker panicked", id, config.params.method.name()),
		}
	}
	log::info!("Finished {}/{} instances in {:.3} seconds", results.len(), ids.len(), started.elapsed().as_secs_f64());
	if let Some(parent) = config.output.parent() {
		if !parent.as_os_str().is_empty() {
			std::fs::create_dir_all(parent)?;
		}
	}
	serde_json::to_writer(&std::fs::File::create(&config.output)?, &results).unwrap();
	Ok(())
}

/// Solve a single instance end to end: parse, start, search, persist.
fn solve_instance(config: &Config, id: u32) -> Result<data::InstanceReport, SolveError> {
	let started = Instant::now();
	log::info!("Solving #{}", id);
	let instance = data::parse_instance(&data::instance_path(&config.instances, id))?;
	log::debug!("Instance #{}: {} nodes, {} edges, {} terminals", id, instance.graph.node_count(), instance.graph.edge_count(), instance.terminals.len());
	let s = starting_solution_cached(config, id, &instance)?;
	tree::check_solution(&s, &instance.terminals)?;
	let deadline = if config.params.timeout > 0 { Some(Instant::now() + Duration::from_secs(config.params.timeout)) } else { None };
	let (s, trace) = search::local_search(&instance.graph, s, &instance.terminals, &config.params, deadline);
	tree::check_solution(&s, &instance.terminals)?;
	if config.save {
		let dir = config.output.parent().unwrap_or_else(|| Path::new(".")).join("trees").join(config.params.method.name());
		data::save_tree(&dir.join(format!("{}.json", id)), &s)?;
	}
	let run_time = started.elapsed().as_secs_f64();
	log::info!("Done #{} after {:.3} seconds at weight {}", id, run_time, trace.weights.last().unwrap());
	Ok(data::InstanceReport {
		weights: trace.weights,
		epoch_times: trace.epoch_times,
		run_time,
	})
}

/// Load the starting solution from the cache when enabled and valid,
/// compute (and cache) it otherwise.
fn starting_solution_cached(config: &Config, id: u32, instance: &data::Instance) -> Result<graph::Graph, SolveError> {
	let cached = config.cache.as_ref().map(|dir| dir.join(config.params.start.name()).join(format!("{}.json", id)));
	if let Some(path) = &cached {
		if path.exists() {
			match data::load_tree(path) {
				Ok(tree) if tree::check_solution(&tree, &instance.terminals).is_ok() => {
					log::debug!("Loaded starting solution for #{} from {}", id, path.display());
					return Ok(tree);
				}
				Ok(_) => log::warn!("Cached starting solution {} violates the solution invariants, recomputing", path.display()),
				Err(e) => log::warn!("Cached starting solution {} unreadable ({}), recomputing", path.display(), e),
			}
		}
	}
	let s = search::starting_solution(&instance.graph, &instance.terminals, config.params.start);
	if let Some(path) = &cached {
		data::save_tree(path, &s)?;
	}
	Ok(s)
}
