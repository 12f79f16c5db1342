use pipeline_resolver::{InputConfigs, JobConfig, VersionsDB};

fn main() {
	let mut opts;

	/* Parse console input */
	let parsed_options = {
		let args: Vec<String> = std::env::args().collect();

		opts = getopts::Options::new();
		opts.optflag( "h", "help",        "Show help");
		opts.optflag( "v", "verbose",     "Log every build tried while searching");
		opts.optflag( "",  "no-validate", "Skip checking the job config against its schema");
		opts.parsing_style(getopts::ParsingStyle::FloatingFrees);

		let parsed_options = match opts.parse(args.iter().skip(1)) {
			Ok(m)  => { m }
			Err(e) => { println!("Unable to parse options: {}", e); return }
		};

		if parsed_options.opt_present("h") || parsed_options.free.is_empty() {
			eprintln!("{}", opts.usage("Usage:\n\tpipeline-resolver resolve <snapshot> <job.json>\n\tpipeline-resolver import <snapshot> <name>"));
			return;
		}

		parsed_options
	};

	let config = pipeline_resolver::Config::load_from_disk();

	let mut logger = env_logger::Builder::from_default_env();
	let trace_search = parsed_options.opt_present("v") || config.as_ref().map(|c| c.trace_search()).unwrap_or(false);
	if trace_search {
		logger.filter_module("pipeline_resolver::resolver", log::LevelFilter::Trace);
	}
	logger.init();

	let config = config.unwrap_or_else(|e| {
		log::warn!("Failed to read config file: {}", e);
		log::warn!("Using default config.");
		pipeline_resolver::Config::default()
	});

	let free = &parsed_options.free;
	let result = match free[0].as_str() {
		"resolve" => {
			match (free.get(1), free.get(2)) {
				(Some(snapshot), Some(job)) => resolve(&config, snapshot, job, !parsed_options.opt_present("no-validate")),
				_ => Err(Error::MissingArgument),
			}
		},
		"import" => {
			match (free.get(1), free.get(2)) {
				(Some(snapshot), Some(name)) => import(&config, snapshot, name),
				_ => Err(Error::MissingArgument),
			}
		},
		other => Err(Error::UnknownCommand(other.to_string())),
	};

	if let Err(e) = result {
		log::error!("{}", e);
		std::process::exit(1);
	}
}

/// Opens a snapshot by path, or by name from the data directory when no such file exists.
fn load_snapshot(config: &pipeline_resolver::Config, snapshot: &str) -> Result<VersionsDB, Error> {
	let path = std::path::Path::new(snapshot);
	if !path.is_file() {
		log::debug!("No file at {}, looking for a cached snapshot", snapshot);
		return Ok(VersionsDB::load_from_disk(config, snapshot)?);
	}

	let db = match path.extension().and_then(|e| e.to_str()) {
		Some("bin") => VersionsDB::load_by_file(path)?,
		extension => {
			let file = std::io::BufReader::new(std::fs::File::open(path).map_err(pipeline_resolver::Error::from)?);
			if extension == Some("gz") {
				VersionsDB::from_gz_reader(file)?
			} else {
				VersionsDB::from_json_reader(file)?
			}
		},
	};
	Ok(db)
}

fn resolve(config: &pipeline_resolver::Config, snapshot: &str, job: &str, do_validation: bool) -> Result<(), Error> {
	let db = load_snapshot(config, snapshot)?;

	let job = std::fs::read_to_string(job).map_err(pipeline_resolver::Error::from)?;
	let job = JobConfig::from_json(&job, do_validation)?;
	let inputs = InputConfigs::from_job_config(&job, &db)?;
	let job_id = pipeline_resolver::History::job_id(&db, &job.name)?
		.ok_or_else(|| pipeline_resolver::Error::NotFound(format!("job {}", job.name)))?;

	let mut store = pipeline_resolver::InMemoryStore::new();
	let determination = pipeline_resolver::determine_inputs(&db, &mut store, job_id, &inputs)?;

	println!("{}", serde_json::to_string_pretty(&determination)?);
	Ok(())
}

fn import(config: &pipeline_resolver::Config, snapshot: &str, name: &str) -> Result<(), Error> {
	let db = load_snapshot(config, snapshot)?;
	db.save_to_disk(config, name)?;
	log::info!("Saved snapshot {} to {}", name, config.data_dir().display());
	Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("pipeline-resolver error: {0}")]
	Resolver(#[from] pipeline_resolver::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("Missing argument")]
	MissingArgument,
	#[error("Unknown command {0}")]
	UnknownCommand(String),
}
