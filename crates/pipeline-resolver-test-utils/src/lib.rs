//! Table driven resolver examples.
//!
//! An [`Example`] describes history as rows of named jobs, resources and versions, the inputs of the job being
//! scheduled, and what it should resolve to. Names are mapped to ids the same way for the snapshot and the
//! expectations so tests never deal with raw ids.
//!
//! functions in this module should use results and not use any panics to avoid confusion in callers

use std::collections::BTreeMap;
use std::io::Write;

use pipeline_resolver::history::BuildStatus;
use pipeline_resolver::ids::*;
use pipeline_resolver::job_config::{JobConfig, JobInputConfig, VersionConfig};
use pipeline_resolver::{History, InputConfigs, MissingInputReason, ResolverStatus, VersionsDB};

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
	#[error("resolver error: {0}")]
	Resolver(#[from] pipeline_resolver::Error),
	#[error("encoding error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("example doesn't know {0}")]
	UnknownName(String),
	#[error("unexpected result: {0}")]
	Mismatch(String),
}

/// Assigns ids to names in order of first use.
#[derive(Debug, Clone, Default)]
pub struct StringMapping {
	ids: BTreeMap<String, i32>,
}

impl StringMapping {
	pub fn id(&mut self, name: &str) -> i32 {
		let next = self.ids.len() as i32 + 1;
		*self.ids.entry(name.to_string()).or_insert(next)
	}

	pub fn get(&self, name: &str) -> Option<i32> {
		self.ids.get(name).copied()
	}

	pub fn name(&self, id: i32) -> Option<&str> {
		self.ids.iter().find(|(_, v)| **v == id).map(|(name, _)| name.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
	Version,
	Input,
	Output,
}

/// One fact of history.
#[derive(Debug, Clone)]
pub struct DbRow {
	kind: RowKind,
	job: &'static str,
	build_id: BuildID,
	status: BuildStatus,
	resource: &'static str,
	version: &'static str,
	check_order: CheckOrder,
	disabled: bool,
	input_name: Option<&'static str>,
}

impl DbRow {
	fn new(kind: RowKind, job: &'static str, build_id: BuildID, resource: &'static str, version: &'static str, check_order: CheckOrder) -> Self {
		Self { kind, job, build_id, status: BuildStatus::Succeeded, resource, version, check_order, disabled: false, input_name: None }
	}

	/// A checked version nothing has used yet.
	pub fn version(resource: &'static str, version: &'static str, check_order: CheckOrder) -> Self {
		Self::new(RowKind::Version, "", 0, resource, version, check_order)
	}

	/// A version that has been disabled.
	pub fn disabled(resource: &'static str, version: &'static str, check_order: CheckOrder) -> Self {
		Self { disabled: true, ..Self::version(resource, version, check_order) }
	}

	/// `version` was produced by build `build_id` of `job`.
	pub fn output(job: &'static str, build_id: BuildID, resource: &'static str, version: &'static str, check_order: CheckOrder) -> Self {
		Self::new(RowKind::Output, job, build_id, resource, version, check_order)
	}

	/// `version` was an input of build `build_id` of `job`, named after its resource unless [`DbRow::named()`].
	pub fn input(job: &'static str, build_id: BuildID, resource: &'static str, version: &'static str, check_order: CheckOrder) -> Self {
		Self::new(RowKind::Input, job, build_id, resource, version, check_order)
	}

	pub fn named(mut self, input_name: &'static str) -> Self {
		self.input_name = Some(input_name);
		self
	}

	pub fn with_status(mut self, status: BuildStatus) -> Self {
		self.status = status;
		self
	}

	pub fn failed(self) -> Self {
		self.with_status(BuildStatus::Failed)
	}

	/// Disables the version this row refers to.
	pub fn disable(mut self) -> Self {
		self.disabled = true;
		self
	}
}

/// An input of the job being scheduled.
#[derive(Debug, Clone)]
pub struct Input {
	name: &'static str,
	resource: &'static str,
	passed: Vec<&'static str>,
	version: ExampleVersion,
}

#[derive(Debug, Clone, Copy)]
enum ExampleVersion {
	Latest,
	Every,
	Pinned(&'static str),
}

impl Input {
	pub fn new(name: &'static str, resource: &'static str) -> Self {
		Self { name, resource, passed: Vec::new(), version: ExampleVersion::Latest }
	}

	pub fn passed<const N: usize>(mut self, jobs: [&'static str; N]) -> Self {
		self.passed = jobs.to_vec();
		self
	}

	pub fn every(mut self) -> Self {
		self.version = ExampleVersion::Every;
		self
	}

	pub fn pinned(mut self, version: &'static str) -> Self {
		self.version = ExampleVersion::Pinned(version);
		self
	}
}

/// The reason an input should be missing, by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
	NoVersions,
	NoSatisfyingVersions,
	PinnedVersionUnavailable(&'static str),
	NoSatisfiableBuilds(&'static str),
}

#[derive(Debug, Clone)]
pub enum Expected {
	/// Input name to version name.
	Resolved(Vec<(&'static str, &'static str)>),
	Missing(Vec<(&'static str, Reason)>),
}

/// The job being scheduled when an example doesn't say.
pub const CURRENT_JOB: &str = "current-job";

#[derive(Debug, Clone)]
pub struct Example {
	pub job: &'static str,
	pub db: Vec<DbRow>,
	pub inputs: Vec<Input>,
	pub expected: Expected,
}

impl Example {
	pub fn new(db: Vec<DbRow>, inputs: Vec<Input>, expected: Expected) -> Self {
		Self { job: CURRENT_JOB, db, inputs, expected }
	}

	/// Builds the snapshot and input configs the example describes.
	pub fn setup(&self) -> Result<Setup, HarnessError> {
		let mut versions = StringMapping::default();
		let mut builder = VersionsDB::builder();
		builder.job(self.job);

		let mut known = BTreeMap::<VersionID, (ResourceID, CheckOrder, bool)>::new();
		for row in &self.db {
			let resource = builder.resource(row.resource);
			let version = versions.id(row.version);
			let entry = known.entry(version).or_insert((resource, row.check_order, false));
			entry.2 |= row.disabled;

			match row.kind {
				RowKind::Version => {},
				RowKind::Input => {
					let job = builder.job(row.job);
					builder.build(job, row.build_id, row.status)
						.input(row.build_id, resource, version, row.input_name.unwrap_or(row.resource));
				},
				RowKind::Output => {
					let job = builder.job(row.job);
					builder.build(job, row.build_id, row.status)
						.output(row.build_id, resource, version);
				},
			}
		}
		for (version, (resource, check_order, disabled)) in known {
			if disabled {
				builder.disabled_version(resource, version, check_order);
			} else {
				builder.version(resource, version, check_order);
			}
		}
		let db = builder.finish();

		let mut job_config = JobConfig { name: self.job.to_string(), inputs: Vec::new() };
		for input in &self.inputs {
			for job in &input.passed {
				if db.job_id(job)?.is_none() {
					return Err(HarnessError::UnknownName(format!("passed job {}", job)))
				}
			}
			job_config.inputs.push(JobInputConfig {
				name: input.name.to_string(),
				resource: Some(input.resource.to_string()),
				passed: input.passed.iter().map(|j| j.to_string()).collect(),
				version: match input.version {
					ExampleVersion::Latest => VersionConfig::Latest,
					ExampleVersion::Every => VersionConfig::Every,
					/* Unknown names still get an id so a missing pin can be expressed */
					ExampleVersion::Pinned(v) => VersionConfig::Pinned(versions.id(v)),
				},
			});
		}
		let configs = InputConfigs::from_job_config(&job_config, &db)?;

		Ok(Setup { db, configs, versions })
	}

	/// Resolves the example and compares the result to what's expected.
	pub fn run(&self) -> Result<Outcome, HarnessError> {
		let setup = self.setup()?;
		let status = setup.configs.resolve(&setup.db)?;
		let outcome = Outcome { status, setup };
		outcome.check(&self.expected)?;
		Ok(outcome)
	}
}

/// Everything an example resolves against.
#[derive(Debug, Clone)]
pub struct Setup {
	pub db: VersionsDB,
	pub configs: InputConfigs,
	pub versions: StringMapping,
}

impl Setup {
	pub fn job_id(&self, name: &str) -> Result<JobID, HarnessError> {
		self.db.job_id(name)?.ok_or_else(|| HarnessError::UnknownName(format!("job {}", name)))
	}

	pub fn version_id(&self, name: &str) -> Result<VersionID, HarnessError> {
		self.versions.get(name).ok_or_else(|| HarnessError::UnknownName(format!("version {}", name)))
	}

	fn reason(&self, reason: Reason) -> Result<MissingInputReason, HarnessError> {
		Ok(match reason {
			Reason::NoVersions => MissingInputReason::NoVersions,
			Reason::NoSatisfyingVersions => MissingInputReason::NoSatisfyingVersions,
			Reason::PinnedVersionUnavailable(v) => MissingInputReason::PinnedVersionUnavailable(self.version_id(v)?),
			Reason::NoSatisfiableBuilds(j) => MissingInputReason::NoSatisfiableBuilds(self.job_id(j)?),
		})
	}
}

#[derive(Debug, Clone)]
pub struct Outcome {
	pub status: ResolverStatus,
	pub setup: Setup,
}

impl Outcome {
	fn check(&self, expected: &Expected) -> Result<(), HarnessError> {
		match (expected, &self.status) {
			(Expected::Resolved(values), ResolverStatus::Resolved(mapping)) => {
				let mut want = BTreeMap::new();
				for (input, version) in values {
					want.insert(input.to_string(), self.setup.version_id(version)?);
				}
				let got: BTreeMap<String, VersionID> = mapping.iter().map(|(name, v)| (name.clone(), v.version_id)).collect();
				if want != got {
					return Err(HarnessError::Mismatch(format!("expected versions {}, got {}", self.render(&want), self.render(&got))))
				}
			},
			(Expected::Missing(reasons), ResolverStatus::Missing(missing)) => {
				let mut want = BTreeMap::new();
				for (input, reason) in reasons {
					want.insert(input.to_string(), self.setup.reason(*reason)?);
				}
				let got: BTreeMap<String, MissingInputReason> = missing.iter().map(|(name, r)| (name.to_string(), r)).collect();
				if want != got {
					return Err(HarnessError::Mismatch(format!("expected missing {:?}, got {:?}", want, got)))
				}
			},
			(Expected::Resolved(_), ResolverStatus::Missing(missing)) => {
				return Err(HarnessError::Mismatch(format!("expected to resolve, missing {}", missing)))
			},
			(Expected::Missing(_), ResolverStatus::Resolved(mapping)) => {
				let got: BTreeMap<String, VersionID> = mapping.iter().map(|(name, v)| (name.clone(), v.version_id)).collect();
				return Err(HarnessError::Mismatch(format!("expected missing inputs, resolved {}", self.render(&got))))
			},
		}
		Ok(())
	}

	fn render(&self, versions: &BTreeMap<String, VersionID>) -> String {
		let pairs = versions.iter()
			.map(|(input, v)| format!("{}={}", input, self.setup.versions.name(*v).unwrap_or("?")))
			.collect::<Vec<_>>();
		format!("{{{}}}", pairs.join(" "))
	}

	/// The build of `job` that vouched for the version of `input`.
	pub fn passed_build(&self, input: &str, job: &str) -> Result<Option<BuildID>, HarnessError> {
		let job = self.setup.job_id(job)?;
		Ok(self.status.mapping().and_then(|m| m.get(input)).and_then(|v| v.passed_build_ids.get(&job).copied()))
	}

	pub fn first_occurrence(&self, input: &str) -> Option<bool> {
		self.status.mapping().and_then(|m| m.get(input)).map(|v| v.first_occurrence)
	}
}

/// Gzipped JSON of a snapshot, as [`VersionsDB::from_gz_reader()`] expects.
pub fn gz_snapshot(db: &VersionsDB) -> Result<Vec<u8>, HarnessError> {
	let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
	gz.write_all(&serde_json::to_vec(db)?)?;
	Ok(gz.finish()?)
}
