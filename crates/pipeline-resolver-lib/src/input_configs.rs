//! One resolution request per job input, by id.

use crate::history::History;
use crate::ids::*;
use crate::job_config::{JobConfig, VersionConfig};
use crate::mapping::{InputMapping, MissingInputReasons, ResolverStatus};
use crate::Error::{NotFound, Validation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputConfig {
	pub name: String,
	pub resource_id: ResourceID,
	/// Jobs the version has to have come through, empty for no constraint.
	pub passed: JobSet,
	/// Takes priority over `use_every_version`.
	pub pinned_version_id: Option<VersionID>,
	pub use_every_version: bool,
	/// The job the input belongs to.
	pub job_id: JobID,
}

impl InputConfig {
	pub fn new(name: impl Into<String>, resource_id: ResourceID, job_id: JobID) -> Self {
		Self {
			name: name.into(),
			resource_id,
			passed: JobSet::new(),
			pinned_version_id: None,
			use_every_version: false,
			job_id,
		}
	}

	pub fn passed(mut self, passed: JobSet) -> Self {
		self.passed = passed;
		self
	}

	pub fn pinned(mut self, version: VersionID) -> Self {
		self.pinned_version_id = Some(version);
		self
	}

	pub fn every_version(mut self) -> Self {
		self.use_every_version = true;
		self
	}
}

/// The inputs of one job, names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputConfigs {
	inputs: Vec<InputConfig>,
}

impl InputConfigs {
	/// # Errors
	/// - [`Validation`](crate::error::Error::Validation) when two inputs share a name.
	pub fn new(inputs: Vec<InputConfig>) -> crate::Result<Self> {
		for (i, input) in inputs.iter().enumerate() {
			if inputs[..i].iter().any(|other| other.name == input.name) {
				return Err(Validation(format!("input {} is declared more than once", input.name)))
			}
		}
		Ok(Self { inputs })
	}

	/// Maps a job's named inputs to ids through `history`.
	///
	/// # Errors
	/// - [`NotFound`](crate::error::Error::NotFound) when the job, an input's resource or a passed job isn't known.
	/// - [`Validation`](crate::error::Error::Validation) when two inputs share a name.
	pub fn from_job_config<H: History + ?Sized>(job: &JobConfig, history: &H) -> crate::Result<Self> {
		let job_id = history.job_id(&job.name)?.ok_or_else(|| NotFound(format!("job {}", job.name)))?;

		let mut inputs = Vec::with_capacity(job.inputs.len());
		for input in &job.inputs {
			let resource_id = history.resource_id(input.resource())?
				.ok_or_else(|| NotFound(format!("resource {} of input {}", input.resource(), input.name)))?;

			let mut passed = JobSet::new();
			for name in &input.passed {
				let passed_job = history.job_id(name)?.ok_or_else(|| NotFound(format!("passed job {} of input {}", name, input.name)))?;
				passed.insert(passed_job);
			}

			let mut config = InputConfig::new(&input.name, resource_id, job_id).passed(passed);
			config = match input.version {
				VersionConfig::Latest => config,
				VersionConfig::Every => config.every_version(),
				VersionConfig::Pinned(version) => config.pinned(version),
			};
			inputs.push(config);
		}

		Self::new(inputs)
	}

	pub fn iter(&self) -> std::slice::Iter<'_, InputConfig> {
		self.inputs.iter()
	}

	pub fn get(&self, index: usize) -> Option<&InputConfig> {
		self.inputs.get(index)
	}

	pub fn len(&self) -> usize {
		self.inputs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inputs.is_empty()
	}

	/// Resolves all inputs together, see [`crate::resolver::resolve()`].
	pub fn resolve<H: History + ?Sized>(&self, history: &H) -> crate::Result<ResolverStatus> {
		crate::resolver::resolve(history, self)
	}

	/// Resolves every input on its own, ignoring the others.
	///
	/// Gives the version each input would get if it were the only one, plus why the rest get none.
	pub fn resolve_independently<H: History + ?Sized>(&self, history: &H) -> crate::Result<(InputMapping, MissingInputReasons)> {
		let mut mapping = InputMapping::new();
		let mut missing = MissingInputReasons::default();

		for input in &self.inputs {
			let alone = InputConfigs { inputs: vec![input.clone()] };
			match crate::resolver::resolve(history, &alone)? {
				ResolverStatus::Resolved(resolved) => mapping.extend(resolved),
				ResolverStatus::Missing(reasons) => missing.extend(reasons),
			}
		}

		Ok((mapping, missing))
	}
}

impl<'a> IntoIterator for &'a InputConfigs {
	type Item = &'a InputConfig;
	type IntoIter = std::slice::Iter<'a, InputConfig>;

	fn into_iter(self) -> Self::IntoIter {
		self.inputs.iter()
	}
}

impl std::ops::Index<usize> for InputConfigs {
	type Output = InputConfig;

	fn index(&self, index: usize) -> &Self::Output {
		&self.inputs[index]
	}
}
