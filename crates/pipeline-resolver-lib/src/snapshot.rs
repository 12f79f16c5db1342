//! # Versions snapshot
//!
//! A point-in-time copy of check and build history held in memory.
//! Everything the resolver asks for is answered from indexes built once when the snapshot is created or loaded,
//! so one snapshot can serve any number of resolutions, concurrently or not.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::history::*;
use crate::ids::*;

/// The raw records of a snapshot, the shape it is stored in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecords {
	#[serde(default)]
	pub jobs: BTreeMap<String, JobID>,
	#[serde(default)]
	pub resources: BTreeMap<String, ResourceID>,
	#[serde(default)]
	pub versions: Vec<ResourceVersion>,
	#[serde(default)]
	pub builds: Vec<Build>,
	#[serde(default)]
	pub build_inputs: Vec<BuildVersion>,
	#[serde(default)]
	pub build_outputs: Vec<BuildVersion>,
}

#[derive(Debug, Clone, Default)]
struct Index {
	versions: HashMap<VersionID, ResourceVersion>,
	/// Enabled only, highest check order first.
	enabled_by_resource: HashMap<ResourceID, Vec<ResourceVersion>>,
	/// Newest first.
	successful_builds: HashMap<JobID, Vec<BuildID>>,
	/// Highest check order each job has consumed under each input name, any build status.
	highest_input: HashMap<(JobID, String), AlgorithmVersion>,
	outputs_of_build: HashMap<BuildID, BTreeMap<ResourceID, AlgorithmVersion>>,
	used_as_input: HashSet<(JobID, VersionID, String)>,
	used_as_output: HashSet<(JobID, VersionID)>,
}

/// In-memory [`History`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "SnapshotRecords", into = "SnapshotRecords")]
pub struct VersionsDB {
	records: SnapshotRecords,
	index: Index,
}

impl From<SnapshotRecords> for VersionsDB {
	fn from(records: SnapshotRecords) -> Self {
		Self::new(records)
	}
}

impl From<VersionsDB> for SnapshotRecords {
	fn from(db: VersionsDB) -> Self {
		db.records
	}
}

impl VersionsDB {
	pub fn new(records: SnapshotRecords) -> Self {
		let index = Index::build(&records);
		Self { records, index }
	}

	pub fn builder() -> SnapshotBuilder {
		SnapshotBuilder::default()
	}

	pub fn records(&self) -> &SnapshotRecords {
		&self.records
	}

	/// Reads a snapshot from plain JSON.
	///
	/// # Errors
	/// - [`SerdeJSON`](crate::error::Error::SerdeJSON) when deserializing.
	pub fn from_json_reader(reader: impl Read) -> crate::Result<Self> {
		let records: SnapshotRecords = serde_json::from_reader(reader)?;
		Ok(Self::new(records))
	}

	/// Reads a snapshot from gzip compressed JSON, the format history exports are shipped in.
	pub fn from_gz_reader(reader: impl Read) -> crate::Result<Self> {
		Self::from_json_reader(flate2::read::GzDecoder::new(reader))
	}

	/// Loads a snapshot previously saved with [`VersionsDB::save_to_disk()`].
	///
	/// # Errors
	/// - [`IO`](crate::error::Error::IO) when opening or reading from the file.
	/// - [`Bincode`](crate::error::Error::Bincode) when deserializing the file.
	pub fn load_from_disk(config: &crate::Config, name: impl AsRef<str>) -> crate::Result<Self> {
		let path = Self::path_for(config, name.as_ref());
		Self::load_by_file(path)
	}

	pub fn load_by_file(path: impl AsRef<Path>) -> crate::Result<Self> {
		let file = std::fs::File::open(path)?;
		Ok(bincode::deserialize_from(std::io::BufReader::new(file))?)
	}

	/// Caches the snapshot in the data directory as bincode.
	///
	/// # Errors
	/// - [`IO`](crate::error::Error::IO) when opening the file, writing to it or creating it's parent directories.
	/// - [`Bincode`](crate::error::Error::Bincode) when serializing the file.
	pub fn save_to_disk(&self, config: &crate::Config, name: impl AsRef<str>) -> crate::Result<()> {
		let path = Self::path_for(config, name.as_ref());
		std::fs::create_dir_all(path.with_file_name(""))?;
		let file = std::fs::File::create(path)?;
		bincode::serialize_into(std::io::BufWriter::new(file), &self.records)?;
		Ok(())
	}

	fn path_for(config: &crate::Config, name: &str) -> std::path::PathBuf {
		config.data_dir().join("snapshots").join(format!("{}.bin", name))
	}
}

impl Index {
	fn build(records: &SnapshotRecords) -> Self {
		let mut index = Index {
			versions: records.versions.iter().map(|v| (v.id, *v)).collect(),
			..Default::default()
		};

		for version in records.versions.iter().filter(|v| !v.disabled) {
			index.enabled_by_resource.entry(version.resource_id).or_default().push(*version);
		}
		for versions in index.enabled_by_resource.values_mut() {
			versions.sort_by(|a, b| (b.check_order, b.id).cmp(&(a.check_order, a.id)));
		}

		let mut job_of_build = HashMap::<BuildID, JobID>::new();
		for build in &records.builds {
			job_of_build.insert(build.id, build.job_id);
			if build.status == BuildStatus::Succeeded {
				index.successful_builds.entry(build.job_id).or_default().push(build.id);
			}
		}
		for builds in index.successful_builds.values_mut() {
			builds.sort_unstable_by(|a, b| b.cmp(a));
		}

		let known = |kind: &str, record: &BuildVersion| -> Option<(JobID, ResourceVersion)> {
			let Some(job) = job_of_build.get(&record.build_id) else {
				log::warn!("Ignoring {} of unknown build {}", kind, record.build_id);
				return None
			};
			match index.versions.get(&record.version_id) {
				Some(v) if v.resource_id == record.resource_id => Some((*job, *v)),
				_ => {
					log::warn!("Ignoring {} of build {}, version {} of resource {} isn't in the snapshot", kind, record.build_id, record.version_id, record.resource_id);
					None
				},
			}
		};

		let mut inputs = Vec::<(JobID, BuildVersion, ResourceVersion)>::new();
		for record in &records.build_inputs {
			if let Some((job, version)) = known("input", record) {
				inputs.push((job, record.clone(), version));
				index.used_as_input.insert((job, record.version_id, record.name.clone()));
			}
		}
		let mut outputs = Vec::<(BuildVersion, ResourceVersion)>::new();
		for record in &records.build_outputs {
			if let Some((job, version)) = known("output", record) {
				outputs.push((record.clone(), version));
				index.used_as_output.insert((job, record.version_id));
			}
		}

		/* Inputs first, then outputs, each oldest check first so the last write per resource wins */
		inputs.sort_by_key(|(_, _, v)| (v.check_order, v.id));
		outputs.sort_by_key(|(_, v)| (v.check_order, v.id));

		for (job, record, version) in &inputs {
			/* Disabled versions still count, progression never goes back below them */
			index.highest_input.insert((*job, record.name.clone()), AlgorithmVersion {
				resource_id: record.resource_id,
				version_id: version.id,
				check_order: version.check_order,
			});
		}

		let enabled_records = inputs.iter().map(|(_, record, version)| (record, version))
			.chain(outputs.iter().map(|(record, version)| (record, version)))
			.filter(|(_, version)| !version.disabled);
		for (record, version) in enabled_records {
			index.outputs_of_build.entry(record.build_id).or_default().insert(record.resource_id, AlgorithmVersion {
				resource_id: record.resource_id,
				version_id: version.id,
				check_order: version.check_order,
			});
		}

		index
	}
}

impl History for VersionsDB {
	fn job_id(&self, name: &str) -> crate::Result<Option<JobID>> {
		Ok(self.records.jobs.get(name).copied())
	}

	fn resource_id(&self, name: &str) -> crate::Result<Option<ResourceID>> {
		Ok(self.records.resources.get(name).copied())
	}

	fn all_versions_of_resource(&self, resource: ResourceID) -> crate::Result<Vec<ResourceVersion>> {
		Ok(self.index.enabled_by_resource.get(&resource).cloned().unwrap_or_default())
	}

	fn latest_version_of_resource(&self, resource: ResourceID) -> crate::Result<Option<ResourceVersion>> {
		Ok(self.index.enabled_by_resource.get(&resource).and_then(|v| v.first()).copied())
	}

	fn find_version_of_resource(&self, resource: ResourceID, version: VersionID) -> crate::Result<Option<ResourceVersion>> {
		Ok(
			self.index.versions.get(&version)
				.filter(|v| v.resource_id == resource && !v.disabled)
				.copied()
		)
	}

	fn successful_builds(&self, job: JobID) -> crate::Result<Vec<BuildID>> {
		Ok(self.index.successful_builds.get(&job).cloned().unwrap_or_default())
	}

	fn build_outputs(&self, build: BuildID) -> crate::Result<BTreeMap<ResourceID, AlgorithmVersion>> {
		Ok(self.index.outputs_of_build.get(&build).cloned().unwrap_or_default())
	}

	fn latest_input_version(&self, job: JobID, input_name: &str) -> crate::Result<Option<AlgorithmVersion>> {
		Ok(self.index.highest_input.get(&(job, input_name.to_string())).copied())
	}

	fn is_version_first_occurrence(&self, version: VersionID, job: JobID, input_name: &str) -> crate::Result<bool> {
		Ok(
			!self.index.used_as_input.contains(&(job, version, input_name.to_string()))
			&& !self.index.used_as_output.contains(&(job, version))
		)
	}
}

/// Assembles a [`VersionsDB`] record by record.
///
/// Jobs and resources are interned by name, versions and builds keep the ids they are given.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
	records: SnapshotRecords,
}

impl SnapshotBuilder {
	pub fn job(&mut self, name: impl AsRef<str>) -> JobID {
		intern(&mut self.records.jobs, name.as_ref())
	}

	pub fn resource(&mut self, name: impl AsRef<str>) -> ResourceID {
		intern(&mut self.records.resources, name.as_ref())
	}

	pub fn version(&mut self, resource: ResourceID, id: VersionID, check_order: CheckOrder) -> &mut Self {
		self.records.versions.push(ResourceVersion { id, resource_id: resource, check_order, disabled: false });
		self
	}

	pub fn disabled_version(&mut self, resource: ResourceID, id: VersionID, check_order: CheckOrder) -> &mut Self {
		self.records.versions.push(ResourceVersion { id, resource_id: resource, check_order, disabled: true });
		self
	}

	pub fn build(&mut self, job: JobID, id: BuildID, status: BuildStatus) -> &mut Self {
		if !self.records.builds.iter().any(|b| b.id == id) {
			self.records.builds.push(Build { id, job_id: job, status });
		}
		self
	}

	pub fn input(&mut self, build: BuildID, resource: ResourceID, version: VersionID, name: impl Into<String>) -> &mut Self {
		self.records.build_inputs.push(BuildVersion { build_id: build, resource_id: resource, version_id: version, name: name.into() });
		self
	}

	pub fn output(&mut self, build: BuildID, resource: ResourceID, version: VersionID) -> &mut Self {
		let name = self.records.resources.iter()
			.find(|(_, id)| **id == resource)
			.map(|(name, _)| name.clone())
			.unwrap_or_default();
		self.records.build_outputs.push(BuildVersion { build_id: build, resource_id: resource, version_id: version, name });
		self
	}

	pub fn finish(self) -> VersionsDB {
		VersionsDB::new(self.records)
	}
}

fn intern(table: &mut BTreeMap<String, i32>, name: &str) -> i32 {
	if let Some(id) = table.get(name) {
		return *id
	}
	let id = table.values().copied().max().unwrap_or(0) + 1;
	table.insert(name.to_string(), id);
	id
}
