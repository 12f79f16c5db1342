//! The read-only view of check and build history the resolver works from.
//!
//! The resolver never writes through this surface. [`crate::VersionsDB`] is the in-memory implementation,
//! anything backed by real storage only has to answer the same queries.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::candidates::{Version, VersionCandidates};
use crate::ids::*;

/// One observed state of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceVersion {
	pub id: VersionID,
	pub resource_id: ResourceID,
	pub check_order: CheckOrder,
	#[serde(default)]
	pub disabled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
	Pending,
	Started,
	#[default] Succeeded,
	Failed,
	Errored,
	Aborted,
}

/// One execution of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
	pub id: BuildID,
	pub job_id: JobID,
	#[serde(default)]
	pub status: BuildStatus,
}

/// A version a build consumed (input) or produced (output).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildVersion {
	pub build_id: BuildID,
	pub resource_id: ResourceID,
	pub version_id: VersionID,
	/// Input name, outputs are conventionally named after their resource.
	#[serde(default)]
	pub name: String,
}

/// A version of a resource as left behind by a build, with the check order needed to compare it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmVersion {
	pub resource_id: ResourceID,
	pub version_id: VersionID,
	pub check_order: CheckOrder,
}

/// Queries answered from a point-in-time snapshot of check and build history.
///
/// Every method may fail with [`crate::Error::History`] when the data behind it can't be read,
/// the resolver propagates that immediately.
pub trait History {
	fn job_id(&self, name: &str) -> crate::Result<Option<JobID>>;

	fn resource_id(&self, name: &str) -> crate::Result<Option<ResourceID>>;

	/// All enabled versions of a resource, highest check order first.
	fn all_versions_of_resource(&self, resource: ResourceID) -> crate::Result<Vec<ResourceVersion>>;

	/// The enabled version with the highest check order, `None` when there is no enabled version.
	fn latest_version_of_resource(&self, resource: ResourceID) -> crate::Result<Option<ResourceVersion>> {
		Ok(self.all_versions_of_resource(resource)?.into_iter().next())
	}

	/// The version `version` of `resource` if it exists and is enabled.
	fn find_version_of_resource(&self, resource: ResourceID, version: VersionID) -> crate::Result<Option<ResourceVersion>>;

	/// Successful builds of a job, newest first.
	fn successful_builds(&self, job: JobID) -> crate::Result<Vec<BuildID>>;

	/// The version of each resource a build left behind.
	///
	/// Inputs are applied first and outputs after, each in ascending check order, so an output replaces an input of the
	/// same resource and the newest output of a resource wins. Disabled versions are left out before that, so they
	/// never hide an enabled version of the same resource.
	fn build_outputs(&self, build: BuildID) -> crate::Result<BTreeMap<ResourceID, AlgorithmVersion>>;

	/// The highest check order version any build of `job`, whatever its status, consumed as `input_name`.
	///
	/// Re-running an older version doesn't lower it. The check order is reported even when that version has since
	/// been disabled.
	fn latest_input_version(&self, job: JobID, input_name: &str) -> crate::Result<Option<AlgorithmVersion>>;

	/// `false` once `version` has been an input named `input_name`, or any output, of a build of `job`.
	fn is_version_first_occurrence(&self, version: VersionID, job: JobID, input_name: &str) -> crate::Result<bool>;

	/// Versions of `resource` that came out of a successful build of *every* job in `jobs`,
	/// each tagged with the builds of each job that passed it.
	///
	/// An empty `jobs` is no constraint at all and returns every enabled version.
	fn versions_of_resource_passed_jobs(&self, resource: ResourceID, jobs: &JobSet) -> crate::Result<VersionCandidates> {
		if jobs.is_empty() {
			return Ok(
				self.all_versions_of_resource(resource)?
					.into_iter()
					.map(|v| Version::new(v.id, v.check_order))
					.collect()
			)
		}

		let mut intersected: Option<VersionCandidates> = None;
		for job in jobs.sorted() {
			let mut passed = VersionCandidates::new();
			for build in self.successful_builds(job)? {
				let outputs = self.build_outputs(build)?;
				let Some(output) = outputs.get(&resource) else { continue };
				/* Disabled or unknown versions never become candidates */
				if let Some(v) = self.find_version_of_resource(resource, output.version_id)? {
					passed.add(Version::new(v.id, v.check_order).passed_by(job, build));
				}
			}

			let next = match intersected {
				Some(previous) => previous.intersect_by_version(&passed),
				None => passed,
			};
			if next.is_empty() {
				return Ok(next)
			}
			intersected = Some(next);
		}

		Ok(intersected.unwrap_or_default())
	}
}
