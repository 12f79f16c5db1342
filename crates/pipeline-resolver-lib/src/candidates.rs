//! In-memory view of the versions an input may use.
//!
//! A [`VersionCandidates`] holds every version of a resource that is still in the running, newest check order first,
//! along with a set of [`Constraints`] narrowing it down. Narrowing never removes a version from the underlying list,
//! it only adds a constraint, so a search can back out of a decision with [`VersionCandidates::rollback()`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::ids::*;

mod version;
pub use version::Version;
pub use version::descending_position;

mod constraints;
pub use constraints::Constraint;
pub use constraints::Constraints;

mod iter;
pub use iter::VersionsIter;

#[derive(Debug, Clone, Default)]
pub struct VersionCandidates {
	/// Sorted descending by check order, then id.
	versions: Vec<Version>,
	constraints: Constraints,
	/// Every build of each job seen across the merged versions.
	build_ids: HashMap<JobID, BuildSet>,
}

/// Position in a candidate set's constraint list to return to when backtracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

impl VersionCandidates {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts `version` keeping check order, merging it into an existing entry with the same id.
	pub fn add(&mut self, version: Version) {
		for (job, builds) in version.passed_jobs() {
			let merged = match self.build_ids.get(&job) {
				Some(existing) => existing.union(builds),
				None => builds.clone(),
			};
			self.build_ids.insert(job, merged);
		}

		match descending_position(&self.versions, &version.order_key(), Version::order_key) {
			Ok(i) => self.versions[i].merge(&version),
			Err(i) => self.versions.insert(i, version),
		}
	}

	/// Adds every version and constraint of `other`.
	pub fn merge(&mut self, other: &VersionCandidates) {
		for version in &other.versions {
			self.add(version.clone());
		}
		self.constraints.extend(&other.constraints);
	}

	/// Keeps only versions present in both sets, with the passed builds of both sides.
	pub fn intersect_by_version(&self, other: &VersionCandidates) -> VersionCandidates {
		let theirs: HashMap<VersionID, &Version> = other.versions.iter().map(|v| (v.id, v)).collect();

		let mut intersected = VersionCandidates::new();
		for version in &self.versions {
			if let Some(matching) = theirs.get(&version.id) {
				let mut merged = version.clone();
				merged.merge(matching);
				intersected.add(merged);
			}
		}
		intersected.constraints.extend(&self.constraints);
		intersected.constraints.extend(&other.constraints);
		intersected
	}

	/// Only accept versions that came out of one of `builds` of `job`.
	///
	/// This is how inputs sharing an upstream job are tied to the same build of it.
	pub fn prune_versions_of_other_build_ids(&mut self, job: JobID, builds: BuildSet) {
		self.constraints.and(Arc::new(move |v: &Version| v.passed_any(job, &builds)));
	}

	pub fn add_constraint(&mut self, constraint: Constraint) {
		self.constraints.and(constraint);
	}

	/// Narrows to the single version `id`, keeping its merged passed builds.
	pub fn for_version(&self, id: VersionID) -> VersionCandidates {
		VersionCandidates {
			versions: self.versions.iter().filter(|v| v.id == id).cloned().collect(),
			constraints: self.constraints.clone(),
			build_ids: self.build_ids.clone(),
		}
	}

	pub fn iter(&self) -> VersionsIter<'_> {
		VersionsIter::new(self)
	}

	pub fn version_ids(&self) -> impl Iterator<Item = VersionID> + '_ {
		self.iter().map(|v| v.id)
	}

	pub fn is_empty(&self) -> bool {
		self.iter().peek().is_none()
	}

	pub fn len(&self) -> usize {
		self.iter().count()
	}

	pub fn get(&self, id: VersionID) -> Option<&Version> {
		self.iter().find(|v| v.id == id)
	}

	/// The acceptable version with the highest check order.
	pub fn newest(&self) -> Option<&Version> {
		self.iter().next()
	}

	/// The acceptable version with the smallest check order above `check_order`.
	pub fn next_after(&self, check_order: CheckOrder) -> Option<&Version> {
		self.iter().take_while(|v| v.check_order > check_order).last()
	}

	/// The acceptable version with the largest check order not above `check_order`.
	pub fn at_or_before(&self, check_order: CheckOrder) -> Option<&Version> {
		self.iter().find(|v| v.check_order <= check_order)
	}

	/// Every build of `job` that passed any version, regardless of constraints.
	pub fn build_ids(&self, job: JobID) -> Option<&BuildSet> {
		self.build_ids.get(&job)
	}

	pub fn constraints(&self) -> &Constraints {
		&self.constraints
	}

	pub fn checkpoint(&self) -> Checkpoint {
		Checkpoint(self.constraints.len())
	}

	/// Drops every constraint added since `checkpoint`.
	pub fn rollback(&mut self, checkpoint: Checkpoint) {
		self.constraints.truncate(checkpoint.0);
	}

	pub(crate) fn all_versions(&self) -> &[Version] {
		&self.versions
	}
}

impl FromIterator<Version> for VersionCandidates {
	fn from_iter<I: IntoIterator<Item = Version>>(iter: I) -> Self {
		let mut candidates = VersionCandidates::new();
		for version in iter {
			candidates.add(version);
		}
		candidates
	}
}
