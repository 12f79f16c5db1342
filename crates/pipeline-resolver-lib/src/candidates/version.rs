use std::collections::HashMap;

use crate::ids::*;

/// A version as seen by the resolver, tagged with the builds that passed it.
///
/// Not to be confused with [`crate::history::ResourceVersion`] which is the stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct Version {
	pub id: VersionID,
	pub check_order: CheckOrder,
	/// Which builds of each job are known to have produced or forwarded this version.
	passed: HashMap<JobID, BuildSet>,
}

impl Version {
	pub fn new(id: VersionID, check_order: CheckOrder) -> Self {
		Self { id, check_order, passed: HashMap::new() }
	}

	/// Records that `build` of `job` passed this version.
	pub fn passed_by(mut self, job: JobID, build: BuildID) -> Self {
		self.passed.entry(job).or_default().insert(build);
		self
	}

	pub fn builds_of(&self, job: JobID) -> Option<&BuildSet> {
		self.passed.get(&job)
	}

	pub fn passed_jobs(&self) -> impl Iterator<Item = (JobID, &BuildSet)> {
		self.passed.iter().map(|(job, builds)| (*job, builds))
	}

	/// Whether this version could have come from any of `builds` of `job`.
	///
	/// A version with no record for `job` hasn't been constrained by it yet and passes any build.
	pub fn passed_any(&self, job: JobID, builds: &BuildSet) -> bool {
		match self.passed.get(&job) {
			Some(passed) if !passed.is_empty() => passed.overlaps(builds),
			_ => true,
		}
	}

	/// Unions the passed builds of `other` into this version.
	pub fn merge(&mut self, other: &Version) {
		for (job, builds) in &other.passed {
			let merged = match self.passed.get(job) {
				Some(existing) => existing.union(builds),
				None => builds.clone(),
			};
			self.passed.insert(*job, merged);
		}
	}

	/// Sort key, check order first so a newer check always ranks higher than a bigger id.
	pub(crate) fn order_key(&self) -> (CheckOrder, VersionID) {
		(self.check_order, self.id)
	}
}

/// Finds where `key` belongs in `items` sorted *descending* by `key_of`.
///
/// `Ok` is the index of an equal item, `Err` is the insertion point that keeps the order.
pub fn descending_position<T, K: Ord>(items: &[T], key: &K, key_of: impl Fn(&T) -> K) -> Result<usize, usize> {
	items.binary_search_by(|item| key.cmp(&key_of(item)))
}
