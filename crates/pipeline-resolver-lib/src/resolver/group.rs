//! Backtracking search over the builds of the jobs a group of inputs shares.
//!
//! A job listed by two or more inputs of a group is a *correlation job*: all of those inputs must take their version
//! from the same successful build of it. Correlation jobs are decided one at a time in id order, trying builds
//! newest first, or in progression order when every version inputs are involved. Choosing a build prunes the
//! candidates of every input involved, if one of them runs dry the build is a mismatch. Otherwise the search moves on
//! to the next job, and if that fails the constraints added for this build are rolled back and the next build is
//! tried.

use std::collections::BTreeMap;

use crate::candidates::{Checkpoint, VersionCandidates};
use crate::history::{AlgorithmVersion, History};
use crate::ids::*;
use crate::input_configs::InputConfigs;

pub(super) struct GroupSearch<'a, H: History + ?Sized> {
	history: &'a H,
	inputs: &'a InputConfigs,
	candidates: &'a mut [VersionCandidates],
	currents: &'a [Option<AlgorithmVersion>],
	/// Correlation jobs with the inputs that list them, by job id.
	jobs: Vec<(JobID, Vec<usize>)>,
	chosen: BTreeMap<JobID, BuildID>,
}

/// The version a build gives each involved input, `None` where it has nothing for the input's resource.
type Signature = Vec<Option<VersionID>>;

impl<'a, H: History + ?Sized> GroupSearch<'a, H> {
	pub fn new(
		history: &'a H,
		inputs: &'a InputConfigs,
		group: &[usize],
		candidates: &'a mut [VersionCandidates],
		currents: &'a [Option<AlgorithmVersion>],
	) -> Self {
		let mut listed_by = BTreeMap::<JobID, Vec<usize>>::new();
		for i in group {
			for job in inputs[*i].passed.iter() {
				listed_by.entry(job).or_default().push(*i);
			}
		}

		let jobs = listed_by.into_iter()
			.filter(|(_, listing)| listing.len() > 1)
			.map(|(job, mut listing)| {
				listing.sort_unstable();
				(job, listing)
			})
			.collect();

		Self { history, inputs, candidates, currents, jobs, chosen: BTreeMap::new() }
	}

	/// No two inputs share a job, nothing to search.
	pub fn is_trivial(&self) -> bool {
		self.jobs.is_empty()
	}

	pub fn involved_inputs(&self) -> Vec<usize> {
		let mut involved: Vec<usize> = self.jobs.iter().flat_map(|(_, inputs)| inputs.iter().copied()).collect();
		involved.sort_unstable();
		involved.dedup();
		involved
	}

	/// The lowest correlation job of each involved input, the one reported when the search fails.
	pub fn first_job_of_inputs(&self) -> BTreeMap<usize, JobID> {
		let mut first = BTreeMap::new();
		for (job, inputs) in &self.jobs {
			for i in inputs {
				first.entry(*i).or_insert(*job);
			}
		}
		first
	}

	/// Runs the search, returning the build chosen for each correlation job.
	///
	/// On success the candidates are left pruned to the chosen builds, on failure they are as they were.
	pub fn run(mut self) -> crate::Result<Option<BTreeMap<JobID, BuildID>>> {
		if self.try_job(0)? {
			Ok(Some(self.chosen))
		} else {
			Ok(None)
		}
	}

	fn try_job(&mut self, depth: usize) -> crate::Result<bool> {
		let Some((job, involved)) = self.jobs.get(depth).cloned() else {
			return Ok(true)
		};

		let mut doomed = Vec::<Signature>::new();
		for (build, outputs) in self.ordered_builds(job, &involved)? {
			let signature: Signature = involved.iter()
				.map(|i| outputs.get(&self.inputs[*i].resource_id).map(|o| o.version_id))
				.collect();

			/* Same versions as a build that already failed at this depth, it would fail the same way */
			if doomed.contains(&signature) {
				log::trace!("{:depth$}job {} build {}: same outputs as a failed build, skipping", "", job, build, depth = depth * 2);
				continue
			}
			if signature.iter().any(Option::is_none) {
				log::trace!("{:depth$}job {} build {}: missing an output for a correlated input", "", job, build, depth = depth * 2);
				doomed.push(signature);
				continue
			}

			log::trace!("{:depth$}job {} build {}: trying", "", job, build, depth = depth * 2);
			let checkpoints: Vec<(usize, Checkpoint)> = involved.iter().map(|i| (*i, self.candidates[*i].checkpoint())).collect();
			for i in &involved {
				self.candidates[*i].prune_versions_of_other_build_ids(job, BuildSet::from([build]));
			}

			if let Some(empty) = involved.iter().find(|i| self.candidates[**i].is_empty()) {
				log::trace!("{:depth$}job {} build {}: mismatch, no candidates left for {}", "", job, build, self.inputs[*empty].name, depth = depth * 2);
			} else {
				self.chosen.insert(job, build);
				if self.try_job(depth + 1)? {
					return Ok(true)
				}
				self.chosen.remove(&job);
				log::trace!("{:depth$}job {} build {}: backtracking", "", job, build, depth = depth * 2);
			}

			for (i, checkpoint) in checkpoints {
				self.candidates[i].rollback(checkpoint);
			}
			doomed.push(signature);
		}

		Ok(false)
	}

	/// Successful builds of `job` with their outputs, in the order they should be tried.
	///
	/// Newest first, unless involved inputs step through every version. Then builds are ordered to continue those
	/// inputs' progressions, compared input by input: the next check order up first, then the current version, then
	/// older ones, builds without the resource last. Newer builds still go first within a tie.
	fn ordered_builds(&self, job: JobID, involved: &[usize]) -> crate::Result<Vec<(BuildID, BTreeMap<ResourceID, AlgorithmVersion>)>> {
		let mut builds = Vec::new();
		for build in self.history.successful_builds(job)? {
			builds.push((build, self.history.build_outputs(build)?));
		}

		let progressions: Vec<(ResourceID, CheckOrder)> = involved.iter()
			.filter_map(|i| {
				let input = &self.inputs[*i];
				match self.currents[*i] {
					Some(current) if input.use_every_version => Some((input.resource_id, current.check_order)),
					_ => None,
				}
			})
			.collect();
		if !progressions.is_empty() {
			builds.sort_by_cached_key(|(build, outputs)| {
				let ranks: Vec<(u8, CheckOrder)> = progressions.iter()
					.map(|(resource, current)| progression_rank(outputs.get(resource), *current))
					.collect();
				(ranks, std::cmp::Reverse(*build))
			});
		}

		Ok(builds)
	}
}

fn progression_rank(output: Option<&AlgorithmVersion>, current: CheckOrder) -> (u8, CheckOrder) {
	match output {
		Some(o) if o.check_order > current => (0, o.check_order),
		Some(o) if o.check_order == current => (1, 0),
		Some(o) => (2, -o.check_order),
		None => (3, 0),
	}
}
