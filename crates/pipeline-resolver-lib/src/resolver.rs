//! # Resolver
//!
//! Picks one version for every input of a job.
//!
//! Resolution happens in three passes:
//! 1. Every input gets a baseline candidate set from its pin and passed jobs alone.
//!    Inputs that can't be satisfied even on their own fail here, before any searching.
//! 2. Inputs sharing a passed job are grouped, and each group searches for a combination of upstream builds
//!    that all its inputs agree on.
//! 3. Each input takes the newest remaining candidate, or the next one along for every version inputs.
//!
//! Nothing is mapped unless every input resolves.

use std::collections::BTreeMap;

use petgraph::unionfind::UnionFind;

use crate::candidates::{Version, VersionCandidates};
use crate::history::{AlgorithmVersion, History};
use crate::ids::*;
use crate::input_configs::{InputConfig, InputConfigs};
use crate::mapping::*;

mod group;
use group::GroupSearch;

/// Resolves all `inputs` together against `history`.
///
/// # Errors
/// Only errors from `history` are returned, an unsatisfiable job is [`ResolverStatus::Missing`].
pub fn resolve<H: History + ?Sized>(history: &H, inputs: &InputConfigs) -> crate::Result<ResolverStatus> {
	let mut missing = MissingInputReasons::default();

	let mut candidates = Vec::with_capacity(inputs.len());
	for input in inputs {
		match baseline(history, input)? {
			Ok(baseline) => {
				log::debug!("Input {} starts with {} candidates", input.name, baseline.len());
				candidates.push(baseline);
			},
			Err(reason) => {
				log::debug!("Input {} can't be satisfied: {}", input.name, reason);
				missing.register(&input.name, reason);
				candidates.push(VersionCandidates::new());
			},
		}
	}
	if !missing.is_empty() {
		return Ok(ResolverStatus::Missing(missing))
	}

	let mut currents = Vec::with_capacity(inputs.len());
	for input in inputs {
		currents.push(current_version(history, input)?);
	}

	let mut vouching_builds = vec![BTreeMap::<JobID, BuildID>::new(); inputs.len()];
	for group in correlation_groups(inputs) {
		let search = GroupSearch::new(history, inputs, &group, &mut candidates, &currents);
		if search.is_trivial() {
			continue
		}
		let involved = search.involved_inputs();
		let first_jobs = search.first_job_of_inputs();

		match search.run()? {
			Some(chosen) => {
				log::debug!("Correlated inputs {:?} on builds {:?}", involved, chosen);
				for i in involved {
					for (job, build) in &chosen {
						if inputs[i].passed.contains(*job) {
							vouching_builds[i].insert(*job, *build);
						}
					}
				}
			},
			None => {
				log::debug!("No builds satisfy correlated inputs {:?}", involved);
				for (i, job) in first_jobs {
					missing.register(&inputs[i].name, MissingInputReason::NoSatisfiableBuilds(job));
				}
			},
		}
	}
	if !missing.is_empty() {
		return Ok(ResolverStatus::Missing(missing))
	}

	let mut mapping = InputMapping::new();
	for (i, input) in inputs.iter().enumerate() {
		let Some(version) = select(&candidates[i], input, currents[i]) else {
			missing.register(&input.name, MissingInputReason::NoSatisfyingVersions);
			continue
		};

		let mut passed_build_ids = vouching_builds[i].clone();
		for job in input.passed.sorted() {
			if !passed_build_ids.contains_key(&job) {
				if let Some(build) = version.builds_of(job).and_then(|b| b.newest()) {
					passed_build_ids.insert(job, build);
				}
			}
		}

		mapping.insert(input.name.clone(), InputVersion {
			resource_id: input.resource_id,
			version_id: version.id,
			first_occurrence: history.is_version_first_occurrence(version.id, input.job_id, &input.name)?,
			passed_build_ids,
		});
	}
	if !missing.is_empty() {
		return Ok(ResolverStatus::Missing(missing))
	}

	Ok(ResolverStatus::Resolved(mapping))
}

/// Candidates for `input` from its own configuration, or why there can't be any.
fn baseline<H: History + ?Sized>(history: &H, input: &InputConfig) -> crate::Result<Result<VersionCandidates, MissingInputReason>> {
	if let Some(pinned) = input.pinned_version_id {
		if history.find_version_of_resource(input.resource_id, pinned)?.is_none() {
			return Ok(Err(MissingInputReason::PinnedVersionUnavailable(pinned)))
		}
		let candidates = history.versions_of_resource_passed_jobs(input.resource_id, &input.passed)?.for_version(pinned);
		if candidates.is_empty() {
			return Ok(Err(MissingInputReason::NoSatisfyingVersions))
		}
		return Ok(Ok(candidates))
	}

	let candidates = history.versions_of_resource_passed_jobs(input.resource_id, &input.passed)?;
	if candidates.is_empty() {
		if input.passed.is_empty() || history.latest_version_of_resource(input.resource_id)?.is_none() {
			return Ok(Err(MissingInputReason::NoVersions))
		}
		return Ok(Err(MissingInputReason::NoSatisfyingVersions))
	}
	Ok(Ok(candidates))
}

/// The newest version an every version input has used so far, pinned inputs don't progress.
fn current_version<H: History + ?Sized>(history: &H, input: &InputConfig) -> crate::Result<Option<AlgorithmVersion>> {
	if !input.use_every_version || input.pinned_version_id.is_some() {
		return Ok(None)
	}
	let current = history.latest_input_version(input.job_id, &input.name)?
		.filter(|v| v.resource_id == input.resource_id);
	if let Some(current) = current {
		log::debug!("Input {} has used up to version {} at check order {}", input.name, current.version_id, current.check_order);
	}
	Ok(current)
}

/// Partitions inputs so that inputs sharing a passed job, directly or through another input, end up together.
fn correlation_groups(inputs: &InputConfigs) -> Vec<Vec<usize>> {
	let mut sets = UnionFind::<usize>::new(inputs.len());

	let mut first_input_of_job = BTreeMap::<JobID, usize>::new();
	for (i, input) in inputs.iter().enumerate() {
		for job in input.passed.sorted() {
			match first_input_of_job.get(&job) {
				Some(first) => { sets.union(*first, i); },
				None => { first_input_of_job.insert(job, i); },
			}
		}
	}

	let mut groups = BTreeMap::<usize, Vec<usize>>::new();
	for i in 0..inputs.len() {
		groups.entry(sets.find(i)).or_default().push(i);
	}
	groups.into_values().collect()
}

/// The final pick among the candidates an input has left.
fn select<'c>(candidates: &'c VersionCandidates, input: &InputConfig, current: Option<AlgorithmVersion>) -> Option<&'c Version> {
	match current {
		Some(current) if input.use_every_version => {
			candidates.next_after(current.check_order)
				.or_else(|| candidates.at_or_before(current.check_order))
		},
		_ => candidates.newest(),
	}
}
