//! What a resolution hands back, either a version for every input or the reasons some inputs couldn't get one.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::ids::*;

/// The version chosen for one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputVersion {
	pub resource_id: ResourceID,
	pub version_id: VersionID,
	/// The owning job has never used this version under this input name, nor produced it.
	pub first_occurrence: bool,
	/// The upstream build of each passed job that vouched for the version.
	#[serde(default)]
	pub passed_build_ids: BTreeMap<JobID, BuildID>,
}

/// Input name to chosen version.
pub type InputMapping = BTreeMap<String, InputVersion>;

/// Why an input has no version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingInputReason {
	#[error("no versions available")]
	NoVersions,
	#[error("no versions satisfy passed constraints")]
	NoSatisfyingVersions,
	#[error("pinned version {0} is not available")]
	PinnedVersionUnavailable(VersionID),
	/// No build of the job agrees with the other inputs that share it.
	#[error("no satisfiable builds from passed job {0}")]
	NoSatisfiableBuilds(JobID),
}

/// The first blocking reason of each unresolved input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissingInputReasons(BTreeMap<String, MissingInputReason>);

impl MissingInputReasons {
	/// Records `reason` unless `input` already has one.
	pub fn register(&mut self, input: impl Into<String>, reason: MissingInputReason) {
		self.0.entry(input.into()).or_insert(reason);
	}

	/// Adds every reason of `other` that isn't already known.
	pub fn extend(&mut self, other: MissingInputReasons) {
		for (input, reason) in other.0 {
			self.register(input, reason);
		}
	}

	pub fn get(&self, input: &str) -> Option<MissingInputReason> {
		self.0.get(input).copied()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, MissingInputReason)> {
		self.0.iter().map(|(name, reason)| (name.as_str(), *reason))
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl std::fmt::Display for MissingInputReasons {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let reasons = self.iter().map(|(name, reason)| format!("{}: {}", name, reason)).collect::<Vec<_>>();
		write!(f, "{}", reasons.join(", "))
	}
}

/// Outcome of a resolution that didn't hit a data access error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "inputs", rename_all = "lowercase")]
pub enum ResolverStatus {
	/// Every input has a version.
	Resolved(InputMapping),
	/// At least one input can't be satisfied, nothing is mapped.
	Missing(MissingInputReasons),
}

impl ResolverStatus {
	pub fn is_resolved(&self) -> bool {
		matches!(self, ResolverStatus::Resolved(_))
	}

	pub fn mapping(&self) -> Option<&InputMapping> {
		match self {
			ResolverStatus::Resolved(mapping) => Some(mapping),
			ResolverStatus::Missing(_) => None,
		}
	}

	pub fn missing(&self) -> Option<&MissingInputReasons> {
		match self {
			ResolverStatus::Resolved(_) => None,
			ResolverStatus::Missing(reasons) => Some(reasons),
		}
	}
}
