//! Deciding a job's next build inputs and handing them to storage.

use std::collections::HashMap;

use serde::{Serialize, Deserialize};

use crate::history::History;
use crate::ids::JobID;
use crate::input_configs::InputConfigs;
use crate::mapping::{InputMapping, MissingInputReasons, ResolverStatus};

/// Where resolved mappings are persisted.
pub trait MappingStore {
	/// The version each input would get on its own, kept for diagnostics.
	fn save_independent_mapping(&mut self, job: JobID, mapping: &InputMapping) -> crate::Result<()>;

	/// The inputs the job's next build will run with.
	fn save_next_build_inputs(&mut self, job: JobID, mapping: &InputMapping) -> crate::Result<()>;

	/// Removes any next build inputs so a stale set is never built.
	fn delete_next_build_inputs(&mut self, job: JobID) -> crate::Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
	independent: HashMap<JobID, InputMapping>,
	next_build_inputs: HashMap<JobID, InputMapping>,
}

impl InMemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn independent_mapping(&self, job: JobID) -> Option<&InputMapping> {
		self.independent.get(&job)
	}

	pub fn next_build_inputs(&self, job: JobID) -> Option<&InputMapping> {
		self.next_build_inputs.get(&job)
	}
}

impl MappingStore for InMemoryStore {
	fn save_independent_mapping(&mut self, job: JobID, mapping: &InputMapping) -> crate::Result<()> {
		self.independent.insert(job, mapping.clone());
		Ok(())
	}

	fn save_next_build_inputs(&mut self, job: JobID, mapping: &InputMapping) -> crate::Result<()> {
		self.next_build_inputs.insert(job, mapping.clone());
		Ok(())
	}

	fn delete_next_build_inputs(&mut self, job: JobID) -> crate::Result<()> {
		self.next_build_inputs.remove(&job);
		Ok(())
	}
}

/// Everything one scheduling pass found out about a job's inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputsDetermination {
	pub job_id: JobID,
	/// Inputs that resolve on their own.
	pub independent: InputMapping,
	/// Inputs that can't resolve even on their own.
	pub independent_missing: MissingInputReasons,
	/// Resolution of all inputs together.
	pub status: ResolverStatus,
}

impl InputsDetermination {
	/// Whether the job can be built.
	pub fn is_ready(&self) -> bool {
		self.status.is_resolved()
	}
}

/// Resolves `inputs` of `job` and records the outcome in `store`.
///
/// The independent mapping is always saved. The next build inputs are saved only when every input resolved together,
/// otherwise they are deleted.
///
/// # Errors
/// Errors from `history` or `store`, the store may be left with only the independent mapping updated.
pub fn determine_inputs<H, S>(history: &H, store: &mut S, job: JobID, inputs: &InputConfigs) -> crate::Result<InputsDetermination>
where
	H: History + ?Sized,
	S: MappingStore + ?Sized,
{
	let (independent, independent_missing) = inputs.resolve_independently(history)?;
	store.save_independent_mapping(job, &independent)?;

	let status = inputs.resolve(history)?;
	match &status {
		ResolverStatus::Resolved(mapping) => {
			log::info!("Job {} has inputs for its next build", job);
			store.save_next_build_inputs(job, mapping)?;
		},
		ResolverStatus::Missing(reasons) => {
			log::info!("Job {} is missing inputs: {}", job, reasons);
			store.delete_next_build_inputs(job)?;
		},
	}

	Ok(InputsDetermination { job_id: job, independent, independent_missing, status })
}
