use std::sync::Arc;

use super::Version;

/// A predicate a candidate has to satisfy to stay selectable.
pub type Constraint = Arc<dyn Fn(&Version) -> bool + Send + Sync>;

/// The logical AND of any number of [`Constraint`]s.
///
/// Constraints are only ever appended, which lets a search undo them by truncating back to an earlier length.
#[derive(Clone, Default)]
pub struct Constraints {
	all: Vec<Constraint>,
}

impl Constraints {
	pub fn check(&self, version: &Version) -> bool {
		self.all.iter().all(|c| c(version))
	}

	pub fn and(&mut self, constraint: Constraint) {
		self.all.push(constraint);
	}

	pub fn extend(&mut self, other: &Constraints) {
		self.all.extend(other.all.iter().cloned());
	}

	pub fn len(&self) -> usize {
		self.all.len()
	}

	pub fn is_empty(&self) -> bool {
		self.all.is_empty()
	}

	pub(crate) fn truncate(&mut self, len: usize) {
		self.all.truncate(len);
	}
}

impl std::fmt::Debug for Constraints {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Constraints({})", self.all.len())
	}
}
