use super::{Version, VersionCandidates};

/// Forward-only cursor over the candidates that satisfy the current constraints, newest first.
///
/// Get a fresh cursor from [`VersionCandidates::iter()`] to start over.
#[derive(Debug)]
pub struct VersionsIter<'a> {
	candidates: &'a VersionCandidates,
	offset: usize,
}

impl<'a> VersionsIter<'a> {
	pub(super) fn new(candidates: &'a VersionCandidates) -> Self {
		Self { candidates, offset: 0 }
	}

	/// The next acceptable version without advancing past it.
	pub fn peek(&mut self) -> Option<&'a Version> {
		let versions = self.candidates.all_versions();
		while let Some(version) = versions.get(self.offset) {
			if self.candidates.constraints().check(version) {
				return Some(version)
			}
			self.offset += 1;
		}
		None
	}
}

impl<'a> Iterator for VersionsIter<'a> {
	type Item = &'a Version;

	fn next(&mut self) -> Option<Self::Item> {
		let version = self.peek()?;
		self.offset += 1;
		Some(version)
	}
}
