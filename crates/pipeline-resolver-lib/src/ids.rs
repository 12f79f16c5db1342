//! Identifier types and the sets used for correlation bookkeeping.
//!
//! [`JobSet`] and [`BuildSet`] share one implementation, the marker type only stops the two from being mixed up.

use std::collections::HashSet;
use std::marker::PhantomData;

pub type JobID = i32;
pub type BuildID = i32;
pub type ResourceID = i32;
pub type VersionID = i32;
/// Rank of a version in discovery order. Higher is newer.
pub type CheckOrder = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jobs {}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builds {}

pub type JobSet = IdSet<Jobs>;
pub type BuildSet = IdSet<Builds>;

/// An unordered set of integer identifiers.
///
/// The set operations never modify either operand, they always return a new set.
pub struct IdSet<Kind> {
	ids: HashSet<i32>,
	kind: PhantomData<Kind>,
}

impl<Kind> IdSet<Kind> {
	pub fn new() -> Self {
		Self { ids: HashSet::new(), kind: PhantomData }
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	pub fn contains(&self, id: i32) -> bool {
		self.ids.contains(&id)
	}

	/// Only for construction, sets handed to the resolver are treated as immutable.
	pub fn insert(&mut self, id: i32) -> bool {
		self.ids.insert(id)
	}

	pub fn union(&self, other: &Self) -> Self {
		self.ids.union(&other.ids).copied().collect()
	}

	pub fn intersect(&self, other: &Self) -> Self {
		let (small, large) = self.smaller_first(other);
		small.ids.iter().filter(|id| large.ids.contains(id)).copied().collect()
	}

	/// True when at least one id is in both sets.
	pub fn overlaps(&self, other: &Self) -> bool {
		let (small, large) = self.smaller_first(other);
		small.ids.iter().any(|id| large.ids.contains(id))
	}

	/// Ids in ascending order.
	pub fn sorted(&self) -> Vec<i32> {
		let mut v: Vec<i32> = self.ids.iter().copied().collect();
		v.sort_unstable();
		v
	}

	/// The highest id, build ids are allocated increasingly so this is the newest build.
	pub fn newest(&self) -> Option<i32> {
		self.ids.iter().copied().max()
	}

	pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
		self.ids.iter().copied()
	}

	fn smaller_first<'a>(&'a self, other: &'a Self) -> (&'a Self, &'a Self) {
		if self.len() <= other.len() { (self, other) } else { (other, self) }
	}
}

impl<Kind> Default for IdSet<Kind> {
	fn default() -> Self {
		Self::new()
	}
}

impl<Kind> Clone for IdSet<Kind> {
	fn clone(&self) -> Self {
		Self { ids: self.ids.clone(), kind: PhantomData }
	}
}

impl<Kind> PartialEq for IdSet<Kind> {
	fn eq(&self, other: &Self) -> bool {
		self.len() == other.len() && self.ids.iter().all(|id| other.ids.contains(id))
	}
}

impl<Kind> Eq for IdSet<Kind> {}

impl<Kind> FromIterator<i32> for IdSet<Kind> {
	fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
		Self { ids: iter.into_iter().collect(), kind: PhantomData }
	}
}

impl<Kind, const N: usize> From<[i32; N]> for IdSet<Kind> {
	fn from(ids: [i32; N]) -> Self {
		ids.into_iter().collect()
	}
}

impl<Kind> std::fmt::Display for IdSet<Kind> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let ids = self.sorted().iter().map(|id| id.to_string()).collect::<Vec<_>>();
		write!(f, "{{{}}}", ids.join(" "))
	}
}

impl<Kind> std::fmt::Debug for IdSet<Kind> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self)
	}
}
