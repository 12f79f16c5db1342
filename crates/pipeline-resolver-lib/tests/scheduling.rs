use std::collections::BTreeMap;

use pipeline_resolver::history::{AlgorithmVersion, ResourceVersion};
use pipeline_resolver::ids::*;
use pipeline_resolver::{determine_inputs, Config, Error, History, InMemoryStore, InputMapping, MappingStore, MissingInputReason, ResolverStatus, VersionsDB};
use pipeline_resolver_test_utils::*;

fn two_inputs_one_pinned_away() -> Example {
	Example::new(
		vec![
			DbRow::version("resource-x", "rxv1", 1),
			DbRow::version("resource-y", "ryv1", 1),
		],
		vec![
			Input::new("resource-x", "resource-x"),
			Input::new("resource-y", "resource-y").pinned("ryv9"),
		],
		Expected::Missing(vec![("resource-y", Reason::PinnedVersionUnavailable("ryv9"))]),
	)
}

#[test]
fn independent_mapping_keeps_what_resolves_alone() -> Result<(), HarnessError> {
	let setup = two_inputs_one_pinned_away().setup()?;

	let (mapping, missing) = setup.configs.resolve_independently(&setup.db)?;
	assert_eq!(mapping.keys().collect::<Vec<_>>(), vec!["resource-x"]);
	assert_eq!(missing.get("resource-y"), Some(MissingInputReason::PinnedVersionUnavailable(setup.version_id("ryv9")?)));
	Ok(())
}

#[test]
fn partial_resolution_deletes_next_build_inputs() -> Result<(), HarnessError> {
	let setup = two_inputs_one_pinned_away().setup()?;
	let job = setup.job_id(CURRENT_JOB)?;

	let mut store = InMemoryStore::new();
	store.save_next_build_inputs(job, &InputMapping::new())?;

	let determination = determine_inputs(&setup.db, &mut store, job, &setup.configs)?;
	assert!(!determination.is_ready());
	assert!(store.next_build_inputs(job).is_none());
	assert_eq!(store.independent_mapping(job).map(|m| m.len()), Some(1));
	assert_eq!(determination.independent_missing.len(), 1);
	Ok(())
}

#[test]
fn full_resolution_saves_next_build_inputs() -> Result<(), HarnessError> {
	let setup = Example::new(
		vec![
			DbRow::output("job-a", 1, "resource-x", "rxv1", 1),
			DbRow::output("job-a", 1, "resource-y", "ryv1", 1),
		],
		vec![
			Input::new("resource-x", "resource-x").passed(["job-a"]),
			Input::new("resource-y", "resource-y").passed(["job-a"]),
		],
		Expected::Resolved(vec![("resource-x", "rxv1"), ("resource-y", "ryv1")]),
	).setup()?;
	let job = setup.job_id(CURRENT_JOB)?;

	let mut store = InMemoryStore::new();
	let determination = determine_inputs(&setup.db, &mut store, job, &setup.configs)?;
	assert!(determination.is_ready());
	assert_eq!(store.next_build_inputs(job), determination.status.mapping());
	assert_eq!(store.independent_mapping(job), determination.status.mapping());
	Ok(())
}

#[test]
fn first_occurrence_of_a_new_version() -> Result<(), HarnessError> {
	let outcome = Example::new(
		vec![
			DbRow::input(CURRENT_JOB, 10, "resource-x", "rxv1", 1),
			DbRow::version("resource-x", "rxv2", 2),
		],
		vec![Input::new("resource-x", "resource-x")],
		Expected::Resolved(vec![("resource-x", "rxv2")]),
	).run()?;
	assert_eq!(outcome.first_occurrence("resource-x"), Some(true));
	Ok(())
}

#[test]
fn reused_input_is_not_a_first_occurrence() -> Result<(), HarnessError> {
	let outcome = Example::new(
		vec![DbRow::input(CURRENT_JOB, 10, "resource-x", "rxv1", 1)],
		vec![Input::new("resource-x", "resource-x")],
		Expected::Resolved(vec![("resource-x", "rxv1")]),
	).run()?;
	assert_eq!(outcome.first_occurrence("resource-x"), Some(false));
	Ok(())
}

#[test]
fn renamed_input_is_a_first_occurrence() -> Result<(), HarnessError> {
	let outcome = Example::new(
		vec![DbRow::input(CURRENT_JOB, 10, "resource-x", "rxv1", 1).named("other-name")],
		vec![Input::new("resource-x", "resource-x")],
		Expected::Resolved(vec![("resource-x", "rxv1")]),
	).run()?;
	assert_eq!(outcome.first_occurrence("resource-x"), Some(true));
	Ok(())
}

#[test]
fn own_output_is_not_a_first_occurrence() -> Result<(), HarnessError> {
	let outcome = Example::new(
		vec![DbRow::output(CURRENT_JOB, 10, "resource-x", "rxv1", 1)],
		vec![Input::new("resource-x", "resource-x")],
		Expected::Resolved(vec![("resource-x", "rxv1")]),
	).run()?;
	assert_eq!(outcome.first_occurrence("resource-x"), Some(false));
	Ok(())
}

#[test]
fn resolves_concurrently_from_one_snapshot() -> Result<(), HarnessError> {
	let setup = Example::new(
		vec![
			DbRow::output("job-a", 1, "resource-x", "rxv1", 1),
			DbRow::output("job-a", 1, "resource-y", "ryv1", 1),
			DbRow::output("job-a", 2, "resource-x", "rxv2", 2),
			DbRow::output("job-a", 2, "resource-y", "ryv2", 2),
			DbRow::output("job-a", 3, "resource-x", "rxv3", 3),
		],
		vec![
			Input::new("x", "resource-x").passed(["job-a"]),
			Input::new("y", "resource-y").passed(["job-a"]),
		],
		Expected::Resolved(vec![("x", "rxv2"), ("y", "ryv2")]),
	).setup()?;
	let expected = setup.configs.resolve(&setup.db)?;

	let results: Vec<pipeline_resolver::Result<ResolverStatus>> = std::thread::scope(|s| {
		let handles: Vec<_> = (0..4).map(|_| s.spawn(|| setup.configs.resolve(&setup.db))).collect();
		handles.into_iter().map(|h| h.join().expect("resolver thread panicked")).collect()
	});
	for result in results {
		assert_eq!(result?, expected);
	}
	Ok(())
}

#[test]
fn gzipped_snapshot_resolves_the_same() -> Result<(), HarnessError> {
	let setup = two_inputs_one_pinned_away().setup()?;
	let loaded = VersionsDB::from_gz_reader(gz_snapshot(&setup.db)?.as_slice())?;
	assert_eq!(setup.configs.resolve(&loaded)?, setup.configs.resolve(&setup.db)?);
	Ok(())
}

#[test]
fn cached_snapshot_round_trips_through_the_data_dir() -> Result<(), HarnessError> {
	let setup = two_inputs_one_pinned_away().setup()?;
	let dir = std::env::temp_dir().join(format!("pipeline-resolver-snapshot-{}", std::process::id()));
	std::fs::create_dir_all(&dir)?;

	let mut config = Config::default();
	assert!(config.set_data_dir(dir.clone()));
	setup.db.save_to_disk(&config, "pipeline")?;
	let loaded = VersionsDB::load_from_disk(&config, "pipeline")?;
	assert_eq!(loaded.records(), setup.db.records());

	std::fs::remove_dir_all(dir)?;
	Ok(())
}

/// Fails every build lookup, as a history whose storage went away would.
struct BrokenHistory(VersionsDB);

impl History for BrokenHistory {
	fn job_id(&self, name: &str) -> pipeline_resolver::Result<Option<JobID>> {
		self.0.job_id(name)
	}

	fn resource_id(&self, name: &str) -> pipeline_resolver::Result<Option<ResourceID>> {
		self.0.resource_id(name)
	}

	fn all_versions_of_resource(&self, resource: ResourceID) -> pipeline_resolver::Result<Vec<ResourceVersion>> {
		self.0.all_versions_of_resource(resource)
	}

	fn find_version_of_resource(&self, resource: ResourceID, version: VersionID) -> pipeline_resolver::Result<Option<ResourceVersion>> {
		self.0.find_version_of_resource(resource, version)
	}

	fn successful_builds(&self, _job: JobID) -> pipeline_resolver::Result<Vec<BuildID>> {
		Err(Error::History("connection lost".to_string()))
	}

	fn build_outputs(&self, build: BuildID) -> pipeline_resolver::Result<BTreeMap<ResourceID, AlgorithmVersion>> {
		self.0.build_outputs(build)
	}

	fn latest_input_version(&self, job: JobID, input_name: &str) -> pipeline_resolver::Result<Option<AlgorithmVersion>> {
		self.0.latest_input_version(job, input_name)
	}

	fn is_version_first_occurrence(&self, version: VersionID, job: JobID, input_name: &str) -> pipeline_resolver::Result<bool> {
		self.0.is_version_first_occurrence(version, job, input_name)
	}
}

#[test]
fn history_failure_aborts_resolution() -> Result<(), HarnessError> {
	let setup = Example::new(
		vec![DbRow::output("job-a", 1, "resource-x", "rxv1", 1)],
		vec![Input::new("resource-x", "resource-x").passed(["job-a"])],
		Expected::Resolved(vec![("resource-x", "rxv1")]),
	).setup()?;
	let job = setup.job_id(CURRENT_JOB)?;
	let broken = BrokenHistory(setup.db.clone());

	assert!(matches!(setup.configs.resolve(&broken), Err(Error::History(_))));

	let mut store = InMemoryStore::new();
	assert!(determine_inputs(&broken, &mut store, job, &setup.configs).is_err());
	assert!(store.independent_mapping(job).is_none());
	Ok(())
}
