use pipeline_resolver_test_utils::*;

#[test]
fn shared_job_means_same_build() -> Result<(), HarnessError> {
	/* Taken on their own x would get rxv3 and y ryv2, no single build produced both */
	let outcome = Example::new(
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
	).run()?;

	assert_eq!(outcome.passed_build("x", "job-a")?, Some(2));
	assert_eq!(outcome.passed_build("y", "job-a")?, Some(2));
	Ok(())
}

#[test]
fn inputs_of_a_build_count_as_its_outputs() -> Result<(), HarnessError> {
	Example::new(
		vec![
			DbRow::output("job-a", 1, "resource-x", "rxv1", 1),
			DbRow::output("job-a", 1, "resource-y", "ryv1", 1),
			DbRow::output("job-a", 2, "resource-x", "rxv2", 2),
			DbRow::output("job-a", 2, "resource-y", "ryv2", 2),
			DbRow::input("job-a", 3, "resource-y", "ryv2", 2),
			DbRow::output("job-a", 3, "resource-x", "rxv3", 3),
		],
		vec![
			Input::new("x", "resource-x").passed(["job-a"]),
			Input::new("y", "resource-y").passed(["job-a"]),
		],
		Expected::Resolved(vec![("x", "rxv3"), ("y", "ryv2")]),
	).run()?;
	Ok(())
}

#[test]
fn output_overrides_input_of_the_same_build() -> Result<(), HarnessError> {
	Example::new(
		vec![
			DbRow::input("job-a", 1, "resource-x", "rxv1", 1),
			DbRow::output("job-a", 1, "resource-x", "rxv2", 2),
			DbRow::output("job-a", 1, "resource-y", "ryv1", 1),
			DbRow::version("resource-x", "rxv3", 3),
		],
		vec![
			Input::new("x", "resource-x").passed(["job-a"]),
			Input::new("y", "resource-y").passed(["job-a"]),
		],
		Expected::Resolved(vec![("x", "rxv2"), ("y", "ryv1")]),
	).run()?;
	Ok(())
}

#[test]
fn fan_in_job_may_see_only_one_resource() -> Result<(), HarnessError> {
	/* x also has to pass job-b, which only ever saw rxv1, so y follows x back to build 1 of job-a */
	Example::new(
		vec![
			DbRow::output("job-a", 1, "resource-x", "rxv1", 1),
			DbRow::output("job-a", 1, "resource-y", "ryv1", 1),
			DbRow::output("job-a", 2, "resource-x", "rxv2", 2),
			DbRow::output("job-a", 2, "resource-y", "ryv2", 2),
			DbRow::input("job-b", 3, "resource-x", "rxv1", 1),
		],
		vec![
			Input::new("x", "resource-x").passed(["job-a", "job-b"]),
			Input::new("y", "resource-y").passed(["job-a"]),
		],
		Expected::Resolved(vec![("x", "rxv1"), ("y", "ryv1")]),
	).run()?;
	Ok(())
}

#[test]
fn correlation_carries_through_a_chain_of_inputs() -> Result<(), HarnessError> {
	let outcome = Example::new(
		vec![
			DbRow::output("job-a", 1, "resource-x", "rxv1", 1),
			DbRow::output("job-a", 1, "resource-y", "ryv1", 1),
			DbRow::output("job-a", 2, "resource-x", "rxv2", 2),
			DbRow::output("job-a", 2, "resource-y", "ryv2", 2),
			DbRow::input("job-b", 3, "resource-y", "ryv1", 1),
			DbRow::output("job-b", 3, "resource-z", "rzv1", 1),
			DbRow::input("job-b", 4, "resource-y", "ryv1", 1),
			DbRow::output("job-b", 4, "resource-z", "rzv2", 2),
		],
		vec![
			Input::new("x", "resource-x").passed(["job-a"]),
			Input::new("y", "resource-y").passed(["job-a", "job-b"]),
			Input::new("z", "resource-z").passed(["job-b"]),
		],
		Expected::Resolved(vec![("x", "rxv1"), ("y", "ryv1"), ("z", "rzv2")]),
	).run()?;

	assert_eq!(outcome.passed_build("y", "job-a")?, Some(1));
	assert_eq!(outcome.passed_build("y", "job-b")?, Some(4));
	assert_eq!(outcome.passed_build("z", "job-b")?, Some(4));
	Ok(())
}

#[test]
fn backtracks_to_an_older_build_of_an_earlier_job() -> Result<(), HarnessError> {
	let _ = env_logger::builder().is_test(true).try_init();

	/* Build 2 of job-a looks fine until job-b, where no build agrees with both y and z */
	Example::new(
		vec![
			DbRow::output("job-a", 1, "resource-x", "rxv1", 1),
			DbRow::output("job-a", 1, "resource-y", "ryv1", 1),
			DbRow::output("job-a", 2, "resource-x", "rxv2", 2),
			DbRow::output("job-a", 2, "resource-y", "ryv2", 2),
			DbRow::input("job-b", 3, "resource-y", "ryv1", 1),
			DbRow::output("job-b", 3, "resource-z", "rzv1", 1),
			DbRow::input("job-b", 4, "resource-y", "ryv2", 2),
			DbRow::output("job-b", 4, "resource-z", "rzv2", 2),
			DbRow::input("job-c", 5, "resource-z", "rzv1", 1),
		],
		vec![
			Input::new("x", "resource-x").passed(["job-a"]),
			Input::new("y", "resource-y").passed(["job-a", "job-b"]),
			Input::new("z", "resource-z").passed(["job-b", "job-c"]),
		],
		Expected::Resolved(vec![("x", "rxv1"), ("y", "ryv1"), ("z", "rzv1")]),
	).run()?;
	Ok(())
}

#[test]
fn no_build_agrees_means_nothing_is_mapped() -> Result<(), HarnessError> {
	/* Each input has candidates on its own but job-a never built both at once */
	Example::new(
		vec![
			DbRow::output("job-a", 1, "resource-x", "rxv1", 1),
			DbRow::output("job-a", 2, "resource-y", "ryv1", 1),
			DbRow::input("job-b", 3, "resource-x", "rxv1", 1),
			DbRow::version("resource-z", "rzv1", 1),
		],
		vec![
			Input::new("x", "resource-x").passed(["job-a", "job-b"]),
			Input::new("y", "resource-y").passed(["job-a"]),
			Input::new("z", "resource-z"),
		],
		Expected::Missing(vec![
			("x", Reason::NoSatisfiableBuilds("job-a")),
			("y", Reason::NoSatisfiableBuilds("job-a")),
		]),
	).run()?;
	Ok(())
}

#[test]
fn same_resource_through_the_same_job_gets_one_version() -> Result<(), HarnessError> {
	Example::new(
		vec![
			DbRow::output("job-a", 1, "resource-x", "rxv1", 1),
			DbRow::output("job-a", 2, "resource-x", "rxv2", 2),
			DbRow::input("job-b", 3, "resource-x", "rxv1", 1),
		],
		vec![
			Input::new("x", "resource-x").passed(["job-a"]),
			Input::new("x-tested", "resource-x").passed(["job-a", "job-b"]),
		],
		Expected::Resolved(vec![("x", "rxv1"), ("x-tested", "rxv1")]),
	).run()?;
	Ok(())
}

#[test]
fn unrelated_groups_do_not_interfere() -> Result<(), HarnessError> {
	Example::new(
		vec![
			DbRow::output("job-a", 1, "resource-x", "rxv1", 1),
			DbRow::output("job-a", 1, "resource-y", "ryv1", 1),
			DbRow::output("job-a", 2, "resource-x", "rxv2", 2),
			DbRow::output("job-b", 3, "resource-w", "rwv1", 1),
			DbRow::output("job-b", 3, "resource-v", "rvv1", 1),
			DbRow::output("job-b", 4, "resource-w", "rwv2", 2),
			DbRow::output("job-b", 4, "resource-v", "rvv2", 2),
		],
		vec![
			Input::new("x", "resource-x").passed(["job-a"]),
			Input::new("y", "resource-y").passed(["job-a"]),
			Input::new("w", "resource-w").passed(["job-b"]),
			Input::new("v", "resource-v").passed(["job-b"]),
		],
		Expected::Resolved(vec![("x", "rxv1"), ("y", "ryv1"), ("w", "rwv2"), ("v", "rvv2")]),
	).run()?;
	Ok(())
}

#[test]
fn pinned_inputs_take_the_build_holding_both_pins() -> Result<(), HarnessError> {
	let outcome = Example::new(
		vec![
			DbRow::output("job-a", 1, "resource-x", "rxv1", 1),
			DbRow::output("job-a", 1, "resource-y", "ryv1", 1),
			DbRow::output("job-a", 2, "resource-x", "rxv2", 2),
			DbRow::output("job-a", 2, "resource-y", "ryv1", 1),
			DbRow::output("job-a", 3, "resource-x", "rxv2", 2),
			DbRow::output("job-a", 3, "resource-y", "ryv2", 2),
			DbRow::output("job-a", 4, "resource-x", "rxv3", 3),
			DbRow::output("job-a", 4, "resource-y", "ryv2", 2),
		],
		vec![
			Input::new("x", "resource-x").passed(["job-a"]).pinned("rxv2"),
			Input::new("y", "resource-y").passed(["job-a"]).pinned("ryv1"),
		],
		Expected::Resolved(vec![("x", "rxv2"), ("y", "ryv1")]),
	).run()?;

	assert_eq!(outcome.passed_build("x", "job-a")?, Some(2));
	assert_eq!(outcome.passed_build("y", "job-a")?, Some(2));
	Ok(())
}
