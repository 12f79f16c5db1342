//! The pipeline-side description of a job's inputs, by name.
//!
//! Turned into id based [`crate::InputConfigs`] with [`crate::InputConfigs::from_job_config()`].

use serde::{Serialize, Deserialize};

use crate::ids::VersionID;
use crate::Error::Validation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
	pub name: String,
	#[serde(default)]
	pub inputs: Vec<JobInputConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInputConfig {
	pub name: String,
	/// Defaults to the input's name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub resource: Option<String>,
	#[serde(default)]
	pub passed: Vec<String>,
	#[serde(default)]
	pub version: VersionConfig,
}

impl JobInputConfig {
	pub fn resource(&self) -> &str {
		self.resource.as_deref().unwrap_or(&self.name)
	}
}

/// Which version of the resource an input wants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionConfig {
	#[default] Latest,
	/// Step through the versions one at a time across builds.
	Every,
	Pinned(VersionID),
}

impl JobConfig {
	/// Reads a job config from JSON.
	/// # Parameters
	/// - `json` - The job document.
	/// - `do_validation` - Checks the document against the bundled schema before deserializing, gives better messages for hand written configs.
	///
	/// # Errors
	/// - [`SerdeJSON`](crate::error::Error::SerdeJSON) when the text isn't JSON or doesn't deserialize.
	/// - [`Validation`](crate::error::Error::Validation) when the document doesn't match the schema.
	pub fn from_json(json: &str, do_validation: bool) -> crate::Result<Self> {
		let value: serde_json::Value = serde_json::from_str(json)?;

		if do_validation {
			let schema: serde_json::Value = serde_json::from_str(include_str!("job-config.schema.json"))?;
			let compiled = jsonschema::JSONSchema::compile(&schema).map_err(|e| Validation(format!("job schema is invalid: {}", e)))?;

			let errors: Vec<String> = match compiled.validate(&value) {
				Ok(()) => Vec::new(),
				Err(errors) => errors.map(|e| e.to_string()).collect(),
			};
			if !errors.is_empty() {
				return Err(Validation(errors.join("; ")))
			}
		}

		Ok(serde_json::from_value(value)?)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn reads_every_version_mode() {
		let job = JobConfig::from_json(r#"{
			"name": "deploy",
			"inputs": [
				{ "name": "app", "passed": ["build", "test"] },
				{ "name": "config", "resource": "config-repo", "version": "every" },
				{ "name": "tool", "version": { "pinned": 7 } }
			]
		}"#, true).expect("config should parse");

		assert_eq!(job.inputs.len(), 3);
		assert_eq!(job.inputs[0].version, VersionConfig::Latest);
		assert_eq!(job.inputs[0].passed, vec!["build".to_string(), "test".to_string()]);
		assert_eq!(job.inputs[1].resource(), "config-repo");
		assert_eq!(job.inputs[1].version, VersionConfig::Every);
		assert_eq!(job.inputs[2].resource(), "tool");
		assert_eq!(job.inputs[2].version, VersionConfig::Pinned(7));
	}

	#[test]
	fn schema_rejects_unknown_version_mode() {
		let result = JobConfig::from_json(r#"{ "name": "deploy", "inputs": [{ "name": "app", "version": "oldest" }] }"#, true);
		assert!(matches!(result, Err(crate::Error::Validation(_))));
	}

	#[test]
	fn schema_rejects_stray_fields() {
		let result = JobConfig::from_json(r#"{ "name": "deploy", "inputs": [{ "name": "app", "trigger": true }] }"#, true);
		assert!(matches!(result, Err(crate::Error::Validation(_))));
	}

	#[test]
	fn unvalidated_still_needs_the_right_shape() {
		let result = JobConfig::from_json(r#"{ "inputs": [] }"#, false);
		assert!(matches!(result, Err(crate::Error::SerdeJSON(_))));
	}
}
