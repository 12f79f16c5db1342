use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

/// Settings shared by everything that loads or stores snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
	data_dir: PathBuf,
	/// Logs every build tried during the correlation search.
	#[serde(default)]
	trace_search: bool,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			data_dir: {
				#[cfg(target_os = "windows")]
				let path = std::env::var("APPDATA").map(PathBuf::from).unwrap_or_default();

				#[cfg(not(target_os = "windows"))]
				let path = if let Ok(e) = std::env::var("XDG_DATA_HOME") {
					PathBuf::from(e)
				} else {
					std::env::var("HOME").map(|home| PathBuf::from(home).join(".local/share")).unwrap_or_default()
				};

				path.join("pipeline-resolver").join("data")
			},
			trace_search: false,
		}
	}
}

impl Config {
	/// Where the config file lives, next to the other per-user settings.
	pub fn config_path() -> PathBuf {
		#[cfg(target_os = "windows")]
		let path = std::env::var("APPDATA").map(PathBuf::from).unwrap_or_default();

		#[cfg(not(target_os = "windows"))]
		let path = if let Ok(e) = std::env::var("XDG_CONFIG_HOME") {
			PathBuf::from(e)
		} else {
			std::env::var("HOME").map(|home| PathBuf::from(home).join(".config")).unwrap_or_default()
		};

		path.join("pipeline-resolver").join("config.json")
	}

	/// Loads the config from [`Config::config_path()`], falling back to the defaults if there isn't one yet.
	///
	/// # Errors
	/// - [`IO`](crate::error::Error::IO) when the file exists but can't be read.
	/// - [`SerdeJSON`](crate::error::Error::SerdeJSON) when deserializing the file.
	pub fn load_from_disk() -> crate::Result<Self> {
		let path = Self::config_path();
		if !path.exists() {
			log::debug!("No config at {}, using defaults", path.display());
			return Ok(Self::default())
		}
		Self::load_from_file(path)
	}

	pub fn load_from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
		let file = std::fs::File::open(path)?;
		Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
	}

	/// Saves the config to [`Config::config_path()`].
	///
	/// # Errors
	/// - [`IO`](crate::error::Error::IO) when creating the file or it's parent directories.
	/// - [`SerdeJSON`](crate::error::Error::SerdeJSON) when serializing.
	pub fn save_to_disk(&self) -> crate::Result<()> {
		self.save_to_file(Self::config_path())
	}

	pub fn save_to_file(&self, path: impl AsRef<Path>) -> crate::Result<()> {
		let path = path.as_ref();
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		let file = std::fs::File::create(path)?;
		serde_json::to_writer_pretty(file, self)?;
		Ok(())
	}

	pub fn data_dir(&self) -> &Path {
		&self.data_dir
	}
	/// returns if the directory is valid or not.
	pub fn set_data_dir(&mut self, data_dir: PathBuf) -> bool {
		if data_dir.is_dir() {
			self.data_dir = data_dir;
			true
		} else {
			false
		}
	}

	pub fn trace_search(&self) -> bool {
		self.trace_search
	}
	pub fn set_trace_search(&mut self, trace_search: bool) {
		self.trace_search = trace_search;
	}
}
