pub mod error;
pub use error::Result;
pub use error::Error;

pub mod ids;
pub use ids::{JobSet, BuildSet};

pub mod candidates;
pub use candidates::{Version, VersionCandidates};

pub mod history;
pub use history::History;

pub mod snapshot;
pub use snapshot::VersionsDB;
pub use snapshot::SnapshotBuilder;

pub mod config;
pub use config::Config;

pub mod job_config;
pub use job_config::JobConfig;

pub mod input_configs;
pub use input_configs::{InputConfig, InputConfigs};

pub mod mapping;
pub use mapping::{InputMapping, InputVersion, MissingInputReason, MissingInputReasons, ResolverStatus};

pub mod resolver;

pub mod scheduling;
pub use scheduling::{determine_inputs, InMemoryStore, InputsDetermination, MappingStore};
