//! Firehose domain model and the pure translations around it.
//!
//! Nothing in this crate performs I/O: it converts between the firehose view
//! served over HTTP and the generic resource records of the orchestrator.

pub mod action;
pub mod alert;
pub mod definition;
pub mod error;
pub mod mapper;
pub mod project;
pub mod structpb;

pub use definition::{FirehoseConfigs, FirehoseDefinition, FirehoseState};
pub use error::{Error, Result};
pub use project::ProjectContext;

/// Resource kind tag the orchestrator uses for firehoses.
pub const KIND_FIREHOSE: &str = "firehose";

/// Key of the backend-computed deployment name inside `state.output`.
pub const OUTPUT_RELEASE_NAME_KEY: &str = "release_name";
