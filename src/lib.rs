pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::ProvisionConfig;

pub use adapters::{CanvasClient, CsvRequestSource, GoogleAuthorizer, SheetsRequestSource};
pub use crate::core::{enroller::TeacherEnroller, pipeline::SandboxPipeline, provisioner::CourseProvisioner};
pub use utils::error::{ProvisionError, Result};
