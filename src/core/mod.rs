pub mod enroller;
pub mod pipeline;
pub mod provisioner;

pub use crate::domain::model::{CourseRequest, Diagnostic, EnrollmentRecord, RunReport};
pub use crate::domain::ports::{LmsApi, RequestSource};
pub use crate::utils::error::Result;
