pub mod catalog;
mod identifiers;
pub mod progress;

pub use catalog::{Course, Module, VideoRef};
pub use identifiers::{CourseId, EnrollmentId, ModuleId, VideoId};
pub use progress::{
    Enrollment, ModuleProgress, ProgressKey, ProgressSnapshot, ResumeHints, VideoProgress,
};
