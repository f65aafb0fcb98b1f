//! Course progress
//!
//! Lesson progress merging, course completion and the boundary operations
//! the request layer calls.

#![warn(missing_docs)]

pub mod calculator;
pub mod config;
pub mod error;
pub mod policy;
pub mod service;

pub use calculator::{
    completion_percent, CompletionCalculator, CourseCompletion, LessonProgressEntry, ModuleProgress,
};
pub use config::TrackerConfig;
pub use error::{Result, ServiceError};
pub use policy::ProgressPolicy;
pub use service::{CourseProgressService, EnrollOutcome, EnrolledCourses, LessonWatchStatus};
