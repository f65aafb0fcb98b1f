//! CourseTrack core data models.
//!
//! This crate defines the catalog hierarchy, enrollments and per-lesson
//! progress records that the progress subsystem computes over.

#![warn(missing_docs)]

// Core identities
mod id;

// Catalog
mod course;
mod duration;

// Learner state
mod enrollment;
mod progress;

// Re-exports
pub use id::*;

// Catalog
pub use course::{Course, Level, Module, Lesson, DEFAULT_ORDER};
pub use duration::LessonDuration;

// Enrollment & Progress
pub use enrollment::Enrollment;
pub use progress::{LessonProgress, LessonState, ProgressReport};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
