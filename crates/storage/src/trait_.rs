//! Storage trait abstraction.
//!
//! The store is split along the seams the progress subsystem depends on:
//! catalog lookups, enrollments and lesson progress. `Storage` bundles all
//! three so a backend can be handed around as one `Arc<dyn Storage>`.

use async_trait::async_trait;
use coursetrack_core::{
    Course, CourseId, Enrollment, Lesson, LessonId, LessonProgress, Level, LevelId, Module,
    ModuleId, ProgressReport, UserId,
};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database error
    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Outcome of folding a report into a progress record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Record after the merge
    pub progress: LessonProgress,

    /// Whether the record did not exist before this call
    pub created: bool,
}

/// Read/write access to the Course → Level → Module → Lesson hierarchy.
///
/// Every list is ordered by `order` ascending, ties broken by id.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Save a course (create or update).
    async fn save_course(&self, course: &Course) -> Result<()>;

    /// Save a level. The owning course must exist.
    async fn save_level(&self, level: &Level) -> Result<()>;

    /// Save a module. The owning level must exist.
    async fn save_module(&self, module: &Module) -> Result<()>;

    /// Save a lesson. The owning module must exist.
    async fn save_lesson(&self, lesson: &Lesson) -> Result<()>;

    /// Load a course by ID.
    async fn load_course(&self, id: CourseId) -> Result<Option<Course>>;

    /// Load a level by ID.
    async fn load_level(&self, id: LevelId) -> Result<Option<Level>>;

    /// Load a module by ID.
    async fn load_module(&self, id: ModuleId) -> Result<Option<Module>>;

    /// Load a lesson by ID.
    async fn load_lesson(&self, id: LessonId) -> Result<Option<Lesson>>;

    /// List all courses.
    async fn list_courses(&self) -> Result<Vec<Course>>;

    /// List the levels of a course.
    async fn list_levels(&self, course: CourseId) -> Result<Vec<Level>>;

    /// List the modules of a level.
    async fn list_modules(&self, level: LevelId) -> Result<Vec<Module>>;

    /// List the lessons of a module.
    async fn list_lessons(&self, module: ModuleId) -> Result<Vec<Lesson>>;

    /// Delete a course together with its levels, modules, lessons, and every
    /// enrollment and progress record that points at them.
    async fn delete_course(&self, id: CourseId) -> Result<()>;

    /// All lessons under a course, in hierarchy order.
    async fn course_lessons(&self, course: CourseId) -> Result<Vec<Lesson>> {
        let mut lessons = Vec::new();
        for level in self.list_levels(course).await? {
            for module in self.list_modules(level.id).await? {
                lessons.extend(self.list_lessons(module.id).await?);
            }
        }
        Ok(lessons)
    }
}

/// Course membership records.
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Get-or-create the enrollment for (user, course).
    ///
    /// Returns the stored record and `true` if this call created it. A second
    /// call for the same pair returns the existing record and `false`.
    async fn enroll(&self, user: &UserId, course: CourseId) -> Result<(Enrollment, bool)>;

    /// Whether the user is enrolled in the course.
    async fn is_enrolled(&self, user: &UserId, course: CourseId) -> Result<bool>;

    /// All enrollments of a user, oldest first.
    async fn list_enrollments(&self, user: &UserId) -> Result<Vec<Enrollment>>;
}

/// Per-(user, lesson) watch state.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Load the record for (user, lesson), if any. Never creates one.
    async fn get_progress(&self, user: &UserId, lesson: LessonId) -> Result<Option<LessonProgress>>;

    /// Overwrite the record for (user, lesson), creating it if absent.
    async fn upsert_progress(
        &self,
        user: &UserId,
        lesson: LessonId,
        watched_time: u32,
        completed: bool,
    ) -> Result<LessonProgress>;

    /// Atomically load the record for (user, lesson), or a fresh default
    /// one, fold `report` into it and store the result.
    ///
    /// Concurrent merges for the same pair are serialized, so none of them
    /// is lost.
    async fn merge_progress(
        &self,
        user: &UserId,
        lesson: LessonId,
        report: &ProgressReport,
    ) -> Result<MergeOutcome>;

    /// Records of a user for the given lessons. Lessons without a record are
    /// skipped.
    async fn list_progress(&self, user: &UserId, lessons: &[LessonId]) -> Result<Vec<LessonProgress>>;
}

/// A complete CourseTrack store.
pub trait Storage: CatalogStore + EnrollmentStore + ProgressStore {}

impl<T> Storage for T where T: CatalogStore + EnrollmentStore + ProgressStore {}
