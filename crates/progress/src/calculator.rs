//! Course completion calculator.
//!
//! Completion is derived on demand from the lesson set under a course and
//! the user's progress records. Only the explicit `completed` flag counts;
//! watch time never marks a lesson done here.

use std::collections::HashMap;
use std::sync::Arc;
use coursetrack_core::{CourseId, Lesson, LessonId, LessonProgress, Module, ModuleId, UserId};
use coursetrack_storage::{CatalogStore, EnrollmentStore, ProgressStore, Result, Storage, StorageError};
use serde::{Deserialize, Serialize};

/// Completion of a course for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseCompletion {
    /// Completed lessons over all lessons, floored, 0..=100
    pub progress_percent: u8,

    /// True only when every lesson is completed
    pub completed: bool,

    /// Whether the user is enrolled at all
    pub enrolled: bool,
}

impl CourseCompletion {
    /// The answer for a user who is not enrolled.
    pub fn not_enrolled() -> Self {
        Self::default()
    }

    /// Completion of an enrolled user from lesson counts.
    pub fn enrolled(completed_lessons: usize, total_lessons: usize) -> Self {
        let progress_percent = completion_percent(completed_lessons, total_lessons);
        Self {
            progress_percent,
            completed: progress_percent == 100,
            enrolled: true,
        }
    }
}

/// Completion of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleProgress {
    /// Module
    pub module_id: ModuleId,

    /// Module name
    pub name: String,

    /// Lessons marked completed
    pub completed_lessons: usize,

    /// Lessons in the module
    pub total_lessons: usize,

    /// Floored percentage, 0..=100
    pub progress_percent: u8,
}

/// Watch state of one lesson within a course listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProgressEntry {
    /// Lesson
    pub lesson_id: LessonId,

    /// Seconds watched
    pub watched_time: u32,

    /// Whether the lesson is finished
    pub completed: bool,
}

/// `floor(100 * completed / total)`, 0 when there is nothing to complete.
pub fn completion_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total) as u64;
    (completed * 100 / total as u64) as u8
}

/// Derives completion figures from the catalog and progress stores.
#[derive(Clone)]
pub struct CompletionCalculator {
    storage: Arc<dyn Storage>,
}

impl CompletionCalculator {
    /// Create a new calculator.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Course completion for a user.
    ///
    /// An unenrolled user gets `{0, false, false}` without any lesson scan.
    /// An enrolled user on a course without lessons gets `{0, false, true}`.
    pub async fn compute(&self, course: CourseId, user: &UserId) -> Result<CourseCompletion> {
        if !self.storage.is_enrolled(user, course).await? {
            return Ok(CourseCompletion::not_enrolled());
        }

        let lessons = self.storage.course_lessons(course).await?;
        if lessons.is_empty() {
            return Ok(CourseCompletion::enrolled(0, 0));
        }

        let completed = self.completed_count(user, &lessons).await?;
        Ok(CourseCompletion::enrolled(completed, lessons.len()))
    }

    /// Completion of a single module. Unenrolled users see every count at
    /// zero and no progress is read for them.
    pub async fn module_progress(&self, module: ModuleId, user: &UserId) -> Result<ModuleProgress> {
        let module = self
            .storage
            .load_module(module)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("module {}", module)))?;
        let level = self
            .storage
            .load_level(module.level_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("level {}", module.level_id)))?;

        let enrolled = self.storage.is_enrolled(user, level.course_id).await?;
        self.summarize(module, user, enrolled).await
    }

    /// Per-module completion for every module of a course, in hierarchy
    /// order. Gated by enrollment like [`compute`](Self::compute).
    pub async fn course_outline_progress(
        &self,
        course: CourseId,
        user: &UserId,
    ) -> Result<Vec<ModuleProgress>> {
        let enrolled = self.storage.is_enrolled(user, course).await?;

        let mut outline = Vec::new();
        for level in self.storage.list_levels(course).await? {
            for module in self.storage.list_modules(level.id).await? {
                outline.push(self.summarize(module, user, enrolled).await?);
            }
        }
        Ok(outline)
    }

    /// Watch state of every lesson of a course, in hierarchy order. Lessons
    /// the user never reported read as `{0, false}`.
    pub async fn lessons_progress(
        &self,
        course: CourseId,
        user: &UserId,
    ) -> Result<Vec<LessonProgressEntry>> {
        let lessons = self.storage.course_lessons(course).await?;
        let records = self.records_by_lesson(user, &lessons).await?;

        Ok(lessons
            .iter()
            .map(|lesson| {
                let state = records
                    .get(&lesson.id)
                    .map(LessonProgress::state)
                    .unwrap_or_default();
                LessonProgressEntry {
                    lesson_id: lesson.id,
                    watched_time: state.watched_time,
                    completed: state.completed,
                }
            })
            .collect())
    }

    async fn summarize(&self, module: Module, user: &UserId, enrolled: bool) -> Result<ModuleProgress> {
        let lessons = self.storage.list_lessons(module.id).await?;
        let completed = if enrolled {
            self.completed_count(user, &lessons).await?
        } else {
            0
        };

        Ok(ModuleProgress {
            module_id: module.id,
            name: module.name,
            completed_lessons: completed,
            total_lessons: lessons.len(),
            progress_percent: completion_percent(completed, lessons.len()),
        })
    }

    async fn records_by_lesson(
        &self,
        user: &UserId,
        lessons: &[Lesson],
    ) -> Result<HashMap<LessonId, LessonProgress>> {
        let ids: Vec<LessonId> = lessons.iter().map(|l| l.id).collect();
        Ok(self
            .storage
            .list_progress(user, &ids)
            .await?
            .into_iter()
            .map(|p| (p.lesson_id, p))
            .collect())
    }

    async fn completed_count(&self, user: &UserId, lessons: &[Lesson]) -> Result<usize> {
        Ok(self
            .records_by_lesson(user, lessons)
            .await?
            .values()
            .filter(|p| p.completed)
            .count())
    }
}
