//! Boundary operations consumed by the request layer.
//!
//! Every call takes the caller identity explicitly. `None` means the request
//! carried no identity and the operation answers `Unauthenticated`.

use std::sync::Arc;
use coursetrack_core::{
    Course, CourseId, Enrollment, LessonDuration, LessonId, LessonState, ModuleId, ProgressReport,
    UserId,
};
use coursetrack_storage::{CatalogStore, EnrollmentStore, Storage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calculator::{CompletionCalculator, CourseCompletion, LessonProgressEntry, ModuleProgress};
use crate::config::TrackerConfig;
use crate::error::{Result, ServiceError};
use crate::policy::ProgressPolicy;

/// Result of an enroll call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollOutcome {
    /// `true` on first enrollment (201), `false` when it already existed (200)
    pub created: bool,

    /// The stored enrollment
    pub enrollment: Enrollment,
}

/// Watch state of a lesson together with how far through it the user is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonWatchStatus {
    /// Lesson
    pub lesson_id: LessonId,

    /// Seconds watched
    pub watched_time: u32,

    /// Whether the lesson is finished
    pub completed: bool,

    /// Share of the running time watched, floored, 0..=100
    pub watched_percent: u8,

    /// The user watched enough to be offered "mark as completed"
    pub can_mark_completed: bool,
}

/// Courses a user is enrolled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrolledCourses {
    /// Number of enrollments
    pub count: usize,

    /// Enrolled courses, oldest enrollment first
    pub courses: Vec<Course>,
}

/// Course enrollment and progress service.
#[derive(Clone)]
pub struct CourseProgressService {
    storage: Arc<dyn Storage>,
    policy: ProgressPolicy,
    calculator: CompletionCalculator,
    config: TrackerConfig,
}

impl CourseProgressService {
    /// Create a service with the default configuration.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_config(storage, TrackerConfig::default())
    }

    /// Create a service with an explicit configuration.
    pub fn with_config(storage: Arc<dyn Storage>, config: TrackerConfig) -> Self {
        Self {
            policy: ProgressPolicy::new(storage.clone()),
            calculator: CompletionCalculator::new(storage.clone()),
            storage,
            config,
        }
    }

    /// Enroll the caller in a course. Idempotent.
    pub async fn enroll(&self, user: Option<&UserId>, course: CourseId) -> Result<EnrollOutcome> {
        let user = require_user(user)?;
        self.require_course(course).await?;

        let (enrollment, created) = self.storage.enroll(user, course).await?;
        if created {
            info!(%user, %course, "Enrolled in course");
        } else {
            debug!(%user, %course, "Already enrolled");
        }
        Ok(EnrollOutcome {
            created,
            enrollment,
        })
    }

    /// Completion of a course for the caller.
    pub async fn course_progress(
        &self,
        user: Option<&UserId>,
        course: CourseId,
    ) -> Result<CourseCompletion> {
        let user = require_user(user)?;
        self.require_course(course).await?;
        Ok(self.calculator.compute(course, user).await?)
    }

    /// Watch state of one lesson. A lesson never reported reads as `{0, false}`.
    pub async fn lesson_progress(&self, user: Option<&UserId>, lesson: LessonId) -> Result<LessonState> {
        let user = require_user(user)?;
        self.require_lesson(lesson).await?;
        Ok(self.policy.current(user, lesson).await?)
    }

    /// Merge a watch report into the caller's record and return the
    /// post-merge state.
    pub async fn update_lesson_progress(
        &self,
        user: Option<&UserId>,
        lesson: LessonId,
        watched_time: u32,
        completed: bool,
    ) -> Result<LessonState> {
        let user = require_user(user)?;
        self.require_lesson(lesson).await?;
        let progress = self
            .policy
            .report(user, lesson, ProgressReport::new(watched_time, completed))
            .await?;
        Ok(progress.state())
    }

    /// Watch state of every lesson in a course, in hierarchy order.
    pub async fn lessons_progress_for_course(
        &self,
        user: Option<&UserId>,
        course: CourseId,
    ) -> Result<Vec<LessonProgressEntry>> {
        let user = require_user(user)?;
        self.require_course(course).await?;
        Ok(self.calculator.lessons_progress(course, user).await?)
    }

    /// Watch state of a lesson with its watched share of the running time.
    pub async fn lesson_watch_status(
        &self,
        user: Option<&UserId>,
        lesson: LessonId,
    ) -> Result<LessonWatchStatus> {
        let user = require_user(user)?;
        let found = self.require_lesson(lesson).await?;
        let state = self.policy.current(user, lesson).await?;

        let watched_percent = found
            .parsed_duration()
            .map(|d: LessonDuration| d.watched_percent(state.watched_time))
            .unwrap_or(0);
        let can_mark_completed =
            !state.completed && watched_percent >= self.config.completion_threshold_percent();

        Ok(LessonWatchStatus {
            lesson_id: lesson,
            watched_time: state.watched_time,
            completed: state.completed,
            watched_percent,
            can_mark_completed,
        })
    }

    /// Per-module completion of a course. Unenrolled callers see every
    /// module at zero.
    pub async fn course_outline_progress(
        &self,
        user: Option<&UserId>,
        course: CourseId,
    ) -> Result<Vec<ModuleProgress>> {
        let user = require_user(user)?;
        self.require_course(course).await?;
        Ok(self.calculator.course_outline_progress(course, user).await?)
    }

    /// Completion of a single module. Unenrolled callers see zero.
    pub async fn module_progress(
        &self,
        user: Option<&UserId>,
        module: ModuleId,
    ) -> Result<ModuleProgress> {
        let user = require_user(user)?;
        Ok(self.calculator.module_progress(module, user).await?)
    }

    /// Courses the caller is enrolled in.
    pub async fn enrolled_courses(&self, user: Option<&UserId>) -> Result<EnrolledCourses> {
        let user = require_user(user)?;

        let mut courses = Vec::new();
        for enrollment in self.storage.list_enrollments(user).await? {
            if let Some(course) = self.storage.load_course(enrollment.course_id).await? {
                courses.push(course);
            }
        }
        Ok(EnrolledCourses {
            count: courses.len(),
            courses,
        })
    }

    /// Highest rated courses, best first. Needs no identity.
    pub async fn top_courses(&self, limit: usize) -> Result<Vec<Course>> {
        let mut courses = self.storage.list_courses().await?;
        courses.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        courses.truncate(limit);
        Ok(courses)
    }

    async fn require_course(&self, course: CourseId) -> Result<Course> {
        self.storage
            .load_course(course)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("course {}", course)))
    }

    async fn require_lesson(&self, lesson: LessonId) -> Result<coursetrack_core::Lesson> {
        self.storage
            .load_lesson(lesson)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("lesson {}", lesson)))
    }
}

fn require_user(user: Option<&UserId>) -> Result<&UserId> {
    user.ok_or(ServiceError::Unauthenticated)
}
