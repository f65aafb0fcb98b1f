//! Lesson progress model and the rule for folding watch reports into it.

use serde::{Deserialize, Serialize};
use crate::id::{LessonId, ProgressId, UserId};
use crate::Time;

/// Per-user, per-lesson watch state.
///
/// `watched_time` never decreases over the life of a record and
/// `completed` never goes back to `false` once set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProgress {
    /// Unique identifier
    pub id: ProgressId,

    /// Owning user
    pub user_id: UserId,

    /// Lesson being watched
    pub lesson_id: LessonId,

    /// Seconds watched
    pub watched_time: u32,

    /// Whether the user finished the lesson
    pub completed: bool,

    /// Last time the record changed
    pub updated_at: Time,
}

impl LessonProgress {
    /// A fresh record: nothing watched, not completed.
    pub fn new(user_id: UserId, lesson_id: LessonId) -> Self {
        Self {
            id: ProgressId::new(),
            user_id,
            lesson_id,
            watched_time: 0,
            completed: false,
            updated_at: chrono::Utc::now(),
        }
    }

    /// Fold a watch report into this record.
    ///
    /// Watch time keeps the maximum seen so far and completion is sticky.
    /// Returns `true` if the stored state changed.
    pub fn apply(&mut self, report: &ProgressReport) -> bool {
        let watched_time = self.watched_time.max(report.watched_time);
        let completed = self.completed || report.completed;
        let changed = watched_time != self.watched_time || completed != self.completed;

        self.watched_time = watched_time;
        self.completed = completed;
        if changed {
            self.updated_at = chrono::Utc::now();
        }
        changed
    }

    /// The externally visible part of the record.
    pub fn state(&self) -> LessonState {
        LessonState {
            watched_time: self.watched_time,
            completed: self.completed,
        }
    }
}

/// A watch event reported by a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressReport {
    /// Playback position reached, in seconds
    pub watched_time: u32,

    /// Whether the client marked the lesson finished
    pub completed: bool,
}

impl ProgressReport {
    /// Create a report.
    pub fn new(watched_time: u32, completed: bool) -> Self {
        Self {
            watched_time,
            completed,
        }
    }
}

/// Watch state as reported back to clients. An absent record reads as the
/// default `{0, false}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonState {
    /// Seconds watched
    pub watched_time: u32,

    /// Whether the lesson is finished
    pub completed: bool,
}
