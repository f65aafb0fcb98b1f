//! Enrollment model - a user's membership in a course.

use serde::{Deserialize, Serialize};
use crate::id::{CourseId, EnrollmentId, UserId};
use crate::Time;

/// Asserts that a user has joined a course.
///
/// At most one enrollment exists per (user, course) pair and `enrolled_at`
/// never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Unique identifier
    pub id: EnrollmentId,

    /// Enrolled user
    pub user_id: UserId,

    /// Course joined
    pub course_id: CourseId,

    /// When the user first enrolled
    pub enrolled_at: Time,
}

impl Enrollment {
    /// Create a new enrollment stamped with the current time.
    pub fn new(user_id: UserId, course_id: CourseId) -> Self {
        Self {
            id: EnrollmentId::new(),
            user_id,
            course_id,
            enrolled_at: chrono::Utc::now(),
        }
    }
}
