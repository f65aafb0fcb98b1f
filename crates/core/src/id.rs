//! Unique identifiers for CourseTrack entities.
//!
//! Entity ids are ULIDs drawn from a process-wide monotonic generator, so
//! ordering by id is ordering by creation. The catalog relies on that to
//! break ties between siblings that share the same `order` value.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, OnceLock};
use ulid::{Generator, Ulid};

fn next_ulid() -> Ulid {
    static GENERATOR: OnceLock<Mutex<Generator>> = OnceLock::new();
    GENERATOR
        .get_or_init(|| Mutex::new(Generator::new()))
        .lock()
        .ok()
        .and_then(|mut generator| generator.generate().ok())
        // overflow within one millisecond or a poisoned lock
        .unwrap_or_else(Ulid::new)
}

macro_rules! ulid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Ulid);

        impl $name {
            /// Generate a new id.
            pub fn new() -> Self {
                Self(next_ulid())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

ulid_id!(
    /// Unique identifier for a Course
    CourseId
);
ulid_id!(
    /// Unique identifier for a Level within a course
    LevelId
);
ulid_id!(
    /// Unique identifier for a Module within a level
    ModuleId
);
ulid_id!(
    /// Unique identifier for a Lesson
    LessonId
);
ulid_id!(
    /// Unique identifier for an Enrollment
    EnrollmentId
);
ulid_id!(
    /// Unique identifier for a LessonProgress record
    ProgressId
);

/// Identity of a user, as handed over by the authentication layer.
///
/// Only the identity travels through this system, never credentials.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
