//! Catalog model - the Course → Level → Module → Lesson hierarchy.
//!
//! Relationships are plain id references resolved through the catalog
//! store; nothing here owns its children. Siblings are ordered by their
//! explicit `order` field, then by id.

use serde::{Deserialize, Serialize};
use crate::duration::LessonDuration;
use crate::id::{CourseId, LessonId, LevelId, ModuleId};
use crate::Time;

/// Default `order` for levels, modules and lessons.
pub const DEFAULT_ORDER: u32 = 1;

/// A course offered in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Unique identifier
    pub id: CourseId,

    /// Course title
    pub title: String,

    /// Long description
    pub description: String,

    /// Catalog category
    pub category: String,

    /// Free-form tags
    pub tags: Vec<String>,

    /// Human readable duration label (e.g. "8 weeks")
    pub duration: String,

    /// Average rating
    pub rating: f32,

    /// Cover image URL
    pub cover_image_url: String,

    /// Optional trailer URL
    pub trailer_url: Option<String>,

    /// When created
    pub created_at: Time,
}

impl Course {
    /// Create a course with only a title; the remaining fields start empty.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: CourseId::new(),
            title: title.into(),
            description: String::new(),
            category: String::new(),
            tags: Vec::new(),
            duration: String::new(),
            rating: 0.0,
            cover_image_url: String::new(),
            trailer_url: None,
            created_at: chrono::Utc::now(),
        }
    }
}

/// A level groups the modules of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Unique identifier
    pub id: LevelId,

    /// Owning course
    pub course_id: CourseId,

    /// Level name
    pub name: String,

    /// Position within the course
    pub order: u32,
}

impl Level {
    /// Create a level with the default order.
    pub fn new(course_id: CourseId, name: impl Into<String>) -> Self {
        Self {
            id: LevelId::new(),
            course_id,
            name: name.into(),
            order: DEFAULT_ORDER,
        }
    }

    /// Set the position within the course.
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// Sort key: explicit order, then creation order.
    pub fn sort_key(&self) -> (u32, LevelId) {
        (self.order, self.id)
    }
}

/// A module groups the lessons of a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Unique identifier
    pub id: ModuleId,

    /// Owning level
    pub level_id: LevelId,

    /// Module name
    pub name: String,

    /// Position within the level
    pub order: u32,
}

impl Module {
    /// Create a module with the default order.
    pub fn new(level_id: LevelId, name: impl Into<String>) -> Self {
        Self {
            id: ModuleId::new(),
            level_id,
            name: name.into(),
            order: DEFAULT_ORDER,
        }
    }

    /// Set the position within the level.
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// Sort key: explicit order, then creation order.
    pub fn sort_key(&self) -> (u32, ModuleId) {
        (self.order, self.id)
    }
}

/// A single video lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// Unique identifier
    pub id: LessonId,

    /// Owning module
    pub module_id: ModuleId,

    /// Lesson title
    pub title: String,

    /// Running time label, `mm:ss`
    pub duration: String,

    /// External video identifier
    pub video_id: String,

    /// Position within the module
    pub order: u32,
}

impl Lesson {
    /// Create a lesson with the default order.
    pub fn new(
        module_id: ModuleId,
        title: impl Into<String>,
        duration: impl Into<String>,
        video_id: impl Into<String>,
    ) -> Self {
        Self {
            id: LessonId::new(),
            module_id,
            title: title.into(),
            duration: duration.into(),
            video_id: video_id.into(),
            order: DEFAULT_ORDER,
        }
    }

    /// Set the position within the module.
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// Sort key: explicit order, then creation order.
    pub fn sort_key(&self) -> (u32, LessonId) {
        (self.order, self.id)
    }

    /// Parsed running time, if the label is well formed.
    pub fn parsed_duration(&self) -> Option<LessonDuration> {
        LessonDuration::parse(&self.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entities_use_default_order() {
        let course = Course::new("Rust");
        let level = Level::new(course.id, "Basics");
        let module = Module::new(level.id, "Ownership");
        let lesson = Lesson::new(module.id, "Moves", "10:32", "abc123");

        assert_eq!(level.order, DEFAULT_ORDER);
        assert_eq!(module.order, DEFAULT_ORDER);
        assert_eq!(lesson.order, DEFAULT_ORDER);
        assert_eq!(lesson.parsed_duration().map(|d| d.as_secs()), Some(632));
    }

    #[test]
    fn test_sort_key_breaks_ties_by_creation() {
        let module = ModuleId::new();
        let first = Lesson::new(module, "a", "1:00", "v1").with_order(2);
        let second = Lesson::new(module, "b", "1:00", "v2").with_order(2);
        let early = Lesson::new(module, "c", "1:00", "v3").with_order(1);

        let mut lessons = vec![second.clone(), early.clone(), first.clone()];
        lessons.sort_by_key(Lesson::sort_key);

        let titles: Vec<_> = lessons.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_course_serializes_optional_trailer() {
        let course = Course::new("Rust");
        let json = serde_json::to_value(&course).unwrap();
        assert!(json["trailer_url"].is_null());
    }
}
