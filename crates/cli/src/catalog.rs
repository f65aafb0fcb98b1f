//! Catalog import file format.
//!
//! A single JSON document describing courses with their levels, modules and
//! lessons nested inline. Omitted `order` fields take the catalog default.

use anyhow::Result;
use coursetrack_core::{Course, CourseId, Lesson, Level, Module, DEFAULT_ORDER};
use coursetrack_storage::{CatalogStore, Storage};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub courses: Vec<CourseEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CourseEntry {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub cover_image_url: String,
    #[serde(default)]
    pub trailer_url: Option<String>,
    #[serde(default)]
    pub levels: Vec<LevelEntry>,
}

#[derive(Debug, Deserialize)]
pub struct LevelEntry {
    pub name: String,
    #[serde(default = "default_order")]
    pub order: u32,
    #[serde(default)]
    pub modules: Vec<ModuleEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ModuleEntry {
    pub name: String,
    #[serde(default = "default_order")]
    pub order: u32,
    #[serde(default)]
    pub lessons: Vec<LessonEntry>,
}

#[derive(Debug, Deserialize)]
pub struct LessonEntry {
    pub title: String,
    pub duration: String,
    #[serde(default)]
    pub video_id: String,
    #[serde(default = "default_order")]
    pub order: u32,
}

fn default_order() -> u32 {
    DEFAULT_ORDER
}

/// Write every entity in the file, parents first. Returns the new course ids.
pub async fn import(storage: &dyn Storage, file: CatalogFile) -> Result<Vec<CourseId>> {
    let mut imported = Vec::with_capacity(file.courses.len());

    for entry in file.courses {
        let mut course = Course::new(entry.title);
        course.description = entry.description;
        course.category = entry.category;
        course.tags = entry.tags;
        course.duration = entry.duration;
        course.rating = entry.rating;
        course.cover_image_url = entry.cover_image_url;
        course.trailer_url = entry.trailer_url;
        storage.save_course(&course).await?;

        let mut lesson_count = 0;
        for level_entry in entry.levels {
            let level = Level::new(course.id, level_entry.name).with_order(level_entry.order);
            storage.save_level(&level).await?;

            for module_entry in level_entry.modules {
                let module = Module::new(level.id, module_entry.name).with_order(module_entry.order);
                storage.save_module(&module).await?;

                for lesson_entry in module_entry.lessons {
                    let lesson = Lesson::new(
                        module.id,
                        lesson_entry.title,
                        lesson_entry.duration,
                        lesson_entry.video_id,
                    )
                    .with_order(lesson_entry.order);
                    storage.save_lesson(&lesson).await?;
                    lesson_count += 1;
                }
            }
        }

        info!(course = %course.id, title = %course.title, lessons = lesson_count, "Imported course");
        imported.push(course.id);
    }

    Ok(imported)
}
