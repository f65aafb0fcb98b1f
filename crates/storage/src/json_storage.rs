//! JSON file storage implementation.
//!
//! Stores every entity as a JSON file under a root directory:
//!
//! ```text
//! courses/<course>.json
//! levels/<level>.json
//! modules/<module>.json
//! lessons/<lesson>.json
//! enrollments/<user>/<course>.json
//! progress/<user>/<lesson>.json
//! ```
//!
//! Enrollment and progress files are keyed by their natural (user, course)
//! and (user, lesson) pairs, which is what keeps them unique. User ids are
//! hex encoded to be safe as directory names. Writes go through a temp file
//! and a rename, and are serialized by a single write lock.

use std::path::{Path, PathBuf};
use coursetrack_core::{
    Course, CourseId, Enrollment, Lesson, LessonId, LessonProgress, Level, LevelId, Module,
    ModuleId, ProgressReport, UserId,
};
use super::trait_::{
    CatalogStore, EnrollmentStore, MergeOutcome, ProgressStore, Result, StorageError,
};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStorage {
    /// Create storage rooted at `root`, creating the directory layout.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        for dir in ["courses", "levels", "modules", "lessons", "enrollments", "progress"] {
            fs::create_dir_all(root.join(dir)).await?;
        }

        debug!(root = %root.display(), "Opened JSON storage");
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn course_path(&self, id: CourseId) -> PathBuf {
        self.root.join("courses").join(format!("{}.json", id))
    }
    fn level_path(&self, id: LevelId) -> PathBuf {
        self.root.join("levels").join(format!("{}.json", id))
    }
    fn module_path(&self, id: ModuleId) -> PathBuf {
        self.root.join("modules").join(format!("{}.json", id))
    }
    fn lesson_path(&self, id: LessonId) -> PathBuf {
        self.root.join("lessons").join(format!("{}.json", id))
    }
    fn enrollment_dir(&self, user: &UserId) -> PathBuf {
        self.root.join("enrollments").join(user_key(user))
    }
    fn enrollment_path(&self, user: &UserId, course: CourseId) -> PathBuf {
        self.enrollment_dir(user).join(format!("{}.json", course))
    }
    fn progress_dir(&self, user: &UserId) -> PathBuf {
        self.root.join("progress").join(user_key(user))
    }
    fn progress_path(&self, user: &UserId, lesson: LessonId) -> PathBuf {
        self.progress_dir(user).join(format!("{}.json", lesson))
    }

    /// Remove `<file_name>` from every per-user directory under `kind`.
    async fn remove_from_user_dirs(&self, kind: &str, file_name: &str) -> Result<()> {
        let mut users = match fs::read_dir(self.root.join(kind)).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = users.next_entry().await? {
            remove_if_exists(&entry.path().join(file_name)).await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CatalogStore for JsonStorage {
    async fn save_course(&self, course: &Course) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        write_json(&self.course_path(course.id), course).await
    }

    async fn save_level(&self, level: &Level) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if !fs::try_exists(self.course_path(level.course_id)).await? {
            return Err(StorageError::NotFound(format!("course {}", level.course_id)));
        }
        write_json(&self.level_path(level.id), level).await
    }

    async fn save_module(&self, module: &Module) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if !fs::try_exists(self.level_path(module.level_id)).await? {
            return Err(StorageError::NotFound(format!("level {}", module.level_id)));
        }
        write_json(&self.module_path(module.id), module).await
    }

    async fn save_lesson(&self, lesson: &Lesson) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if !fs::try_exists(self.module_path(lesson.module_id)).await? {
            return Err(StorageError::NotFound(format!("module {}", lesson.module_id)));
        }
        write_json(&self.lesson_path(lesson.id), lesson).await
    }

    async fn load_course(&self, id: CourseId) -> Result<Option<Course>> {
        read_json(&self.course_path(id)).await
    }

    async fn load_level(&self, id: LevelId) -> Result<Option<Level>> {
        read_json(&self.level_path(id)).await
    }

    async fn load_module(&self, id: ModuleId) -> Result<Option<Module>> {
        read_json(&self.module_path(id)).await
    }

    async fn load_lesson(&self, id: LessonId) -> Result<Option<Lesson>> {
        read_json(&self.lesson_path(id)).await
    }

    async fn list_courses(&self) -> Result<Vec<Course>> {
        let mut courses: Vec<Course> = list_dir(&self.root.join("courses")).await?;
        courses.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(courses)
    }

    async fn list_levels(&self, course: CourseId) -> Result<Vec<Level>> {
        let mut levels: Vec<Level> = list_dir(&self.root.join("levels")).await?;
        levels.retain(|l| l.course_id == course);
        levels.sort_by_key(Level::sort_key);
        Ok(levels)
    }

    async fn list_modules(&self, level: LevelId) -> Result<Vec<Module>> {
        let mut modules: Vec<Module> = list_dir(&self.root.join("modules")).await?;
        modules.retain(|m| m.level_id == level);
        modules.sort_by_key(Module::sort_key);
        Ok(modules)
    }

    async fn list_lessons(&self, module: ModuleId) -> Result<Vec<Lesson>> {
        let mut lessons: Vec<Lesson> = list_dir(&self.root.join("lessons")).await?;
        lessons.retain(|l| l.module_id == module);
        lessons.sort_by_key(Lesson::sort_key);
        Ok(lessons)
    }

    async fn delete_course(&self, id: CourseId) -> Result<()> {
        // Scan under the lock so no child saved mid-delete survives it.
        let _guard = self.write_lock.lock().await;

        let levels: Vec<Level> = list_dir(&self.root.join("levels")).await?;
        let levels: Vec<Level> = levels.into_iter().filter(|l| l.course_id == id).collect();
        let modules: Vec<Module> = list_dir(&self.root.join("modules")).await?;
        let modules: Vec<Module> = modules
            .into_iter()
            .filter(|m| levels.iter().any(|l| l.id == m.level_id))
            .collect();
        let lessons: Vec<Lesson> = list_dir(&self.root.join("lessons")).await?;
        let lessons: Vec<Lesson> = lessons
            .into_iter()
            .filter(|l| modules.iter().any(|m| m.id == l.module_id))
            .collect();

        for lesson in &lessons {
            self.remove_from_user_dirs("progress", &format!("{}.json", lesson.id))
                .await?;
            remove_if_exists(&self.lesson_path(lesson.id)).await?;
        }
        for module in &modules {
            remove_if_exists(&self.module_path(module.id)).await?;
        }
        for level in &levels {
            remove_if_exists(&self.level_path(level.id)).await?;
        }
        self.remove_from_user_dirs("enrollments", &format!("{}.json", id))
            .await?;
        remove_if_exists(&self.course_path(id)).await?;

        debug!(course = %id, lessons = lessons.len(), "Deleted course");
        Ok(())
    }
}

#[async_trait::async_trait]
impl EnrollmentStore for JsonStorage {
    async fn enroll(&self, user: &UserId, course: CourseId) -> Result<(Enrollment, bool)> {
        let _guard = self.write_lock.lock().await;

        let path = self.enrollment_path(user, course);
        if let Some(existing) = read_json::<Enrollment>(&path).await? {
            return Ok((existing, false));
        }
        if !fs::try_exists(self.course_path(course)).await? {
            return Err(StorageError::NotFound(format!("course {}", course)));
        }

        let enrollment = Enrollment::new(user.clone(), course);
        fs::create_dir_all(self.enrollment_dir(user)).await?;
        write_json(&path, &enrollment).await?;
        Ok((enrollment, true))
    }

    async fn is_enrolled(&self, user: &UserId, course: CourseId) -> Result<bool> {
        Ok(fs::try_exists(self.enrollment_path(user, course)).await?)
    }

    async fn list_enrollments(&self, user: &UserId) -> Result<Vec<Enrollment>> {
        let mut enrollments: Vec<Enrollment> = list_dir(&self.enrollment_dir(user)).await?;
        enrollments.sort_by(|a, b| a.enrolled_at.cmp(&b.enrolled_at).then(a.id.cmp(&b.id)));
        Ok(enrollments)
    }
}

#[async_trait::async_trait]
impl ProgressStore for JsonStorage {
    async fn get_progress(&self, user: &UserId, lesson: LessonId) -> Result<Option<LessonProgress>> {
        read_json(&self.progress_path(user, lesson)).await
    }

    async fn upsert_progress(
        &self,
        user: &UserId,
        lesson: LessonId,
        watched_time: u32,
        completed: bool,
    ) -> Result<LessonProgress> {
        let _guard = self.write_lock.lock().await;

        let path = self.progress_path(user, lesson);
        let mut progress = match read_json::<LessonProgress>(&path).await? {
            Some(existing) => existing,
            None => {
                if !fs::try_exists(self.lesson_path(lesson)).await? {
                    return Err(StorageError::NotFound(format!("lesson {}", lesson)));
                }
                LessonProgress::new(user.clone(), lesson)
            }
        };
        progress.watched_time = watched_time;
        progress.completed = completed;
        progress.updated_at = chrono::Utc::now();

        fs::create_dir_all(self.progress_dir(user)).await?;
        write_json(&path, &progress).await?;
        Ok(progress)
    }

    async fn merge_progress(
        &self,
        user: &UserId,
        lesson: LessonId,
        report: &ProgressReport,
    ) -> Result<MergeOutcome> {
        let _guard = self.write_lock.lock().await;

        let path = self.progress_path(user, lesson);
        let (mut progress, created) = match read_json::<LessonProgress>(&path).await? {
            Some(existing) => (existing, false),
            None => {
                if !fs::try_exists(self.lesson_path(lesson)).await? {
                    return Err(StorageError::NotFound(format!("lesson {}", lesson)));
                }
                (LessonProgress::new(user.clone(), lesson), true)
            }
        };

        let changed = progress.apply(report);
        if changed || created {
            fs::create_dir_all(self.progress_dir(user)).await?;
            write_json(&path, &progress).await?;
        }
        Ok(MergeOutcome { progress, created })
    }

    async fn list_progress(&self, user: &UserId, lessons: &[LessonId]) -> Result<Vec<LessonProgress>> {
        let mut records = Vec::with_capacity(lessons.len());
        for lesson in lessons {
            if let Some(progress) = read_json(&self.progress_path(user, *lesson)).await? {
                records.push(progress);
            }
        }
        Ok(records)
    }
}

fn user_key(user: &UserId) -> String {
    user.as_str().bytes().map(|b| format!("{:02x}", b)).collect()
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json.as_bytes()).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    fs::remove_file(path).await.or_else(|e| {
        if e.kind() == std::io::ErrorKind::NotFound { Ok(()) } else { Err(e) }
    })?;
    Ok(())
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = match fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(items),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        if let Some(item) = read_json(&entry.path()).await? {
            items.push(item);
        }
    }
    Ok(items)
}
