//! SQLite storage backend for CourseTrack.
//!
//! Relational tables with foreign keys that cascade from courses down to
//! progress rows. Uniqueness of (user, course) and (user, lesson) is enforced
//! by the schema, and both enrollment and progress merges are single
//! statements, so concurrent callers cannot interleave a read and a write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coursetrack_core::{
    Course, CourseId, Enrollment, EnrollmentId, Lesson, LessonId, LessonProgress, Level, LevelId,
    Module, ModuleId, ProgressId, ProgressReport, UserId,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use super::trait_::{
    CatalogStore, EnrollmentStore, MergeOutcome, ProgressStore, Result, StorageError,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS courses (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        category TEXT NOT NULL,
        tags TEXT NOT NULL,
        duration TEXT NOT NULL,
        rating REAL NOT NULL,
        cover_image_url TEXT NOT NULL,
        trailer_url TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS levels (
        id TEXT PRIMARY KEY,
        course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        ord INTEGER NOT NULL DEFAULT 1
    )",
    "CREATE TABLE IF NOT EXISTS modules (
        id TEXT PRIMARY KEY,
        level_id TEXT NOT NULL REFERENCES levels(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        ord INTEGER NOT NULL DEFAULT 1
    )",
    "CREATE TABLE IF NOT EXISTS lessons (
        id TEXT PRIMARY KEY,
        module_id TEXT NOT NULL REFERENCES modules(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        duration TEXT NOT NULL,
        video_id TEXT NOT NULL,
        ord INTEGER NOT NULL DEFAULT 1
    )",
    "CREATE TABLE IF NOT EXISTS enrollments (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
        enrolled_at TEXT NOT NULL,
        UNIQUE (user_id, course_id)
    )",
    "CREATE TABLE IF NOT EXISTS lesson_progress (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        lesson_id TEXT NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
        watched_time INTEGER NOT NULL DEFAULT 0 CHECK (watched_time >= 0),
        completed INTEGER NOT NULL DEFAULT 0,
        updated_at TEXT NOT NULL,
        UNIQUE (user_id, lesson_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_levels_course ON levels(course_id)",
    "CREATE INDEX IF NOT EXISTS idx_modules_level ON modules(level_id)",
    "CREATE INDEX IF NOT EXISTS idx_lessons_module ON lessons(module_id)",
];

/// SQLite storage implementation.
#[derive(Clone)]
pub struct SqliteStorage {
    /// Database connection pool
    pool: sqlx::SqlitePool,
}

impl SqliteStorage {
    /// Open (creating if missing) a database file.
    pub async fn new_from_path(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        let storage = Self { pool };
        storage.init_schema().await?;
        debug!(path = %path.display(), "Opened SQLite storage");

        Ok(storage)
    }

    /// Create an in-memory SQLite storage for testing.
    ///
    /// Every connection to `:memory:` is its own database, so the pool is
    /// pinned to one connection.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let storage = Self { pool };
        storage.init_schema().await?;

        Ok(storage)
    }

    /// Initialize the database schema.
    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Check if the database is healthy.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    async fn exists(&self, table: &str, id: String) -> Result<bool> {
        let sql = format!("SELECT 1 FROM {} WHERE id = ?", table);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.is_some())
    }
}

/// A parent row that vanished between lookup and write surfaces as a foreign
/// key violation; report it the same way as a failed lookup.
fn missing_parent(err: sqlx::Error, what: impl FnOnce() -> String) -> StorageError {
    match err {
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
            StorageError::NotFound(what())
        }
        other => other.into(),
    }
}

fn parse_id<T: FromStr>(row: &SqliteRow, column: &str) -> Result<T> {
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|_| StorageError::Other(format!("invalid id in {}: {}", column, raw)))
}

fn get_u32(row: &SqliteRow, column: &str) -> Result<u32> {
    let raw: i64 = row.try_get(column)?;
    u32::try_from(raw).map_err(|_| StorageError::Other(format!("{} out of range: {}", column, raw)))
}

fn course_from_row(row: &SqliteRow) -> Result<Course> {
    let tags: String = row.try_get("tags")?;
    let rating: f64 = row.try_get("rating")?;
    Ok(Course {
        id: parse_id(row, "id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        tags: serde_json::from_str(&tags)?,
        duration: row.try_get("duration")?,
        rating: rating as f32,
        cover_image_url: row.try_get("cover_image_url")?,
        trailer_url: row.try_get("trailer_url")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn level_from_row(row: &SqliteRow) -> Result<Level> {
    Ok(Level {
        id: parse_id(row, "id")?,
        course_id: parse_id(row, "course_id")?,
        name: row.try_get("name")?,
        order: get_u32(row, "ord")?,
    })
}

fn module_from_row(row: &SqliteRow) -> Result<Module> {
    Ok(Module {
        id: parse_id(row, "id")?,
        level_id: parse_id(row, "level_id")?,
        name: row.try_get("name")?,
        order: get_u32(row, "ord")?,
    })
}

fn lesson_from_row(row: &SqliteRow) -> Result<Lesson> {
    Ok(Lesson {
        id: parse_id(row, "id")?,
        module_id: parse_id(row, "module_id")?,
        title: row.try_get("title")?,
        duration: row.try_get("duration")?,
        video_id: row.try_get("video_id")?,
        order: get_u32(row, "ord")?,
    })
}

fn enrollment_from_row(row: &SqliteRow) -> Result<Enrollment> {
    let user: String = row.try_get("user_id")?;
    Ok(Enrollment {
        id: parse_id::<EnrollmentId>(row, "id")?,
        user_id: UserId::new(user),
        course_id: parse_id(row, "course_id")?,
        enrolled_at: row.try_get::<DateTime<Utc>, _>("enrolled_at")?,
    })
}

fn progress_from_row(row: &SqliteRow) -> Result<LessonProgress> {
    let user: String = row.try_get("user_id")?;
    Ok(LessonProgress {
        id: parse_id::<ProgressId>(row, "id")?,
        user_id: UserId::new(user),
        lesson_id: parse_id(row, "lesson_id")?,
        watched_time: get_u32(row, "watched_time")?,
        completed: row.try_get("completed")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

#[async_trait]
impl CatalogStore for SqliteStorage {
    async fn save_course(&self, course: &Course) -> Result<()> {
        sqlx::query(
            "INSERT INTO courses (id, title, description, category, tags, duration, rating,
                cover_image_url, trailer_url, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                category = excluded.category,
                tags = excluded.tags,
                duration = excluded.duration,
                rating = excluded.rating,
                cover_image_url = excluded.cover_image_url,
                trailer_url = excluded.trailer_url",
        )
        .bind(course.id.to_string())
        .bind(&course.title)
        .bind(&course.description)
        .bind(&course.category)
        .bind(serde_json::to_string(&course.tags)?)
        .bind(&course.duration)
        .bind(f64::from(course.rating))
        .bind(&course.cover_image_url)
        .bind(&course.trailer_url)
        .bind(course.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_level(&self, level: &Level) -> Result<()> {
        if !self.exists("courses", level.course_id.to_string()).await? {
            return Err(StorageError::NotFound(format!("course {}", level.course_id)));
        }
        sqlx::query(
            "INSERT INTO levels (id, course_id, name, ord) VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                course_id = excluded.course_id, name = excluded.name, ord = excluded.ord",
        )
        .bind(level.id.to_string())
        .bind(level.course_id.to_string())
        .bind(&level.name)
        .bind(i64::from(level.order))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_module(&self, module: &Module) -> Result<()> {
        if !self.exists("levels", module.level_id.to_string()).await? {
            return Err(StorageError::NotFound(format!("level {}", module.level_id)));
        }
        sqlx::query(
            "INSERT INTO modules (id, level_id, name, ord) VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                level_id = excluded.level_id, name = excluded.name, ord = excluded.ord",
        )
        .bind(module.id.to_string())
        .bind(module.level_id.to_string())
        .bind(&module.name)
        .bind(i64::from(module.order))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_lesson(&self, lesson: &Lesson) -> Result<()> {
        if !self.exists("modules", lesson.module_id.to_string()).await? {
            return Err(StorageError::NotFound(format!("module {}", lesson.module_id)));
        }
        sqlx::query(
            "INSERT INTO lessons (id, module_id, title, duration, video_id, ord)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                module_id = excluded.module_id, title = excluded.title,
                duration = excluded.duration, video_id = excluded.video_id, ord = excluded.ord",
        )
        .bind(lesson.id.to_string())
        .bind(lesson.module_id.to_string())
        .bind(&lesson.title)
        .bind(&lesson.duration)
        .bind(&lesson.video_id)
        .bind(i64::from(lesson.order))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_course(&self, id: CourseId) -> Result<Option<Course>> {
        let row = sqlx::query("SELECT * FROM courses WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(course_from_row).transpose()
    }

    async fn load_level(&self, id: LevelId) -> Result<Option<Level>> {
        let row = sqlx::query("SELECT * FROM levels WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(level_from_row).transpose()
    }

    async fn load_module(&self, id: ModuleId) -> Result<Option<Module>> {
        let row = sqlx::query("SELECT * FROM modules WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(module_from_row).transpose()
    }

    async fn load_lesson(&self, id: LessonId) -> Result<Option<Lesson>> {
        let row = sqlx::query("SELECT * FROM lessons WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(lesson_from_row).transpose()
    }

    async fn list_courses(&self) -> Result<Vec<Course>> {
        let rows = sqlx::query("SELECT * FROM courses ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(course_from_row).collect()
    }

    async fn list_levels(&self, course: CourseId) -> Result<Vec<Level>> {
        let rows = sqlx::query("SELECT * FROM levels WHERE course_id = ? ORDER BY ord, id")
            .bind(course.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(level_from_row).collect()
    }

    async fn list_modules(&self, level: LevelId) -> Result<Vec<Module>> {
        let rows = sqlx::query("SELECT * FROM modules WHERE level_id = ? ORDER BY ord, id")
            .bind(level.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(module_from_row).collect()
    }

    async fn list_lessons(&self, module: ModuleId) -> Result<Vec<Lesson>> {
        let rows = sqlx::query("SELECT * FROM lessons WHERE module_id = ? ORDER BY ord, id")
            .bind(module.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(lesson_from_row).collect()
    }

    async fn delete_course(&self, id: CourseId) -> Result<()> {
        let result = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        debug!(course = %id, deleted = result.rows_affected(), "Deleted course");
        Ok(())
    }

    async fn course_lessons(&self, course: CourseId) -> Result<Vec<Lesson>> {
        let rows = sqlx::query(
            "SELECT l.* FROM lessons l
            JOIN modules m ON m.id = l.module_id
            JOIN levels v ON v.id = m.level_id
            WHERE v.course_id = ?
            ORDER BY v.ord, v.id, m.ord, m.id, l.ord, l.id",
        )
        .bind(course.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(lesson_from_row).collect()
    }
}

#[async_trait]
impl EnrollmentStore for SqliteStorage {
    async fn enroll(&self, user: &UserId, course: CourseId) -> Result<(Enrollment, bool)> {
        if !self.exists("courses", course.to_string()).await? {
            return Err(StorageError::NotFound(format!("course {}", course)));
        }

        let candidate = Enrollment::new(user.clone(), course);
        let inserted = sqlx::query(
            "INSERT INTO enrollments (id, user_id, course_id, enrolled_at) VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, course_id) DO NOTHING",
        )
        .bind(candidate.id.to_string())
        .bind(user.as_str())
        .bind(course.to_string())
        .bind(candidate.enrolled_at)
        .execute(&self.pool)
        .await
        .map_err(|e| missing_parent(e, || format!("course {}", course)))?
        .rows_affected();

        let row = sqlx::query("SELECT * FROM enrollments WHERE user_id = ? AND course_id = ?")
            .bind(user.as_str())
            .bind(course.to_string())
            .fetch_one(&self.pool)
            .await?;

        Ok((enrollment_from_row(&row)?, inserted == 1))
    }

    async fn is_enrolled(&self, user: &UserId, course: CourseId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM enrollments WHERE user_id = ? AND course_id = ?")
            .bind(user.as_str())
            .bind(course.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn list_enrollments(&self, user: &UserId) -> Result<Vec<Enrollment>> {
        let rows = sqlx::query("SELECT * FROM enrollments WHERE user_id = ? ORDER BY enrolled_at, id")
            .bind(user.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(enrollment_from_row).collect()
    }
}

#[async_trait]
impl ProgressStore for SqliteStorage {
    async fn get_progress(&self, user: &UserId, lesson: LessonId) -> Result<Option<LessonProgress>> {
        let row = sqlx::query("SELECT * FROM lesson_progress WHERE user_id = ? AND lesson_id = ?")
            .bind(user.as_str())
            .bind(lesson.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(progress_from_row).transpose()
    }

    async fn upsert_progress(
        &self,
        user: &UserId,
        lesson: LessonId,
        watched_time: u32,
        completed: bool,
    ) -> Result<LessonProgress> {
        let row = sqlx::query(
            "INSERT INTO lesson_progress (id, user_id, lesson_id, watched_time, completed, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                watched_time = excluded.watched_time,
                completed = excluded.completed,
                updated_at = excluded.updated_at
            RETURNING *",
        )
        .bind(ProgressId::new().to_string())
        .bind(user.as_str())
        .bind(lesson.to_string())
        .bind(i64::from(watched_time))
        .bind(completed)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| missing_parent(e, || format!("lesson {}", lesson)))?;

        progress_from_row(&row)
    }

    async fn merge_progress(
        &self,
        user: &UserId,
        lesson: LessonId,
        report: &ProgressReport,
    ) -> Result<MergeOutcome> {
        // An unknown lesson fails the foreign key check inside the upsert.
        // Same rule as `LessonProgress::apply`, evaluated inside the upsert
        // so the read and the write are one statement.
        let candidate = LessonProgress::new(user.clone(), lesson);
        let row = sqlx::query(
            "INSERT INTO lesson_progress (id, user_id, lesson_id, watched_time, completed, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                watched_time = MAX(lesson_progress.watched_time, excluded.watched_time),
                completed = (lesson_progress.completed OR excluded.completed),
                updated_at = CASE
                    WHEN excluded.watched_time > lesson_progress.watched_time
                      OR (excluded.completed AND NOT lesson_progress.completed)
                    THEN excluded.updated_at
                    ELSE lesson_progress.updated_at
                END
            RETURNING *",
        )
        .bind(candidate.id.to_string())
        .bind(user.as_str())
        .bind(lesson.to_string())
        .bind(i64::from(report.watched_time))
        .bind(report.completed)
        .bind(candidate.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| missing_parent(e, || format!("lesson {}", lesson)))?;

        let progress = progress_from_row(&row)?;
        let created = progress.id == candidate.id;
        Ok(MergeOutcome { progress, created })
    }

    async fn list_progress(&self, user: &UserId, lessons: &[LessonId]) -> Result<Vec<LessonProgress>> {
        if lessons.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; lessons.len()].join(", ");
        let sql = format!(
            "SELECT * FROM lesson_progress WHERE user_id = ? AND lesson_id IN ({})",
            placeholders
        );
        let mut query = sqlx::query(&sql).bind(user.as_str());
        for lesson in lessons {
            query = query.bind(lesson.to_string());
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(progress_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn seeded(lesson_count: usize) -> (SqliteStorage, Course, Vec<Lesson>) {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let course = Course::new("SQL for learners");
        storage.save_course(&course).await.unwrap();
        let level = Level::new(course.id, "Level 1");
        storage.save_level(&level).await.unwrap();
        let module = Module::new(level.id, "Joins");
        storage.save_module(&module).await.unwrap();

        let mut lessons = Vec::new();
        for i in 0..lesson_count {
            let lesson = Lesson::new(module.id, format!("Lesson {}", i), "08:00", format!("v{}", i))
                .with_order(i as u32 + 1);
            storage.save_lesson(&lesson).await.unwrap();
            lessons.push(lesson);
        }
        (storage, course, lessons)
    }

    #[tokio::test]
    async fn test_health_check() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        assert!(storage.health_check().await);
    }

    #[tokio::test]
    async fn test_course_roundtrip() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let mut course = Course::new("Roundtrip");
        course.tags = vec!["rust".to_string(), "async".to_string()];
        course.trailer_url = Some("https://video.example/trailer".to_string());
        storage.save_course(&course).await.unwrap();

        let loaded = storage.load_course(course.id).await.unwrap().unwrap();
        assert_eq!(loaded.tags, course.tags);
        assert_eq!(loaded.trailer_url, course.trailer_url);
    }

    #[tokio::test]
    async fn test_enroll_twice() {
        let (storage, course, _) = seeded(0).await;
        let user = UserId::new("42");

        let (first, created) = storage.enroll(&user, course.id).await.unwrap();
        assert!(created);
        let (second, created) = storage.enroll(&user, course.id).await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(storage.list_enrollments(&user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_merge_is_monotonic_and_sticky() {
        let (storage, _, lessons) = seeded(1).await;
        let user = UserId::new("42");
        let lesson = lessons[0].id;

        let first = storage
            .merge_progress(&user, lesson, &ProgressReport::new(50, true))
            .await
            .unwrap();
        assert!(first.created);

        let second = storage
            .merge_progress(&user, lesson, &ProgressReport::new(30, false))
            .await
            .unwrap();
        assert!(!second.created);
        assert_eq!(second.progress.watched_time, 50);
        assert!(second.progress.completed);
        assert_eq!(second.progress.updated_at, first.progress.updated_at);
    }

    #[tokio::test]
    async fn test_concurrent_merges() {
        let (storage, _, lessons) = seeded(1).await;
        let storage = Arc::new(storage);
        let user = UserId::new("42");
        let lesson = lessons[0].id;

        let tasks = (1..=10u32).map(|i| {
            let storage = storage.clone();
            let user = user.clone();
            tokio::spawn(async move {
                storage
                    .merge_progress(&user, lesson, &ProgressReport::new(i * 3, i == 2))
                    .await
            })
        });
        for outcome in futures::future::join_all(tasks).await {
            outcome.unwrap().unwrap();
        }

        let stored = storage.get_progress(&user, lesson).await.unwrap().unwrap();
        assert_eq!(stored.watched_time, 30);
        assert!(stored.completed);
    }

    #[tokio::test]
    async fn test_course_lessons_in_hierarchy_order() {
        let (storage, course, lessons) = seeded(3).await;
        let ordered = storage.course_lessons(course.id).await.unwrap();
        let ids: Vec<_> = ordered.iter().map(|l| l.id).collect();
        let expected: Vec<_> = lessons.iter().map(|l| l.id).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_list_progress_skips_missing() {
        let (storage, _, lessons) = seeded(3).await;
        let user = UserId::new("42");
        storage.upsert_progress(&user, lessons[1].id, 12, false).await.unwrap();

        let ids: Vec<_> = lessons.iter().map(|l| l.id).collect();
        let records = storage.list_progress(&user, &ids).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].lesson_id, lessons[1].id);
    }

    #[tokio::test]
    async fn test_delete_course_cascades() {
        let (storage, course, lessons) = seeded(2).await;
        let user = UserId::new("42");
        storage.enroll(&user, course.id).await.unwrap();
        storage.upsert_progress(&user, lessons[0].id, 12, true).await.unwrap();

        storage.delete_course(course.id).await.unwrap();

        assert!(!storage.is_enrolled(&user, course.id).await.unwrap());
        assert!(storage.get_progress(&user, lessons[0].id).await.unwrap().is_none());
        assert!(storage.load_lesson(lessons[1].id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_progress_for_unknown_lesson_is_not_found() {
        let (storage, _, _) = seeded(0).await;
        let user = UserId::new("42");

        let err = storage
            .merge_progress(&user, LessonId::new(), &ProgressReport::new(5, false))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));

        let err = storage
            .upsert_progress(&user, LessonId::new(), 5, false)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_progress_after_lesson_deleted_is_not_found() {
        let (storage, course, lessons) = seeded(1).await;
        let user = UserId::new("42");
        storage.delete_course(course.id).await.unwrap();

        let err = storage
            .merge_progress(&user, lessons[0].id, &ProgressReport::new(5, true))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
        assert!(storage.get_progress(&user, lessons[0].id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_level() {
        let (storage, course, _) = seeded(0).await;
        let levels = storage.list_levels(course.id).await.unwrap();
        let loaded = storage.load_level(levels[0].id).await.unwrap();
        assert_eq!(loaded.as_ref(), levels.first());
        assert!(storage.load_level(LevelId::new()).await.unwrap().is_none());
    }
}
