//! Progress update policy.
//!
//! Incoming watch reports are merged into the stored record, never written
//! over it: watch time only moves forward and completion, once reached,
//! stays. The merge itself runs inside the store so that concurrent reports
//! for the same (user, lesson) pair serialize on that key.

use std::sync::Arc;
use coursetrack_core::{LessonId, LessonProgress, LessonState, ProgressReport, UserId};
use coursetrack_storage::{ProgressStore, Result, Storage};
use tracing::{debug, info};

/// Applies watch reports to lesson progress records.
#[derive(Clone)]
pub struct ProgressPolicy {
    storage: Arc<dyn Storage>,
}

impl ProgressPolicy {
    /// Create a new policy over a store.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Merge a watch report into the (user, lesson) record, creating the
    /// record on first report. Returns the post-merge state.
    pub async fn report(
        &self,
        user: &UserId,
        lesson: LessonId,
        report: ProgressReport,
    ) -> Result<LessonProgress> {
        let outcome = self.storage.merge_progress(user, lesson, &report).await?;

        if outcome.created {
            info!(%user, %lesson, "Started lesson progress");
        } else {
            debug!(
                %user,
                %lesson,
                watched_time = outcome.progress.watched_time,
                completed = outcome.progress.completed,
                "Merged lesson progress"
            );
        }
        Ok(outcome.progress)
    }

    /// Current state of the (user, lesson) record. A missing record reads as
    /// nothing watched and not completed; reading never creates one.
    pub async fn current(&self, user: &UserId, lesson: LessonId) -> Result<LessonState> {
        Ok(self
            .storage
            .get_progress(user, lesson)
            .await?
            .map(|p| p.state())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursetrack_core::{Course, Lesson, Level, Module};
    use coursetrack_storage::{CatalogStore, JsonStorage, ProgressStore};

    async fn setup(dir: &std::path::Path) -> (Arc<dyn Storage>, LessonId) {
        let storage: Arc<dyn Storage> = Arc::new(JsonStorage::new(dir).await.unwrap());
        let course = Course::new("Policy");
        storage.save_course(&course).await.unwrap();
        let level = Level::new(course.id, "L1");
        storage.save_level(&level).await.unwrap();
        let module = Module::new(level.id, "M1");
        storage.save_module(&module).await.unwrap();
        let lesson = Lesson::new(module.id, "Intro", "04:00", "yt1");
        storage.save_lesson(&lesson).await.unwrap();
        (storage, lesson.id)
    }

    #[tokio::test]
    async fn test_rewind_keeps_watch_time() {
        let dir = tempfile::tempdir().unwrap();
        let (storage, lesson) = setup(dir.path()).await;
        let policy = ProgressPolicy::new(storage);
        let user = UserId::new("u1");

        policy.report(&user, lesson, ProgressReport::new(50, false)).await.unwrap();
        let after = policy.report(&user, lesson, ProgressReport::new(30, false)).await.unwrap();

        assert_eq!(after.watched_time, 50);
        assert_eq!(policy.current(&user, lesson).await.unwrap().watched_time, 50);
    }

    #[tokio::test]
    async fn test_completed_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let (storage, lesson) = setup(dir.path()).await;
        let policy = ProgressPolicy::new(storage);
        let user = UserId::new("u1");

        policy.report(&user, lesson, ProgressReport::new(240, true)).await.unwrap();
        let after = policy.report(&user, lesson, ProgressReport::new(0, false)).await.unwrap();

        assert!(after.completed);
        assert_eq!(after.watched_time, 240);
    }

    #[tokio::test]
    async fn test_two_reports_commute() {
        let a = ProgressReport::new(70, false);
        let b = ProgressReport::new(20, true);

        let mut states = Vec::new();
        for order in [[a, b], [b, a]] {
            let dir = tempfile::tempdir().unwrap();
            let (storage, lesson) = setup(dir.path()).await;
            let policy = ProgressPolicy::new(storage);
            let user = UserId::new("u1");
            for report in order {
                policy.report(&user, lesson, report).await.unwrap();
            }
            states.push(policy.current(&user, lesson).await.unwrap());
        }

        assert_eq!(states[0], states[1]);
        assert_eq!(states[0], LessonState { watched_time: 70, completed: true });
    }

    #[tokio::test]
    async fn test_first_report_equals_create_then_update() {
        let dir = tempfile::tempdir().unwrap();
        let (storage, lesson) = setup(dir.path()).await;
        let policy = ProgressPolicy::new(storage.clone());

        let direct = policy
            .report(&UserId::new("direct"), lesson, ProgressReport::new(15, false))
            .await
            .unwrap();

        let staged_user = UserId::new("staged");
        storage.upsert_progress(&staged_user, lesson, 0, false).await.unwrap();
        let staged = policy
            .report(&staged_user, lesson, ProgressReport::new(15, false))
            .await
            .unwrap();

        assert_eq!(direct.state(), staged.state());
    }

    #[tokio::test]
    async fn test_current_does_not_create() {
        let dir = tempfile::tempdir().unwrap();
        let (storage, lesson) = setup(dir.path()).await;
        let policy = ProgressPolicy::new(storage.clone());
        let user = UserId::new("reader");

        assert_eq!(policy.current(&user, lesson).await.unwrap(), LessonState::default());
        assert!(storage.get_progress(&user, lesson).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_reports_lose_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (storage, lesson) = setup(dir.path()).await;
        let policy = ProgressPolicy::new(storage);
        let user = UserId::new("two-tabs");

        let reports = [
            ProgressReport::new(120, false),
            ProgressReport::new(90, true),
            ProgressReport::new(60, false),
        ];
        let results = futures::future::join_all(
            reports.iter().map(|r| policy.report(&user, lesson, *r)),
        )
        .await;
        assert!(results.iter().all(|r| r.is_ok()));

        let state = policy.current(&user, lesson).await.unwrap();
        assert_eq!(state, LessonState { watched_time: 120, completed: true });
    }
}
