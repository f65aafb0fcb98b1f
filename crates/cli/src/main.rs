//! CourseTrack CLI - course enrollment and lesson progress.

mod catalog;

use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use coursetrack_core::{CourseId, LessonId, ModuleId, UserId};
use coursetrack_progress::{CourseProgressService, TrackerConfig};
use coursetrack_storage::{open_storage, StorageBackend, StorageConfig};

#[derive(Parser)]
#[command(name = "coursetrack")]
#[command(about = "Course enrollment and lesson progress tracking", long_about = None)]
struct Cli {
    /// Storage directory (json) or database file (sqlite)
    #[arg(long, global = true, default_value = ".coursetrack")]
    storage: PathBuf,

    /// Storage backend: json or sqlite
    #[arg(long, global = true, default_value = "json")]
    backend: String,

    /// Acting user; commands that need an identity fail without it
    #[arg(long, global = true)]
    user: Option<String>,

    /// Share of a lesson that must be watched before it can be marked completed
    #[arg(long, global = true, default_value = "0.9", value_parser = parse_watch_ratio)]
    watch_ratio: f32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a catalog file
    Import {
        /// Path to the catalog JSON
        file: PathBuf,
    },
    /// List the highest rated courses
    Courses {
        /// Number of courses to show
        #[arg(long, default_value = "6")]
        limit: usize,
    },
    /// Enroll in a course
    Enroll {
        /// Course ID
        course: String,
    },
    /// Report watch progress on a lesson
    Report {
        /// Lesson ID
        lesson: String,
        /// Seconds watched
        #[arg(long, default_value = "0")]
        watched: u32,
        /// Mark the lesson completed
        #[arg(long)]
        completed: bool,
    },
    /// Show progress on a lesson
    Lesson {
        /// Lesson ID
        lesson: String,
    },
    /// Show progress on every lesson of a course
    Lessons {
        /// Course ID
        course: String,
    },
    /// Show course completion and per-module progress
    Progress {
        /// Course ID
        course: String,
    },
    /// Show progress on one module
    Module {
        /// Module ID
        module: String,
    },
    /// Show how much of a lesson was watched
    Watch {
        /// Lesson ID
        lesson: String,
    },
    /// List courses the user is enrolled in
    MyCourses,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the JSON results
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = StorageConfig {
        backend: cli.backend.parse::<StorageBackend>()?,
        path: cli.storage,
    };
    let storage = open_storage(&config).await?;
    let service = CourseProgressService::with_config(
        storage.clone(),
        TrackerConfig {
            watch_completion_ratio: cli.watch_ratio,
        },
    );
    let user = cli.user.map(UserId::new);
    let user = user.as_ref();
    debug!(user = ?user, "Resolved caller");

    match cli.command {
        Commands::Import { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let parsed: catalog::CatalogFile =
                serde_json::from_str(&raw).context("Invalid catalog file")?;
            let ids = catalog::import(storage.as_ref(), parsed).await?;
            print_json(&ids)?;
        }
        Commands::Courses { limit } => {
            print_json(&service.top_courses(limit).await?)?;
        }
        Commands::Enroll { course } => {
            let outcome = service.enroll(user, parse_course(&course)?).await?;
            print_json(&outcome)?;
        }
        Commands::Report { lesson, watched, completed } => {
            let state = service
                .update_lesson_progress(user, parse_lesson(&lesson)?, watched, completed)
                .await?;
            print_json(&state)?;
        }
        Commands::Lesson { lesson } => {
            print_json(&service.lesson_progress(user, parse_lesson(&lesson)?).await?)?;
        }
        Commands::Lessons { course } => {
            let entries = service
                .lessons_progress_for_course(user, parse_course(&course)?)
                .await?;
            print_json(&entries)?;
        }
        Commands::Progress { course } => {
            let course = parse_course(&course)?;
            let completion = service.course_progress(user, course).await?;
            let modules = service.course_outline_progress(user, course).await?;
            print_json(&serde_json::json!({
                "completion": completion,
                "modules": modules,
            }))?;
        }
        Commands::Module { module } => {
            let module: ModuleId = module
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid module ID"))?;
            print_json(&service.module_progress(user, module).await?)?;
        }
        Commands::Watch { lesson } => {
            print_json(&service.lesson_watch_status(user, parse_lesson(&lesson)?).await?)?;
        }
        Commands::MyCourses => {
            print_json(&service.enrolled_courses(user).await?)?;
        }
    }

    Ok(())
}

fn parse_watch_ratio(s: &str) -> std::result::Result<f32, String> {
    let ratio: f32 = s.parse().map_err(|_| format!("`{}` is not a number", s))?;
    if !ratio.is_finite() || !(0.0..=1.0).contains(&ratio) {
        return Err(format!("`{}` must be between 0 and 1", s));
    }
    Ok(ratio)
}

fn parse_course(s: &str) -> Result<CourseId> {
    s.parse().map_err(|_| anyhow::anyhow!("Invalid course ID"))
}

fn parse_lesson(s: &str) -> Result<LessonId> {
    s.parse().map_err(|_| anyhow::anyhow!("Invalid lesson ID"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
