// src/models/course.rs

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, prelude::FromRow};

use crate::error::AppError;

/// Represents the 'courses' table. Course content itself lives in the
/// content store; this row only carries the display name and tenant.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub course_id: String,
    pub name: String,
    pub university_id: i64,
}

/// Represents the 'batches' table. `course_ids` is array-valued: one batch
/// follows many courses.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: i64,
    pub name: String,
    pub university_id: i64,
    pub course_ids: Vec<String>,
}

pub async fn fetch_course(pool: &PgPool, course_id: &str) -> Result<Option<Course>, AppError> {
    let course = sqlx::query_as::<_, Course>(
        "SELECT course_id, name, university_id FROM courses WHERE course_id = $1",
    )
    .bind(course_id)
    .fetch_optional(pool)
    .await?;
    Ok(course)
}
