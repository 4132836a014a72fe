// src/models/student.rs

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder, prelude::FromRow};

use crate::error::AppError;

/// Represents the 'students' table.
/// Section and batch are treated as a point-in-time snapshot; the analytics
/// never mutate them.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Student {
    pub student_id: i64,

    /// University registration number.
    pub uni_reg_id: String,

    pub name: String,
    pub section: String,
    pub batch_id: i64,
    pub university_id: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Fetches one student by id.
pub async fn fetch_student(pool: &PgPool, student_id: i64) -> Result<Option<Student>, AppError> {
    let student = sqlx::query_as::<_, Student>(
        "SELECT student_id, uni_reg_id, name, section, batch_id, university_id, created_at \
         FROM students WHERE student_id = $1",
    )
    .bind(student_id)
    .fetch_optional(pool)
    .await?;
    Ok(student)
}

/// Lists students of one university, optionally narrowed by section and/or
/// batch.
pub async fn list_students(
    pool: &PgPool,
    university_id: i64,
    section: Option<&str>,
    batch_id: Option<i64>,
) -> Result<Vec<Student>, AppError> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT student_id, uni_reg_id, name, section, batch_id, university_id, created_at \
         FROM students WHERE university_id = ",
    );
    qb.push_bind(university_id);

    if let Some(section) = section {
        qb.push(" AND section = ");
        qb.push_bind(section);
    }
    if let Some(batch_id) = batch_id {
        qb.push(" AND batch_id = ");
        qb.push_bind(batch_id);
    }
    qb.push(" ORDER BY name");

    let students = qb.build_query_as().fetch_all(pool).await?;
    Ok(students)
}

/// Lists the students following a course: members of any batch whose
/// course_ids array contains the course. The array `contains` filter is the
/// batch→course membership lookup.
pub async fn list_students_for_course(
    pool: &PgPool,
    university_id: i64,
    course_id: &str,
) -> Result<Vec<Student>, AppError> {
    let students = sqlx::query_as::<_, Student>(
        "SELECT s.student_id, s.uni_reg_id, s.name, s.section, s.batch_id, s.university_id, s.created_at \
         FROM students s \
         JOIN batches b ON s.batch_id = b.batch_id \
         WHERE s.university_id = $1 AND $2 = ANY(b.course_ids) \
         ORDER BY s.name",
    )
    .bind(university_id)
    .bind(course_id)
    .fetch_all(pool)
    .await?;
    Ok(students)
}

/// Narrows a caller-supplied id list to students of one university, in one
/// query. Handlers use this for tenant scoping before any analytics run.
pub async fn load_scoped_students(
    pool: &PgPool,
    university_id: i64,
    student_ids: &[i64],
) -> Result<Vec<Student>, AppError> {
    if student_ids.is_empty() {
        return Ok(Vec::new());
    }
    let students = sqlx::query_as::<_, Student>(
        "SELECT student_id, uni_reg_id, name, section, batch_id, university_id, created_at \
         FROM students WHERE university_id = $1 AND student_id = ANY($2) \
         ORDER BY name",
    )
    .bind(university_id)
    .bind(student_ids.to_vec())
    .fetch_all(pool)
    .await?;
    Ok(students)
}
