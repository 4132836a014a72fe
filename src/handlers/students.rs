// src/handlers/students.rs
//
// CRUD passthrough over the student roster; all reads, all tenant-scoped.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::student::{fetch_student, list_students, list_students_for_course},
    utils::jwt::{Claims, require_university_scope, scoped_university},
};

#[derive(Debug, Deserialize)]
pub struct StudentListParams {
    pub section: Option<String>,
    pub batch_id: Option<i64>,
    /// Only meaningful for super admins; tenant staff are pinned to their own.
    pub university_id: Option<i64>,
}

/// Lists students, optionally narrowed by section and batch.
pub async fn list(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<StudentListParams>,
) -> Result<impl IntoResponse, AppError> {
    let university_id = scoped_university(&claims, params.university_id)?;

    let students = list_students(
        &pool,
        university_id,
        params.section.as_deref(),
        params.batch_id,
    )
    .await?;

    Ok(Json(json!({ "success": true, "data": students })))
}

/// Fetches one student by id.
pub async fn get(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(student_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student = fetch_student(&pool, student_id)
        .await?
        .ok_or(AppError::NotFound("Student not found".to_string()))?;

    require_university_scope(&claims, student.university_id)?;

    Ok(Json(json!({ "success": true, "data": student })))
}

#[derive(Debug, Deserialize)]
pub struct CourseStudentsParams {
    pub university_id: Option<i64>,
}

/// Lists the students following a course, resolved through batch membership.
pub async fn course_students(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<String>,
    Query(params): Query<CourseStudentsParams>,
) -> Result<impl IntoResponse, AppError> {
    let university_id = scoped_university(&claims, params.university_id)?;

    let students = list_students_for_course(&pool, university_id, &course_id).await?;

    Ok(Json(json!({ "success": true, "data": students })))
}
