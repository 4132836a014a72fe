// src/handlers/attempts.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::{
    analytics::deep_dive::{AttemptRef, assemble},
    content::store::ContentStore,
    error::AppError,
    models::{result::Modality, student::fetch_student},
    utils::jwt::{Claims, require_university_scope},
};

#[derive(Debug, Deserialize)]
pub struct DeepDiveParams {
    pub student_id: i64,
    pub course_id: String,
    pub unit_id: String,
    pub sub_unit_id: String,
    pub attempt: i32,
    pub modality: String,
}

/// The deep-dive report of one attempt: overview, completion, proctoring,
/// enriched submissions, suggestions and debug configs.
pub async fn deep_dive(
    State(pool): State<PgPool>,
    State(content): State<Arc<dyn ContentStore>>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<DeepDiveParams>,
) -> Result<impl IntoResponse, AppError> {
    let modality = Modality::parse(&params.modality).ok_or(AppError::BadRequest(
        "modality must be 'mcq' or 'coding'".to_string(),
    ))?;

    let student = fetch_student(&pool, params.student_id)
        .await?
        .ok_or(AppError::NotFound("Student not found".to_string()))?;
    require_university_scope(&claims, student.university_id)?;

    let attempt = AttemptRef {
        student_id: params.student_id,
        course_id: params.course_id,
        unit_id: params.unit_id,
        sub_unit_id: params.sub_unit_id,
        attempt: params.attempt,
        modality,
    };

    let report = assemble(&pool, content.as_ref(), &attempt).await?;

    Ok(Json(json!({ "success": true, "data": report })))
}
