// src/handlers/trends.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    analytics::{
        reconcile::ResultIndex,
        trends::{avg_pct_by_attempt, behavior_summary, pass_fail_tally},
    },
    error::AppError,
    models::{
        result::load_submitted_results,
        student::{list_students_for_course, load_scoped_students},
    },
    utils::jwt::{Claims, scoped_university},
};

#[derive(Debug, Deserialize, Validate)]
pub struct TrendSummaryRequest {
    #[validate(length(min = 1, message = "course_id is required."))]
    pub course_id: String,
    /// Explicit cohort; defaults to every student of the course.
    pub student_ids: Option<Vec<i64>>,
    /// Optional scope to one unit or sub-unit.
    pub unit_id: Option<String>,
    pub sub_unit_id: Option<String>,
    pub university_id: Option<i64>,
}

/// Cohort summary: attempt-by-attempt average percentages, pass/fail tallies
/// per modality at the cohort threshold, and behavioral-signal averages with
/// their suggestions.
pub async fn summary(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<TrendSummaryRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let university_id = scoped_university(&claims, req.university_id)?;

    let students = match &req.student_ids {
        Some(ids) if ids.is_empty() => {
            return Err(AppError::BadRequest(
                "student_ids must not be empty".to_string(),
            ));
        }
        Some(ids) => load_scoped_students(&pool, university_id, ids).await?,
        None => list_students_for_course(&pool, university_id, &req.course_id).await?,
    };
    let ids: Vec<i64> = students.iter().map(|s| s.student_id).collect();

    let rows = load_submitted_results(
        &pool,
        &req.course_id,
        &ids,
        req.unit_id.as_deref(),
        req.sub_unit_id.as_deref(),
    )
    .await?;

    let (attempts, avg_pct) = avg_pct_by_attempt(&rows);
    let behavior = behavior_summary(&rows);
    let tally = pass_fail_tally(&ResultIndex::build(rows));

    Ok(Json(json!({
        "success": true,
        "summary": {
            "attempts": attempts,
            "avg_pct": avg_pct,
            "pass_fail": tally,
            "behavior": behavior,
            "students": students.len(),
        }
    })))
}
