// src/handlers/progress.rs
//
// Completion endpoints. Each request: resolve the cohort, load the course
// tree, build the blueprint, bulk-load results into the reconciliation
// index, then run the pure calculators per student.

use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    analytics::{
        blueprint::{SubTypeFilter, build_blueprint, build_unit_blueprint},
        progress::{completion_for_student, exam_progress_for_student, section_average},
        reconcile::ResultIndex,
    },
    content::{store::ContentStore, tree},
    error::AppError,
    models::{
        result::load_submitted_results,
        student::{Student, fetch_student, list_students_for_course, load_scoped_students},
    },
    utils::jwt::{Claims, require_university_scope, scoped_university},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CohortProgressRequest {
    #[validate(length(min = 1, message = "course_id is required."))]
    pub course_id: String,
    /// Explicit cohort. When absent, every student following the course.
    pub student_ids: Option<Vec<i64>>,
    pub university_id: Option<i64>,
}

/// Resolves the cohort of a progress request, tenant-scoped. Callers of the
/// reconciliation index always work from a pre-resolved id list.
async fn resolve_cohort(
    pool: &PgPool,
    claims: &Claims,
    req: &CohortProgressRequest,
) -> Result<Vec<Student>, AppError> {
    let university_id = scoped_university(claims, req.university_id)?;

    match &req.student_ids {
        Some(ids) if ids.is_empty() => Err(AppError::BadRequest(
            "student_ids must not be empty".to_string(),
        )),
        Some(ids) => load_scoped_students(pool, university_id, ids).await,
        None => list_students_for_course(pool, university_id, &req.course_id).await,
    }
}

fn empty_course_response() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "table": [],
        "summary": { "section_average": 0, "students": 0 },
        "message": "Course has no content yet"
    }))
}

/// Per-student practice completion for a course, plus the section average.
pub async fn practice(
    State(pool): State<PgPool>,
    State(content): State<Arc<dyn ContentStore>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CohortProgressRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let students = resolve_cohort(&pool, &claims, &req).await?;

    let Some(course) = tree::load_course(content.as_ref(), &req.course_id).await? else {
        return Ok(empty_course_response());
    };
    let blueprint = build_blueprint(&course, SubTypeFilter::Practice);

    let ids: Vec<i64> = students.iter().map(|s| s.student_id).collect();
    let rows = load_submitted_results(&pool, &req.course_id, &ids, None, None).await?;
    let index = ResultIndex::build(rows);

    let mut table = Vec::with_capacity(students.len());
    let mut percentages = Vec::with_capacity(students.len());
    for student in &students {
        let pct = completion_for_student(&blueprint, &index, student.student_id);
        percentages.push(pct);
        table.push(json!({
            "student_id": student.student_id,
            "uni_reg_id": student.uni_reg_id,
            "name": student.name,
            "section": student.section,
            "completion_percentage": pct,
        }));
    }

    Ok(Json(json!({
        "success": true,
        "table": table,
        "summary": {
            "section_average": section_average(&percentages),
            "students": students.len(),
        }
    })))
}

/// Per-student exam completion with summed marks and captured debug configs.
pub async fn exam(
    State(pool): State<PgPool>,
    State(content): State<Arc<dyn ContentStore>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CohortProgressRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let students = resolve_cohort(&pool, &claims, &req).await?;

    let Some(course) = tree::load_course(content.as_ref(), &req.course_id).await? else {
        return Ok(empty_course_response());
    };
    let blueprint = build_blueprint(&course, SubTypeFilter::Exam);

    let ids: Vec<i64> = students.iter().map(|s| s.student_id).collect();
    let rows = load_submitted_results(&pool, &req.course_id, &ids, None, None).await?;
    let index = ResultIndex::build(rows);

    let mut table = Vec::with_capacity(students.len());
    let mut percentages = Vec::with_capacity(students.len());
    for student in &students {
        let progress = exam_progress_for_student(&blueprint, &index, student.student_id);
        percentages.push(progress.completion_percentage);
        table.push(json!({
            "student_id": student.student_id,
            "uni_reg_id": student.uni_reg_id,
            "name": student.name,
            "section": student.section,
            "exam_completion_percentage": progress.completion_percentage,
            "marks_obtained": progress.marks_obtained,
            "total_marks": progress.total_marks,
            "start_config": progress.start_config,
            "end_config": progress.end_config,
        }));
    }

    Ok(Json(json!({
        "success": true,
        "table": table,
        "summary": {
            "section_average": section_average(&percentages),
            "students": students.len(),
        }
    })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UnitProgressRequest {
    #[validate(length(min = 1, message = "course_id is required."))]
    pub course_id: String,
    #[validate(length(min = 1, message = "unit_id is required."))]
    pub unit_id: String,
    pub student_id: i64,
}

/// Completion of one student over one unit, regardless of subtype.
pub async fn unit(
    State(pool): State<PgPool>,
    State(content): State<Arc<dyn ContentStore>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UnitProgressRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let student = fetch_student(&pool, req.student_id)
        .await?
        .ok_or(AppError::NotFound("Student not found".to_string()))?;
    require_university_scope(&claims, student.university_id)?;

    let Some(unit) = tree::load_unit(content.as_ref(), &req.course_id, &req.unit_id).await? else {
        return Ok(Json(json!({
            "success": true,
            "data": { "student_id": student.student_id, "completion_percentage": 0 },
            "message": "Unit has no content yet"
        })));
    };
    let blueprint = build_unit_blueprint(&unit);

    let rows = load_submitted_results(
        &pool,
        &req.course_id,
        &[student.student_id],
        Some(&req.unit_id),
        None,
    )
    .await?;
    let index = ResultIndex::build(rows);

    let pct = completion_for_student(&blueprint, &index, student.student_id);

    Ok(Json(json!({
        "success": true,
        "data": {
            "student_id": student.student_id,
            "unit_id": req.unit_id,
            "completion_percentage": pct,
        }
    })))
}
