// src/models/result.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder, prelude::FromRow, types::Json};

use crate::error::AppError;

/// Assessment modality. Stored as lowercase text in the `results` and
/// `student_submission` tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Mcq,
    Coding,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Mcq => "mcq",
            Modality::Coding => "coding",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mcq" => Some(Modality::Mcq),
            "coding" => Some(Modality::Coding),
            _ => None,
        }
    }
}

/// Proctoring/timing blob stored alongside each result row.
/// Every field is optional; older sessions recorded only a subset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResultAnalytics {
    pub face_warning_count: Option<i64>,
    pub focus_lost_count: Option<i64>,
    pub network_disconnect_count: Option<i64>,
    pub blocked_seconds: Option<i64>,
    pub tab_switch_count: Option<i64>,
    pub time_taken_seconds: Option<i64>,
    pub mcq: Option<McqScore>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct McqScore {
    pub score: Option<f64>,
    pub total: Option<f64>,
}

/// One row per (student, course, unit, sub-unit, modality, attempt).
/// `submitted_at` is the authoritative completion signal; NULL means the
/// session was never submitted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: i64,
    pub student_id: i64,
    pub course_id: String,
    pub unit_id: String,
    pub sub_unit_id: String,
    pub modality: Modality,
    pub attempt_count: i32,
    pub marks_obtained: f64,
    pub total_marks: f64,
    pub submitted_at: Option<DateTime<Utc>>,
    pub analytics: Option<Json<ResultAnalytics>>,
    pub start_config: Option<Json<Value>>,
    pub end_config: Option<Json<Value>>,
}

impl ResultRecord {
    pub fn analytics(&self) -> ResultAnalytics {
        self.analytics
            .as_ref()
            .map(|j| j.0.clone())
            .unwrap_or_default()
    }

    /// Percentage score for this row. Extraction strategies, in order:
    /// 1. nested mcq score/total pair from the analytics blob,
    /// 2. flat marks_obtained/total_marks.
    /// The fallback order is load-bearing; mcq sessions store their real
    /// score inside the blob while the flat pair may hold partial marks.
    pub fn percentage(&self) -> f64 {
        if let Some(mcq) = self.analytics().mcq {
            if let (Some(score), Some(total)) = (mcq.score, mcq.total) {
                if total > 0.0 {
                    return score / total * 100.0;
                }
            }
        }
        if self.total_marks > 0.0 {
            self.marks_obtained / self.total_marks * 100.0
        } else {
            0.0
        }
    }

    /// Environment snapshot pair captured for this session, when both halves
    /// are present.
    pub fn config_pair(&self) -> Option<(Value, Value)> {
        match (&self.start_config, &self.end_config) {
            (Some(start), Some(end)) => Some((start.0.clone(), end.0.clone())),
            _ => None,
        }
    }
}

/// One row per (student, attempt, question): the last submitted answer for
/// that question. Many of these reconcile against one `ResultRecord`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: i64,
    pub student_id: i64,
    pub course_id: String,
    pub unit_id: String,
    pub sub_unit_id: String,
    pub modality: Modality,
    pub attempt_count: i32,
    pub question_id: String,
    pub answer: Option<Json<Value>>,
    pub status: Option<String>,
    pub score: f64,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl SubmissionRecord {
    /// Selected mcq option index. Strategies, in order: the answer itself as
    /// an integer, an object's `selected` field, a numeric string.
    pub fn selected_option_index(&self) -> Option<usize> {
        let answer = &self.answer.as_ref()?.0;
        if let Some(n) = answer.as_i64() {
            return usize::try_from(n).ok();
        }
        if let Some(n) = answer.get("selected").and_then(Value::as_i64) {
            return usize::try_from(n).ok();
        }
        answer.as_str().and_then(|s| s.parse().ok())
    }

    /// Last submitted source code for a coding question. Strategies, in
    /// order: the answer itself as a string, an object's `code` field.
    pub fn submitted_code(&self) -> Option<String> {
        let answer = &self.answer.as_ref()?.0;
        if let Some(code) = answer.as_str() {
            return Some(code.to_string());
        }
        answer
            .get("code")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

const RESULT_COLUMNS: &str = "id, student_id, course_id, unit_id, sub_unit_id, modality, \
     attempt_count, marks_obtained, total_marks, submitted_at, analytics, start_config, end_config";

/// Bulk-loads every submitted result row for a set of students in one query,
/// optionally scoped to a unit or sub-unit. One round trip regardless of
/// cohort size.
pub async fn load_submitted_results(
    pool: &PgPool,
    course_id: &str,
    student_ids: &[i64],
    unit_id: Option<&str>,
    sub_unit_id: Option<&str>,
) -> Result<Vec<ResultRecord>, AppError> {
    if student_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {RESULT_COLUMNS} FROM results WHERE submitted_at IS NOT NULL AND course_id = "
    ));
    qb.push_bind(course_id);
    qb.push(" AND student_id = ANY(");
    qb.push_bind(student_ids.to_vec());
    qb.push(")");

    if let Some(unit_id) = unit_id {
        qb.push(" AND unit_id = ");
        qb.push_bind(unit_id);
    }
    if let Some(sub_unit_id) = sub_unit_id {
        qb.push(" AND sub_unit_id = ");
        qb.push_bind(sub_unit_id);
    }
    qb.push(" ORDER BY student_id, sub_unit_id, modality, attempt_count");

    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok(rows)
}

/// Fetches the unique result row for one exact attempt key. Zero or one row
/// expected by schema.
pub async fn fetch_attempt_result(
    pool: &PgPool,
    student_id: i64,
    course_id: &str,
    unit_id: &str,
    sub_unit_id: &str,
    attempt: i32,
    modality: Modality,
) -> Result<Option<ResultRecord>, AppError> {
    let row = sqlx::query_as::<_, ResultRecord>(&format!(
        "SELECT {RESULT_COLUMNS} FROM results \
         WHERE student_id = $1 AND course_id = $2 AND unit_id = $3 \
           AND sub_unit_id = $4 AND attempt_count = $5 AND modality = $6"
    ))
    .bind(student_id)
    .bind(course_id)
    .bind(unit_id)
    .bind(sub_unit_id)
    .bind(attempt)
    .bind(modality)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Loads the raw per-question submission rows of one attempt.
pub async fn load_attempt_submissions(
    pool: &PgPool,
    student_id: i64,
    course_id: &str,
    unit_id: &str,
    sub_unit_id: &str,
    attempt: i32,
    modality: Modality,
) -> Result<Vec<SubmissionRecord>, AppError> {
    let rows = sqlx::query_as::<_, SubmissionRecord>(
        "SELECT id, student_id, course_id, unit_id, sub_unit_id, modality, attempt_count, \
                question_id, answer, status, score, submitted_at \
         FROM student_submission \
         WHERE student_id = $1 AND course_id = $2 AND unit_id = $3 \
           AND sub_unit_id = $4 AND attempt_count = $5 AND modality = $6 \
         ORDER BY question_id",
    )
    .bind(student_id)
    .bind(course_id)
    .bind(unit_id)
    .bind(sub_unit_id)
    .bind(attempt)
    .bind(modality)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_row() -> ResultRecord {
        ResultRecord {
            id: 1,
            student_id: 7,
            course_id: "c1".into(),
            unit_id: "u1".into(),
            sub_unit_id: "s1".into(),
            modality: Modality::Mcq,
            attempt_count: 1,
            marks_obtained: 30.0,
            total_marks: 60.0,
            submitted_at: None,
            analytics: None,
            start_config: None,
            end_config: None,
        }
    }

    #[test]
    fn percentage_prefers_nested_mcq_pair() {
        let mut row = base_row();
        row.analytics = Some(Json(ResultAnalytics {
            mcq: Some(McqScore {
                score: Some(8.0),
                total: Some(10.0),
            }),
            ..Default::default()
        }));
        assert_eq!(row.percentage(), 80.0);
    }

    #[test]
    fn percentage_falls_back_to_flat_marks() {
        let row = base_row();
        assert_eq!(row.percentage(), 50.0);

        let mut zero_total = base_row();
        zero_total.total_marks = 0.0;
        assert_eq!(zero_total.percentage(), 0.0);
    }

    #[test]
    fn selected_option_index_strategies() {
        let mut sub = SubmissionRecord {
            id: 1,
            student_id: 7,
            course_id: "c1".into(),
            unit_id: "u1".into(),
            sub_unit_id: "s1".into(),
            modality: Modality::Mcq,
            attempt_count: 1,
            question_id: "q1".into(),
            answer: Some(Json(json!(2))),
            status: None,
            score: 0.0,
            submitted_at: None,
        };
        assert_eq!(sub.selected_option_index(), Some(2));

        sub.answer = Some(Json(json!({ "selected": 1 })));
        assert_eq!(sub.selected_option_index(), Some(1));

        sub.answer = Some(Json(json!("3")));
        assert_eq!(sub.selected_option_index(), Some(3));

        sub.answer = None;
        assert_eq!(sub.selected_option_index(), None);
    }

    #[test]
    fn submitted_code_strategies() {
        let mut sub = SubmissionRecord {
            id: 1,
            student_id: 7,
            course_id: "c1".into(),
            unit_id: "u1".into(),
            sub_unit_id: "s1".into(),
            modality: Modality::Coding,
            attempt_count: 1,
            question_id: "q1".into(),
            answer: Some(Json(json!("print(42)"))),
            status: None,
            score: 0.0,
            submitted_at: None,
        };
        assert_eq!(sub.submitted_code(), Some("print(42)".into()));

        sub.answer = Some(Json(json!({ "code": "fn main() {}" })));
        assert_eq!(sub.submitted_code(), Some("fn main() {}".into()));
    }
}
