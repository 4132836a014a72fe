// src/analytics/deep_dive.rs
//
// Assembles the fully enriched report of one exam/practice attempt:
// result row + raw submissions + question content + proctoring telemetry.
// The database and content-store reads happen up front and concurrently;
// everything after is pure reconciliation over the fetched data.

use chrono::{DateTime, Duration, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;

use crate::config::{
    DEEP_DIVE_PASS_PCT, DEFAULT_ATTEMPT_DURATION_SECS, HIDDEN_VALUE, MARKS_PER_HIDDEN_CASE,
};
use crate::content::store::{ContentStore, path};
use crate::content::tree::{
    self, CodingQuestion, McqQuestion, SubUnitNode, display_title,
};
use crate::error::AppError;
use crate::models::course;
use crate::models::result::{
    Modality, ResultAnalytics, SubmissionRecord, fetch_attempt_result, load_attempt_submissions,
};

/// Identifies one attempt.
#[derive(Debug, Clone)]
pub struct AttemptRef {
    pub student_id: i64,
    pub course_id: String,
    pub unit_id: String,
    pub sub_unit_id: String,
    pub attempt: i32,
    pub modality: Modality,
}

#[derive(Debug, Serialize)]
pub struct AttemptDeepDive {
    pub overview: AttemptOverview,
    pub completion: CompletionStats,
    pub proctoring: ProctoringMetrics,
    pub timing: AttemptTiming,
    pub submissions: Vec<EnrichedSubmission>,
    pub suggestions: Vec<String>,
    pub debug: DebugConfigs,
}

#[derive(Debug, Serialize)]
pub struct AttemptOverview {
    pub student_id: i64,
    pub course_id: String,
    pub course_name: Option<String>,
    pub unit_id: String,
    pub sub_unit_id: String,
    pub sub_unit_title: String,
    pub attempt: i32,
    pub modality: Modality,
    pub marks_obtained: f64,
    pub total_marks: f64,
    pub percent: u32,
    pub passed: bool,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct CompletionStats {
    pub questions_available: u32,
    pub questions_to_show: u32,
    pub questions_attempted: u32,
    pub completion_percentage: u32,
}

#[derive(Debug, Serialize)]
pub struct ProctoringMetrics {
    pub face_warning_count: i64,
    pub focus_lost_count: i64,
    pub network_disconnect_count: i64,
    pub blocked_seconds: i64,
    pub tab_switch_count: i64,
    pub network_health: String,
}

#[derive(Debug, Serialize)]
pub struct AttemptTiming {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct DebugConfigs {
    pub start_config: Option<Value>,
    pub end_config: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct EnrichedSubmission {
    pub question_id: String,
    pub status: Option<String>,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcq: Option<McqDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coding: Option<CodingDetail>,
}

#[derive(Debug, Serialize)]
pub struct McqDetail {
    pub question: String,
    pub selected_index: Option<usize>,
    pub selected_text: Option<String>,
    pub is_correct: bool,
}

#[derive(Debug, Serialize)]
pub struct CodingDetail {
    pub title: String,
    pub sample_test_cases: Vec<TestCaseView>,
    pub hidden_test_cases: Vec<TestCaseView>,
    pub hidden_test_case_count: usize,
    pub total_question_marks: f64,
    pub solution_code: Option<String>,
    pub submitted_code: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct TestCaseView {
    pub input: String,
    pub expected_output: String,
}

/// Derives proctoring counters from the analytics blob, defaulting each to
/// zero. Network health is "Stable" iff there were no disconnects at all.
pub fn proctoring_metrics(analytics: &ResultAnalytics) -> ProctoringMetrics {
    let disconnects = analytics.network_disconnect_count.unwrap_or(0);
    ProctoringMetrics {
        face_warning_count: analytics.face_warning_count.unwrap_or(0),
        focus_lost_count: analytics.focus_lost_count.unwrap_or(0),
        network_disconnect_count: disconnects,
        blocked_seconds: analytics.blocked_seconds.unwrap_or(0),
        tab_switch_count: analytics.tab_switch_count.unwrap_or(0),
        network_health: if disconnects == 0 {
            "Stable".to_string()
        } else {
            "Unstable".to_string()
        },
    }
}

/// Rounded percentage of marks obtained, 0 when no marks were possible.
pub fn attempt_percent(marks_obtained: f64, total_marks: f64) -> u32 {
    if total_marks <= 0.0 {
        return 0;
    }
    (100.0 * marks_obtained / total_marks).round() as u32
}

/// Attempt completion against the questions-to-show cap, clamped to 100.
/// Re-submissions can push the attempted count past the cap.
pub fn completion_percentage(attempted: usize, cap: u32) -> u32 {
    if cap == 0 {
        return 0;
    }
    let pct = (100.0 * attempted as f64 / cap as f64).round() as u32;
    pct.min(100)
}

/// Wall-clock reconstruction: explicit duration from the blob if recorded,
/// otherwise the fixed fallback; start = submission time minus duration.
pub fn reconstruct_timing(
    analytics: &ResultAnalytics,
    submitted_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> AttemptTiming {
    let duration_seconds = analytics
        .time_taken_seconds
        .unwrap_or(DEFAULT_ATTEMPT_DURATION_SECS);
    let end_time = submitted_at.unwrap_or(now);
    AttemptTiming {
        start_time: end_time - Duration::seconds(duration_seconds),
        end_time,
        duration_seconds,
    }
}

/// Single-attempt improvement suggestions. Thresholds are fixed product
/// rules and intentionally stricter than the cohort-level ones.
pub fn attempt_suggestions(metrics: &ProctoringMetrics, passed: bool) -> Vec<String> {
    let mut suggestions = Vec::new();
    if metrics.face_warning_count > 5 {
        suggestions
            .push("Improve lighting and keep your face visible to the camera.".to_string());
    }
    if metrics.focus_lost_count > 3 {
        suggestions.push("Avoid switching tabs during the exam.".to_string());
    }
    if !passed {
        suggestions.push("Revise the topic and attempt again.".to_string());
    }
    suggestions
}

/// Splits a coding question's test cases into fully visible samples and
/// redacted hidden cases. Hidden input/expected output must NEVER leak; they
/// are replaced by the sentinel placeholder.
pub fn split_test_cases(question: &CodingQuestion) -> (Vec<TestCaseView>, Vec<TestCaseView>) {
    let mut samples = Vec::new();
    let mut hidden = Vec::new();
    for case in &question.test_cases {
        if case.is_sample {
            samples.push(TestCaseView {
                input: case.input.clone().unwrap_or_default(),
                expected_output: case.expected_output.clone().unwrap_or_default(),
            });
        } else {
            hidden.push(TestCaseView {
                input: HIDDEN_VALUE.to_string(),
                expected_output: HIDDEN_VALUE.to_string(),
            });
        }
    }
    (samples, hidden)
}

/// Enriches an mcq submission: resolve the selected option by index and
/// report its text and correctness.
pub fn enrich_mcq(submission: &SubmissionRecord, question: &McqQuestion) -> McqDetail {
    let selected_index = submission.selected_option_index();
    let selected = selected_index.and_then(|i| question.options.get(i));
    McqDetail {
        question: question.question.clone().unwrap_or_default(),
        selected_index,
        selected_text: selected.and_then(|o| o.text.clone()),
        is_correct: selected.map(|o| o.is_correct).unwrap_or(false),
    }
}

/// Enriches a coding submission with redacted test cases, the per-question
/// mark total (10 per hidden case), the stored solution and the student's
/// last submitted code.
pub fn enrich_coding(submission: &SubmissionRecord, question: &CodingQuestion) -> CodingDetail {
    let (sample_test_cases, hidden_test_cases) = split_test_cases(question);
    let hidden_test_case_count = hidden_test_cases.len();
    CodingDetail {
        title: display_title(question.title.as_deref(), question.name.as_deref()),
        sample_test_cases,
        hidden_test_cases,
        hidden_test_case_count,
        total_question_marks: hidden_test_case_count as f64 * MARKS_PER_HIDDEN_CASE,
        solution_code: question.solution.clone(),
        submitted_code: submission.submitted_code(),
    }
}

async fn enrich_submission(
    store: &dyn ContentStore,
    attempt: &AttemptRef,
    submission: &SubmissionRecord,
) -> Result<EnrichedSubmission, AppError> {
    let doc = store
        .fetch(&path::question(
            &attempt.course_id,
            &attempt.unit_id,
            &attempt.sub_unit_id,
            attempt.modality.as_str(),
            &submission.question_id,
        ))
        .await?;

    let mut enriched = EnrichedSubmission {
        question_id: submission.question_id.clone(),
        status: submission.status.clone(),
        score: submission.score,
        mcq: None,
        coding: None,
    };

    // A question deleted between submission and report is left unenriched.
    let Some(doc) = doc else {
        return Ok(enriched);
    };

    match attempt.modality {
        Modality::Mcq => {
            if let Ok(question) = serde_json::from_value::<McqQuestion>(doc) {
                enriched.mcq = Some(enrich_mcq(submission, &question));
            }
        }
        Modality::Coding => {
            if let Ok(question) = serde_json::from_value::<CodingQuestion>(doc) {
                enriched.coding = Some(enrich_coding(submission, &question));
            }
        }
    }
    Ok(enriched)
}

/// Keeps only submissions whose question id the content tree still knows.
/// Without metadata there is no valid set; the raw rows pass through so the
/// report never hides that submissions exist.
fn filter_submissions<'a>(
    submissions: &'a [SubmissionRecord],
    sub_unit: Option<&SubUnitNode>,
    modality: Modality,
) -> Vec<&'a SubmissionRecord> {
    match sub_unit {
        Some(sub_unit) => {
            let valid = sub_unit.question_ids(modality.as_str());
            submissions
                .iter()
                .filter(|s| valid.contains(&s.question_id.as_str()))
                .collect()
        }
        None => submissions.iter().collect(),
    }
}

/// Builds the deep-dive report for one attempt.
///
/// Fails with `NotFound` when neither a result row nor submissions exist.
/// Missing content-tree metadata degrades to zero counts and unenriched
/// submissions instead of failing.
pub async fn assemble(
    pool: &PgPool,
    store: &dyn ContentStore,
    attempt: &AttemptRef,
) -> Result<AttemptDeepDive, AppError> {
    let (result, submissions, course_row, sub_unit) = tokio::try_join!(
        fetch_attempt_result(
            pool,
            attempt.student_id,
            &attempt.course_id,
            &attempt.unit_id,
            &attempt.sub_unit_id,
            attempt.attempt,
            attempt.modality,
        ),
        load_attempt_submissions(
            pool,
            attempt.student_id,
            &attempt.course_id,
            &attempt.unit_id,
            &attempt.sub_unit_id,
            attempt.attempt,
            attempt.modality,
        ),
        course::fetch_course(pool, &attempt.course_id),
        tree::load_sub_unit(store, &attempt.course_id, &attempt.unit_id, &attempt.sub_unit_id),
    )?;

    if result.is_none() && submissions.is_empty() {
        return Err(AppError::NotFound("Attempt not found".to_string()));
    }

    let filtered = filter_submissions(&submissions, sub_unit.as_ref(), attempt.modality);

    let enriched = if sub_unit.is_some() {
        try_join_all(
            filtered
                .iter()
                .map(|s| enrich_submission(store, attempt, s)),
        )
        .await?
    } else {
        filtered
            .iter()
            .map(|s| EnrichedSubmission {
                question_id: s.question_id.clone(),
                status: s.status.clone(),
                score: s.score,
                mcq: None,
                coding: None,
            })
            .collect()
    };

    let modality_str = attempt.modality.as_str();
    let (questions_available, questions_to_show) = sub_unit
        .as_ref()
        .map(|su| (su.total_questions(modality_str), su.questions_to_show(modality_str)))
        .unwrap_or((0, 0));

    let completion = CompletionStats {
        questions_available,
        questions_to_show,
        questions_attempted: filtered.len() as u32,
        completion_percentage: completion_percentage(filtered.len(), questions_to_show),
    };

    let analytics = result
        .as_ref()
        .map(|row| row.analytics())
        .unwrap_or_default();
    let proctoring = proctoring_metrics(&analytics);

    let (marks_obtained, total_marks) = result
        .as_ref()
        .map(|row| (row.marks_obtained, row.total_marks))
        .unwrap_or((0.0, 0.0));
    let percent = attempt_percent(marks_obtained, total_marks);
    let passed = percent as f64 >= DEEP_DIVE_PASS_PCT;

    let timing = reconstruct_timing(
        &analytics,
        result.as_ref().and_then(|row| row.submitted_at),
        Utc::now(),
    );

    let suggestions = attempt_suggestions(&proctoring, passed);

    let (start_config, end_config) = result
        .as_ref()
        .map(|row| {
            (
                row.start_config.as_ref().map(|j| j.0.clone()),
                row.end_config.as_ref().map(|j| j.0.clone()),
            )
        })
        .unwrap_or((None, None));

    Ok(AttemptDeepDive {
        overview: AttemptOverview {
            student_id: attempt.student_id,
            course_id: attempt.course_id.clone(),
            course_name: course_row.map(|c| c.name),
            unit_id: attempt.unit_id.clone(),
            sub_unit_id: attempt.sub_unit_id.clone(),
            sub_unit_title: sub_unit
                .as_ref()
                .map(|su| display_title(su.title.as_deref(), su.name.as_deref()))
                .unwrap_or_else(|| "Untitled".to_string()),
            attempt: attempt.attempt,
            modality: attempt.modality,
            marks_obtained,
            total_marks,
            percent,
            passed,
            status: if passed { "Passed" } else { "Failed" }.to_string(),
        },
        completion,
        proctoring,
        timing,
        submissions: enriched,
        suggestions,
        debug: DebugConfigs {
            start_config,
            end_config,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlx::types::Json;

    fn coding_question(cases: serde_json::Value) -> CodingQuestion {
        serde_json::from_value(json!({
            "title": "Two Sum",
            "solution": "fn solve() {}",
            "testCases": cases
        }))
        .unwrap()
    }

    fn submission(question_id: &str, answer: serde_json::Value) -> SubmissionRecord {
        SubmissionRecord {
            id: 0,
            student_id: 1,
            course_id: "c1".into(),
            unit_id: "u1".into(),
            sub_unit_id: "s1".into(),
            modality: Modality::Coding,
            attempt_count: 1,
            question_id: question_id.into(),
            answer: Some(Json(answer)),
            status: Some("accepted".into()),
            score: 10.0,
            submitted_at: None,
        }
    }

    #[test]
    fn hidden_test_cases_are_redacted() {
        let question = coding_question(json!([
            { "input": "1 2", "expectedOutput": "3", "isSample": true },
            { "input": "secret-in", "expectedOutput": "secret-out", "isSample": false },
            { "input": "secret-in-2", "expectedOutput": "secret-out-2", "isSample": false }
        ]));

        let (samples, hidden) = split_test_cases(&question);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].input, "1 2");
        assert_eq!(samples[0].expected_output, "3");

        assert_eq!(hidden.len(), 2);
        for case in &hidden {
            assert_eq!(case.input, HIDDEN_VALUE);
            assert_eq!(case.expected_output, HIDDEN_VALUE);
        }
    }

    #[test]
    fn coding_marks_scale_with_hidden_case_count() {
        let question = coding_question(json!([
            { "isSample": true },
            { "isSample": false },
            { "isSample": false },
            { "isSample": false }
        ]));
        let detail = enrich_coding(&submission("q1", json!("code")), &question);
        assert_eq!(detail.hidden_test_case_count, 3);
        assert_eq!(detail.total_question_marks, 30.0);
        assert_eq!(detail.solution_code, Some("fn solve() {}".into()));
        assert_eq!(detail.submitted_code, Some("code".into()));
    }

    #[test]
    fn mcq_enrichment_resolves_option_by_index() {
        let question: McqQuestion = serde_json::from_value(json!({
            "question": "Pick one",
            "options": [
                { "text": "wrong", "isCorrect": false },
                { "text": "right", "isCorrect": true }
            ]
        }))
        .unwrap();

        let detail = enrich_mcq(&submission("q1", json!(1)), &question);
        assert_eq!(detail.selected_index, Some(1));
        assert_eq!(detail.selected_text, Some("right".into()));
        assert!(detail.is_correct);

        // Out-of-range index: reported as not correct, nothing resolved.
        let detail = enrich_mcq(&submission("q1", json!(9)), &question);
        assert_eq!(detail.selected_text, None);
        assert!(!detail.is_correct);
    }

    #[test]
    fn completion_is_clamped_to_100() {
        assert_eq!(completion_percentage(3, 10), 30);
        assert_eq!(completion_percentage(12, 10), 100);
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(5, 0), 0);
    }

    #[test]
    fn network_health_stable_only_at_zero_disconnects() {
        let calm = proctoring_metrics(&ResultAnalytics::default());
        assert_eq!(calm.network_health, "Stable");

        let flaky = proctoring_metrics(&ResultAnalytics {
            network_disconnect_count: Some(1),
            ..Default::default()
        });
        assert_eq!(flaky.network_health, "Unstable");
    }

    #[test]
    fn timing_uses_recorded_duration_or_fallback() {
        let now = Utc::now();
        let submitted = now - Duration::seconds(60);

        let recorded = reconstruct_timing(
            &ResultAnalytics {
                time_taken_seconds: Some(600),
                ..Default::default()
            },
            Some(submitted),
            now,
        );
        assert_eq!(recorded.duration_seconds, 600);
        assert_eq!(recorded.end_time, submitted);
        assert_eq!(recorded.start_time, submitted - Duration::seconds(600));

        let fallback = reconstruct_timing(&ResultAnalytics::default(), None, now);
        assert_eq!(fallback.duration_seconds, DEFAULT_ATTEMPT_DURATION_SECS);
        assert_eq!(fallback.end_time, now);
    }

    #[test]
    fn suggestions_follow_attempt_thresholds() {
        let calm = proctoring_metrics(&ResultAnalytics::default());
        assert!(attempt_suggestions(&calm, true).is_empty());

        let noisy = proctoring_metrics(&ResultAnalytics {
            face_warning_count: Some(6),
            focus_lost_count: Some(4),
            ..Default::default()
        });
        let suggestions = attempt_suggestions(&noisy, false);
        assert_eq!(suggestions.len(), 3);

        // Exactly at a threshold: no advisory.
        let borderline = proctoring_metrics(&ResultAnalytics {
            face_warning_count: Some(5),
            focus_lost_count: Some(3),
            ..Default::default()
        });
        assert!(attempt_suggestions(&borderline, true).is_empty());
    }

    #[test]
    fn stale_submissions_filtered_only_with_metadata() {
        let sub_unit: SubUnitNode =
            serde_json::from_value(json!({ "coding": { "q1": {} } })).unwrap();
        let submissions = vec![
            submission("q1", json!("code")),
            submission("deleted-q", json!("code")),
        ];

        let filtered = filter_submissions(&submissions, Some(&sub_unit), Modality::Coding);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].question_id, "q1");

        // No metadata: nothing is dropped.
        let unfiltered = filter_submissions(&submissions, None, Modality::Coding);
        assert_eq!(unfiltered.len(), 2);
    }

    #[test]
    fn deep_dive_pass_threshold_is_40() {
        assert_eq!(attempt_percent(38.0, 100.0), 38);
        assert!((attempt_percent(38.0, 100.0) as f64) < DEEP_DIVE_PASS_PCT);
        assert!((attempt_percent(40.0, 100.0) as f64) >= DEEP_DIVE_PASS_PCT);
    }
}
