// src/analytics/trends.rs
//
// Multi-attempt trends, pass/fail tallies and behavioral-signal averages
// over a cohort's result rows.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analytics::reconcile::ResultIndex;
use crate::config::COHORT_PASS_PCT;
use crate::models::result::{Modality, ResultRecord};

/// Mean percentage score for each attempt number present in the rows.
/// Returns two parallel sequences: attempt numbers ascending, and the
/// corresponding averages. A row's percentage comes from the nested mcq
/// score pair when recorded, else the flat marks pair (see
/// `ResultRecord::percentage`).
pub fn avg_pct_by_attempt(rows: &[ResultRecord]) -> (Vec<i32>, Vec<f64>) {
    let mut by_attempt: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for row in rows {
        by_attempt
            .entry(row.attempt_count)
            .or_default()
            .push(row.percentage());
    }

    let mut attempts = Vec::with_capacity(by_attempt.len());
    let mut averages = Vec::with_capacity(by_attempt.len());
    for (attempt, percentages) in by_attempt {
        attempts.push(attempt);
        averages.push(percentages.iter().sum::<f64>() / percentages.len() as f64);
    }
    (attempts, averages)
}

#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct PassFailTally {
    pub passed: u32,
    pub failed: u32,
}

#[derive(Debug, Default, Serialize)]
pub struct TallyByModality {
    pub mcq: PassFailTally,
    pub coding: PassFailTally,
}

/// Partitions each student's latest attempt into pass/fail at the cohort
/// threshold (50%), separately per modality. Distinct from the 40% verdict
/// used in the single-attempt deep dive.
pub fn pass_fail_tally(index: &ResultIndex) -> TallyByModality {
    let mut tally = TallyByModality::default();
    for row in index.latest_rows() {
        let bucket = match row.modality {
            Modality::Mcq => &mut tally.mcq,
            Modality::Coding => &mut tally.coding,
        };
        if row.percentage() >= COHORT_PASS_PCT {
            bucket.passed += 1;
        } else {
            bucket.failed += 1;
        }
    }
    tally
}

#[derive(Debug, Serialize)]
pub struct BehaviorSummary {
    pub avg_face_warnings: f64,
    pub avg_focus_lost: f64,
    pub avg_disconnects: f64,
    pub avg_time_taken_seconds: f64,
    pub suggestions: Vec<String>,
}

/// Cohort behavioral averages plus suggestions from fixed threshold rules:
/// face warnings > 10, focus losses > 3, disconnects > 0.5, mean time > 900s.
pub fn behavior_summary(rows: &[ResultRecord]) -> BehaviorSummary {
    let count = rows.len() as f64;
    let mean = |extract: fn(&ResultRecord) -> i64| -> f64 {
        if rows.is_empty() {
            0.0
        } else {
            rows.iter().map(|r| extract(r) as f64).sum::<f64>() / count
        }
    };

    let avg_face_warnings = mean(|r| r.analytics().face_warning_count.unwrap_or(0));
    let avg_focus_lost = mean(|r| r.analytics().focus_lost_count.unwrap_or(0));
    let avg_disconnects = mean(|r| r.analytics().network_disconnect_count.unwrap_or(0));
    let avg_time_taken_seconds = mean(|r| r.analytics().time_taken_seconds.unwrap_or(0));

    let mut suggestions = Vec::new();
    if avg_face_warnings > 10.0 {
        suggestions.push(
            "Students get frequent face-visibility warnings; advise better lighting and camera placement.".to_string(),
        );
    }
    if avg_focus_lost > 3.0 {
        suggestions.push("Frequent focus changes detected across the cohort.".to_string());
    }
    if avg_disconnects > 0.5 {
        suggestions.push("Connectivity issues detected; check network stability.".to_string());
    }
    if avg_time_taken_seconds > 900.0 {
        suggestions.push("Students are taking too long per attempt.".to_string());
    }

    BehaviorSummary {
        avg_face_warnings,
        avg_focus_lost,
        avg_disconnects,
        avg_time_taken_seconds,
        suggestions,
    }
}
