// src/analytics/progress.rs
//
// Completion math over a blueprint and a reconciliation index. An item with
// both modalities splits its weight 50/50; a single-modality item is worth
// 100 on its own. Per-student completion is the rounded mean of item
// progress over the blueprint.

use serde::Serialize;
use serde_json::Value;

use crate::analytics::blueprint::BlueprintItem;
use crate::analytics::reconcile::{ResultIndex, ResultKey};
use crate::models::result::Modality;

fn key(student_id: i64, item: &BlueprintItem, modality: Modality) -> ResultKey {
    ResultKey {
        student_id,
        sub_unit_id: item.sub_unit_id.clone(),
        modality,
    }
}

/// Progress of one student on one blueprint item, in points out of 100.
pub fn item_progress(item: &BlueprintItem, index: &ResultIndex, student_id: i64) -> u32 {
    let mcq_done = item.has_mcq && index.has_submitted(&key(student_id, item, Modality::Mcq));
    let coding_done =
        item.has_coding && index.has_submitted(&key(student_id, item, Modality::Coding));

    match (item.has_mcq, item.has_coding) {
        (true, true) => (mcq_done as u32) * 50 + (coding_done as u32) * 50,
        (true, false) => (mcq_done as u32) * 100,
        (false, true) => (coding_done as u32) * 100,
        // Excluded at blueprint build time; kept total for safety.
        (false, false) => 0,
    }
}

/// Rounded mean item progress over the blueprint. An empty blueprint yields
/// 0, never a division by zero.
pub fn completion_for_student(
    blueprint: &[BlueprintItem],
    index: &ResultIndex,
    student_id: i64,
) -> u32 {
    if blueprint.is_empty() {
        return 0;
    }
    let total: u32 = blueprint
        .iter()
        .map(|item| item_progress(item, index, student_id))
        .sum();
    (total as f64 / blueprint.len() as f64).round() as u32
}

/// Section/cohort average: the mean of each student's own completion
/// percentage, NOT pooled points over pooled possible.
pub fn section_average(percentages: &[u32]) -> u32 {
    if percentages.is_empty() {
        return 0;
    }
    let sum: u32 = percentages.iter().sum();
    (sum as f64 / percentages.len() as f64).round() as u32
}

/// Exam-mode progress of one student: completion, marks summed across every
/// attempt of every blueprint item, and the captured debug config pair.
#[derive(Debug, Clone, Serialize)]
pub struct ExamProgress {
    pub completion_percentage: u32,
    pub marks_obtained: f64,
    pub total_marks: f64,
    pub start_config: Option<Value>,
    pub end_config: Option<Value>,
}

pub fn exam_progress_for_student(
    blueprint: &[BlueprintItem],
    index: &ResultIndex,
    student_id: i64,
) -> ExamProgress {
    let completion_percentage = completion_for_student(blueprint, index, student_id);

    let mut marks_obtained = 0.0;
    let mut total_marks = 0.0;
    let mut config = None;

    for item in blueprint {
        // Marks aggregate across ALL attempts, not only the latest one.
        for modality in [Modality::Mcq, Modality::Coding] {
            let required = match modality {
                Modality::Mcq => item.has_mcq,
                Modality::Coding => item.has_coding,
            };
            if !required {
                continue;
            }
            for row in index.all(&key(student_id, item, modality)) {
                marks_obtained += row.marks_obtained;
                total_marks += row.total_marks;
            }
        }

        // Debug config capture: per item the coding modality's latest config
        // pair wins over the mcq one; across items the last pair seen wins.
        let item_config = index
            .latest(&key(student_id, item, Modality::Coding))
            .and_then(|row| row.config_pair())
            .or_else(|| {
                index
                    .latest(&key(student_id, item, Modality::Mcq))
                    .and_then(|row| row.config_pair())
            });
        if item_config.is_some() {
            config = item_config;
        }
    }

    let (start_config, end_config) = match config {
        Some((start, end)) => (Some(start), Some(end)),
        None => (None, None),
    };

    ExamProgress {
        completion_percentage,
        marks_obtained,
        total_marks,
        start_config,
        end_config,
    }
}
