// src/analytics/reconcile.rs
//
// Indexes bulk-loaded result rows by (student, sub-unit, modality) so the
// calculators never go back to the database per student.

use std::collections::HashMap;

use crate::models::result::{Modality, ResultRecord};

/// Composite lookup key of the reconciliation index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultKey {
    pub student_id: i64,
    pub sub_unit_id: String,
    pub modality: Modality,
}

impl ResultKey {
    pub fn of(row: &ResultRecord) -> Self {
        Self {
            student_id: row.student_id,
            sub_unit_id: row.sub_unit_id.clone(),
            modality: row.modality,
        }
    }
}

/// All submitted attempts per key, sorted ascending by attempt number.
/// Built once from a single bulk query's rows.
#[derive(Debug, Default)]
pub struct ResultIndex {
    rows: HashMap<ResultKey, Vec<ResultRecord>>,
}

impl ResultIndex {
    pub fn build(rows: Vec<ResultRecord>) -> Self {
        let mut map: HashMap<ResultKey, Vec<ResultRecord>> = HashMap::new();
        for row in rows {
            map.entry(ResultKey::of(&row)).or_default().push(row);
        }
        for attempts in map.values_mut() {
            attempts.sort_by_key(|r| r.attempt_count);
        }
        Self { rows: map }
    }

    /// Latest attempt for a key: the row with the greatest attempt_count.
    pub fn latest(&self, key: &ResultKey) -> Option<&ResultRecord> {
        self.rows.get(key).and_then(|attempts| attempts.last())
    }

    /// Every attempt for a key, oldest first. The marks-aggregation variant
    /// of exam progress sums over these.
    pub fn all(&self, key: &ResultKey) -> &[ResultRecord] {
        self.rows.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the student submitted this (sub-unit, modality) at least once.
    /// Rows are pre-filtered to submitted ones at load time.
    pub fn has_submitted(&self, key: &ResultKey) -> bool {
        self.rows.contains_key(key)
    }

    /// Latest attempt of every (student, sub-unit, modality) present.
    pub fn latest_rows(&self) -> impl Iterator<Item = &ResultRecord> {
        self.rows.values().filter_map(|attempts| attempts.last())
    }
}
