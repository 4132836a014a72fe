// src/analytics/blueprint.rs
//
// Builds the blueprint of gradable items for a course: the denominator of
// all completion math. A sub-unit earns a place iff its subtype matches the
// filter and it actually carries at least one assessable modality.

use crate::content::tree::{CourseTree, UnitNode};

/// Subtype filter. `Any` is the unit-completion mode: every assessable
/// sub-unit counts regardless of declared subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubTypeFilter {
    Practice,
    Exam,
    Any,
}

impl SubTypeFilter {
    fn matches(&self, sub_type: Option<&str>) -> bool {
        match self {
            SubTypeFilter::Practice => sub_type == Some("practice"),
            SubTypeFilter::Exam => sub_type == Some("exam"),
            SubTypeFilter::Any => true,
        }
    }
}

/// One gradable item: a sub-unit and the modalities it requires.
/// Ephemeral, rebuilt per request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlueprintItem {
    pub sub_unit_id: String,
    pub has_mcq: bool,
    pub has_coding: bool,
}

/// Walks a whole course and emits its blueprint, ordered by unit id then
/// sub-unit id.
pub fn build_blueprint(course: &CourseTree, filter: SubTypeFilter) -> Vec<BlueprintItem> {
    course
        .units
        .values()
        .flat_map(|unit| unit_items(unit, filter))
        .collect()
}

/// Blueprint of a single unit, unfiltered by subtype.
pub fn build_unit_blueprint(unit: &UnitNode) -> Vec<BlueprintItem> {
    unit_items(unit, SubTypeFilter::Any).collect()
}

fn unit_items(
    unit: &UnitNode,
    filter: SubTypeFilter,
) -> impl Iterator<Item = BlueprintItem> + '_ {
    unit.sub_units.iter().filter_map(move |(id, sub_unit)| {
        if !filter.matches(sub_unit.sub_type.as_deref()) {
            return None;
        }
        let has_mcq = sub_unit.has_mcq();
        let has_coding = sub_unit.has_coding();
        // A sub-unit with no assessable content cannot contribute to or
        // dilute completion math.
        if !has_mcq && !has_coding {
            return None;
        }
        Some(BlueprintItem {
            sub_unit_id: id.clone(),
            has_mcq,
            has_coding,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::tree::SubUnitNode;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn sub_unit(value: serde_json::Value) -> SubUnitNode {
        serde_json::from_value(value).unwrap()
    }

    fn course(sub_units: Vec<(&str, SubUnitNode)>) -> CourseTree {
        let mut map = BTreeMap::new();
        map.insert(
            "u1".to_string(),
            UnitNode {
                title: Some("Unit 1".into()),
                name: None,
                sub_units: sub_units
                    .into_iter()
                    .map(|(id, su)| (id.to_string(), su))
                    .collect(),
            },
        );
        CourseTree { units: map }
    }

    #[test]
    fn sub_units_without_assessable_content_are_excluded() {
        let tree = course(vec![
            ("video", sub_unit(json!({ "subType": "practice" }))),
            (
                "quiz",
                sub_unit(json!({ "subType": "practice", "mcq": { "q1": {} } })),
            ),
        ]);

        for filter in [SubTypeFilter::Practice, SubTypeFilter::Any] {
            let blueprint = build_blueprint(&tree, filter);
            assert_eq!(blueprint.len(), 1);
            assert_eq!(blueprint[0].sub_unit_id, "quiz");
        }
        assert!(build_blueprint(&tree, SubTypeFilter::Exam).is_empty());
    }

    #[test]
    fn subtype_filter_selects_matching_sub_units() {
        let tree = course(vec![
            (
                "drill",
                sub_unit(json!({ "subType": "practice", "mcq": { "q1": {} } })),
            ),
            (
                "final",
                sub_unit(json!({ "subType": "exam", "coding": { "c1": {} } })),
            ),
        ]);

        let exam = build_blueprint(&tree, SubTypeFilter::Exam);
        assert_eq!(exam.len(), 1);
        assert_eq!(exam[0].sub_unit_id, "final");
        assert!(!exam[0].has_mcq);
        assert!(exam[0].has_coding);

        let any = build_blueprint(&tree, SubTypeFilter::Any);
        assert_eq!(any.len(), 2);
    }

    #[test]
    fn declared_counters_count_as_content() {
        let tree = course(vec![(
            "declared",
            sub_unit(json!({ "subType": "exam", "totalMcqQuestions": 5 })),
        )]);

        let blueprint = build_blueprint(&tree, SubTypeFilter::Exam);
        assert_eq!(blueprint.len(), 1);
        assert!(blueprint[0].has_mcq);
        assert!(!blueprint[0].has_coding);
    }

    #[test]
    fn items_record_both_modalities() {
        let tree = course(vec![(
            "full",
            sub_unit(json!({
                "subType": "exam",
                "mcq": { "q1": {} },
                "coding": { "c1": {} }
            })),
        )]);

        let blueprint = build_blueprint(&tree, SubTypeFilter::Exam);
        assert_eq!(blueprint.len(), 1);
        assert!(blueprint[0].has_mcq && blueprint[0].has_coding);
    }
}
