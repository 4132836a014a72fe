// src/content/tree.rs
//
// Typed view of the course content tree. The store hands back loosely
// structured documents; everything is parsed once here, with defaults for
// absent fields, so the analytics code never probes raw JSON.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::content::store::{ContentStore, path};
use crate::error::AppError;

/// A whole course: ordered mapping of unit id to unit.
#[derive(Debug, Clone, Default)]
pub struct CourseTree {
    pub units: BTreeMap<String, UnitNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UnitNode {
    pub title: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "sub-units", alias = "sub_units")]
    pub sub_units: BTreeMap<String, SubUnitNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubUnitNode {
    pub title: Option<String>,
    pub name: Option<String>,
    /// 'practice', 'exam', or passive content types (video/pdf/...).
    pub sub_type: Option<String>,
    pub mcq: BTreeMap<String, McqQuestion>,
    pub coding: BTreeMap<String, CodingQuestion>,
    pub total_mcq_questions: Option<u32>,
    pub mcq_questions_to_show: Option<u32>,
    pub total_coding_questions: Option<u32>,
    pub coding_questions_to_show: Option<u32>,
}

impl SubUnitNode {
    /// A sub-unit carries mcq content if the question map is non-empty or a
    /// positive question count is declared.
    pub fn has_mcq(&self) -> bool {
        !self.mcq.is_empty() || self.total_mcq_questions.unwrap_or(0) > 0
    }

    pub fn has_coding(&self) -> bool {
        !self.coding.is_empty() || self.total_coding_questions.unwrap_or(0) > 0
    }

    /// Valid question ids for a modality, as known to the content tree.
    pub fn question_ids(&self, modality: &str) -> Vec<&str> {
        match modality {
            "mcq" => self.mcq.keys().map(String::as_str).collect(),
            "coding" => self.coding.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Total questions available for a modality. Declared counter wins,
    /// falling back to the size of the question map.
    pub fn total_questions(&self, modality: &str) -> u32 {
        match modality {
            "mcq" => self
                .total_mcq_questions
                .unwrap_or(self.mcq.len() as u32),
            "coding" => self
                .total_coding_questions
                .unwrap_or(self.coding.len() as u32),
            _ => 0,
        }
    }

    /// How many questions an attempt is graded against: the questions-to-show
    /// cap if set, otherwise everything available.
    pub fn questions_to_show(&self, modality: &str) -> u32 {
        let cap = match modality {
            "mcq" => self.mcq_questions_to_show,
            "coding" => self.coding_questions_to_show,
            _ => None,
        };
        cap.unwrap_or_else(|| self.total_questions(modality))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct McqQuestion {
    pub question: Option<String>,
    pub options: Vec<McqOption>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct McqOption {
    pub text: Option<String>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodingQuestion {
    pub title: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub solution: Option<String>,
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestCase {
    pub input: Option<String>,
    pub expected_output: Option<String>,
    pub is_sample: bool,
}

/// Display title fallback chain: `title`, then `name`, then "Untitled".
/// The order is load-bearing; old documents only carry `name`.
pub fn display_title(title: Option<&str>, name: Option<&str>) -> String {
    title
        .filter(|s| !s.is_empty())
        .or(name.filter(|s| !s.is_empty()))
        .unwrap_or("Untitled")
        .to_string()
}

/// Loads and parses the unit map of one course.
/// `Ok(None)` when the course has no content yet.
pub async fn load_course(
    store: &dyn ContentStore,
    course_id: &str,
) -> Result<Option<CourseTree>, AppError> {
    let Some(value) = store.fetch(&path::course_units(course_id)).await? else {
        return Ok(None);
    };
    Ok(Some(CourseTree {
        units: parse_node_map(value, "unit"),
    }))
}

/// Loads a single unit.
pub async fn load_unit(
    store: &dyn ContentStore,
    course_id: &str,
    unit_id: &str,
) -> Result<Option<UnitNode>, AppError> {
    let Some(value) = store.fetch(&path::unit(course_id, unit_id)).await? else {
        return Ok(None);
    };
    Ok(parse_node(value, "unit"))
}

/// Loads a single sub-unit's metadata.
pub async fn load_sub_unit(
    store: &dyn ContentStore,
    course_id: &str,
    unit_id: &str,
    sub_unit_id: &str,
) -> Result<Option<SubUnitNode>, AppError> {
    let Some(value) = store
        .fetch(&path::sub_unit(course_id, unit_id, sub_unit_id))
        .await?
    else {
        return Ok(None);
    };
    Ok(parse_node(value, "sub-unit"))
}

/// Parses a map of child documents, skipping entries that are not objects.
/// Legacy trees occasionally hold stray scalar fields next to real nodes.
fn parse_node_map<T: serde::de::DeserializeOwned>(
    value: Value,
    kind: &str,
) -> BTreeMap<String, T> {
    let Value::Object(entries) = value else {
        tracing::warn!("Content tree {} map is not an object", kind);
        return BTreeMap::new();
    };

    entries
        .into_iter()
        .filter_map(|(id, node)| match serde_json::from_value::<T>(node) {
            Ok(parsed) => Some((id, parsed)),
            Err(e) => {
                tracing::warn!("Skipping malformed {} '{}': {}", kind, id, e);
                None
            }
        })
        .collect()
}

fn parse_node<T: serde::de::DeserializeOwned>(value: Value, kind: &str) -> Option<T> {
    match serde_json::from_value::<T>(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Malformed {} document: {}", kind, e);
            None
        }
    }
}
