// src/content/store.rs

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppError;

/// Read interface of the hierarchical content store.
///
/// Point lookup by slash-delimited document path, e.g.
/// `Courses/{course_id}/units/{unit_id}/sub-units/{sub_unit_id}`.
/// `Ok(None)` means the path does not exist; `Err` means the store itself
/// could not be queried. Callers must treat those differently: an absent
/// path is an expected empty-content state, a transport failure is a 500.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Option<Value>, AppError>;
}

/// HTTP-backed content store (document database REST interface, one JSON
/// document per path).
pub struct HttpContentStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpContentStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn fetch(&self, path: &str) -> Result<Option<Value>, AppError> {
        let url = format!("{}/{}.json", self.base_url, path.trim_matches('/'));

        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let value: Value = response.error_for_status()?.json().await?;

        // The store answers `null` for absent paths under an existing parent.
        if value.is_null() {
            Ok(None)
        } else {
            Ok(Some(value))
        }
    }
}

/// In-memory content store holding one document tree, navigated by path
/// segments. Used by unit tests; behaves like the HTTP store for absent
/// paths.
pub struct MemoryContentStore {
    root: Value,
}

impl MemoryContentStore {
    pub fn new(root: Value) -> Self {
        Self { root }
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn fetch(&self, path: &str) -> Result<Option<Value>, AppError> {
        let mut node = &self.root;
        for segment in path.trim_matches('/').split('/') {
            match node.get(segment) {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }
        if node.is_null() {
            Ok(None)
        } else {
            Ok(Some(node.clone()))
        }
    }
}

/// Path builders for the content tree layout.
pub mod path {
    pub fn course_units(course_id: &str) -> String {
        format!("Courses/{course_id}/units")
    }

    pub fn unit(course_id: &str, unit_id: &str) -> String {
        format!("Courses/{course_id}/units/{unit_id}")
    }

    pub fn sub_unit(course_id: &str, unit_id: &str, sub_unit_id: &str) -> String {
        format!("Courses/{course_id}/units/{unit_id}/sub-units/{sub_unit_id}")
    }

    pub fn question(
        course_id: &str,
        unit_id: &str,
        sub_unit_id: &str,
        modality: &str,
        question_id: &str,
    ) -> String {
        format!("Courses/{course_id}/units/{unit_id}/sub-units/{sub_unit_id}/{modality}/{question_id}")
    }
}
