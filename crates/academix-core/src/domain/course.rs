//! Course catalog DTOs and the backend response envelope
//!
//! These are wire-level data shapes, not rich domain entities: the consumer
//! functions in `academix-client` deserialize backend payloads into them and
//! hand them straight to callers. Fields the backend may omit are `Option`.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Standard response envelope used by every Academix endpoint
///
/// Success responses look like `{ "success": true, "data": ... }`; failures
/// carry `{ "success": false, "message": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the backend considers the call successful
    pub success: bool,
    /// The payload, present on success
    pub data: Option<T>,
    /// Human-readable message, present on failure
    pub message: Option<String>,
}

impl<T: DeserializeOwned> ApiEnvelope<T> {
    /// Extracts the payload, returning the backend message on a
    /// `success: false` envelope or a missing `data` field.
    pub fn into_data(self) -> Result<T, String> {
        if !self.success {
            return Err(self
                .message
                .unwrap_or_else(|| "request was not successful".to_string()));
        }
        self.data.ok_or_else(|| "missing data field".to_string())
    }
}

/// A course as it appears in catalog listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Backend identifier
    pub id: String,
    /// Course title
    pub title: String,
    /// Grade level the course targets (e.g. "Secondary1")
    pub grade: Option<String>,
    /// Subject area (e.g. "Mathematics")
    pub subject: Option<String>,
    /// Cover image URL
    pub thumbnail_url: Option<String>,
    /// Number of lessons in the course
    pub lesson_count: Option<u32>,
}

/// Full course detail, including its lesson index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    /// Backend identifier
    pub id: String,
    /// Course title
    pub title: String,
    /// Long-form description
    pub description: Option<String>,
    /// Grade level the course targets
    pub grade: Option<String>,
    /// Lessons in presentation order
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// A single lesson within a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    /// Backend identifier
    pub id: String,
    /// Lesson title
    pub title: String,
    /// Playback URL for the lesson video, if any
    pub video_url: Option<String>,
    /// Duration in seconds
    pub duration_seconds: Option<u32>,
}

/// An enrollment of the current user into a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    /// The enrolled course
    pub course_id: String,
    /// When the enrollment was created
    pub enrolled_at: Option<DateTime<Utc>>,
}

/// Query parameters for catalog listings.
///
/// Parameter names on the wire follow the backend's convention:
/// `grade`, `pagenumber`, `pagesize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseQuery {
    /// Grade filter (e.g. "Secondary1"); omitted when `None`
    pub grade: Option<String>,
    /// 1-based page number
    pub page_number: u32,
    /// Page size
    pub page_size: u32,
}

impl Default for CourseQuery {
    fn default() -> Self {
        Self {
            grade: None,
            page_number: 1,
            page_size: 10,
        }
    }
}

impl CourseQuery {
    /// Serializes the query into (name, value) pairs in wire naming
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(grade) = &self.grade {
            params.push(("grade".to_string(), grade.clone()));
        }
        params.push(("pagenumber".to_string(), self.page_number.to_string()));
        params.push(("pagesize".to_string(), self.page_size.to_string()));
        params
    }
}
