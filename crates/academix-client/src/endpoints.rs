//! Thin consumer functions over the orchestration core
//!
//! Each function supplies a path/params pair to [`ApiClient`] and
//! deserializes the envelope payload; none of them know anything about
//! caching, deduplication, throttling, or token refresh.
//!
//! One deliberate policy lives here: list-style endpoints coerce a 404 into
//! an empty-success result. That conflates "no data" with "error" and is
//! kept for behavioral compatibility with the backend's existing consumers.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use academix_core::domain::{
    ApiEnvelope, ApiError, Course, CourseDetail, CourseQuery, Enrollment, Lesson, StoredSession,
    UserProfile,
};

use crate::client::ApiClient;

/// Payload of a successful login response
#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
    profile: UserProfile,
}

impl ApiClient {
    /// Authenticates with the backend and installs the session.
    ///
    /// The session (token, device identity, profile, authenticated flag) is
    /// persisted so it survives a reload.
    pub async fn login(&self, email: &str, password: &str) -> Result<StoredSession, ApiError> {
        let body = json!({ "email": email, "password": password });
        let value = self.post_json("/auth/login", Some(body)).await?;
        let data: LoginData = parse_envelope(value)?;

        let session = StoredSession::new(data.token, self.tenant_id(), data.profile);
        info!(user = %session.profile.email, "Login succeeded");
        self.auth().install_session(session.clone()).await;
        Ok(session)
    }

    /// Ends the session locally, clearing the durable store
    pub async fn logout(&self) {
        info!("Logging out, clearing session");
        self.auth().clear_session().await;
    }

    /// Lists catalog courses matching the query
    pub async fn get_courses(&self, query: &CourseQuery) -> Result<Vec<Course>, ApiError> {
        let outcome = self.get_json("/courses", &query.to_params()).await;
        as_list(outcome)
    }

    /// Lists the courses the current user is enrolled in
    pub async fn get_enrolled_courses(&self) -> Result<Vec<Course>, ApiError> {
        let outcome = self.get_json("/courses/enrolled", &[]).await;
        as_list(outcome)
    }

    /// Fetches the full detail of one course
    pub async fn get_course(&self, course_id: &str) -> Result<CourseDetail, ApiError> {
        let value = self
            .get_json(&format!("/courses/{}", course_id), &[])
            .await?;
        parse_envelope(value)
    }

    /// Fetches one lesson of a course
    pub async fn get_lesson(
        &self,
        course_id: &str,
        lesson_id: &str,
    ) -> Result<Lesson, ApiError> {
        let value = self
            .get_json(
                &format!("/courses/{}/lessons/{}", course_id, lesson_id),
                &[],
            )
            .await?;
        parse_envelope(value)
    }

    /// Enrolls the current user into a course
    pub async fn enroll(&self, course_id: &str) -> Result<Enrollment, ApiError> {
        let body = json!({ "courseId": course_id });
        let value = self.post_json("/enrollments", Some(body)).await?;
        parse_envelope(value)
    }
}

/// Deserializes a response envelope and extracts its payload
fn parse_envelope<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    let envelope: ApiEnvelope<T> =
        serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
    envelope.into_data().map_err(ApiError::InvalidResponse)
}

/// List-endpoint policy: a 404 becomes an empty list, everything else is
/// passed through untouched.
fn as_list<T: DeserializeOwned>(outcome: Result<Value, ApiError>) -> Result<Vec<T>, ApiError> {
    match outcome {
        Ok(value) => parse_envelope(value),
        Err(ApiError::NotFound(_)) => Ok(Vec::new()),
        Err(err) => Err(err),
    }
}
