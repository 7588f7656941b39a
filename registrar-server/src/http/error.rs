//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes:
//! validation 422, missing references 404, every conflict 409.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::{is_busy, is_unique_violation, DbError};
use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (422)
    Validation(ValidationError),

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Unique field already taken (409)
    DuplicateKey {
        resource: &'static str,
        field: &'static str,
        value: String,
    },

    /// Student already enrolled in the course (409)
    DuplicateEnrollment {
        student_id: String,
        course_code: String,
    },

    /// Schedule slot already occupied for the student (409)
    ScheduleClash {
        student_id: String,
        course_code: String,
        conflicting_course: String,
        slot: String,
    },

    /// Constraint fired that no precondition caught (409)
    Conflict { message: String },

    /// Database error (500, logged)
    Database(DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "validation_error",
                    "field": e.field(),
                    "message": e.to_string()
                }),
            ),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "resource": resource,
                    "message": format!("{} '{}' not found", resource, id)
                }),
            ),
            Self::DuplicateKey {
                resource,
                field,
                value,
            } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "duplicate_key",
                    "field": field,
                    "message": format!("{} with {} '{}' already exists", resource, field, value)
                }),
            ),
            Self::DuplicateEnrollment {
                student_id,
                course_code,
            } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "duplicate_enrollment",
                    "message": format!(
                        "student '{}' is already enrolled in course '{}'",
                        student_id, course_code
                    )
                }),
            ),
            Self::ScheduleClash {
                student_id,
                course_code,
                conflicting_course,
                slot,
            } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "schedule_clash",
                    "conflicting_course": conflicting_course,
                    "slot": slot,
                    "message": format!(
                        "course '{}' meets in slot '{}', already taken by '{}' for student '{}'",
                        course_code, slot, conflicting_course, student_id
                    )
                }),
            ),
            Self::Conflict { message } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "conflict",
                    "message": message
                }),
            ),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(ValidationError::MalformedBody {
            reason: rejection.body_text(),
        })
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(ValidationError::MalformedBody {
            reason: rejection.body_text(),
        })
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(ValidationError::MalformedBody {
            reason: rejection.body_text(),
        })
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::DuplicateKey {
                resource,
                field,
                value,
            } => Self::DuplicateKey {
                resource,
                field,
                value,
            },
            DbError::DuplicateEnrollment {
                student_id,
                course_code,
            } => Self::DuplicateEnrollment {
                student_id,
                course_code,
            },
            DbError::ScheduleClash {
                student_id,
                course_code,
                conflicting_course,
                slot,
            } => Self::ScheduleClash {
                student_id,
                course_code,
                conflicting_course,
                slot,
            },
            DbError::Sqlx(ref err) if is_unique_violation(err) => {
                tracing::warn!("Unique constraint reached the HTTP boundary: {}", err);
                Self::Conflict {
                    message: "request conflicts with existing data".to_owned(),
                }
            }
            DbError::Sqlx(ref err) if is_busy(err) => {
                tracing::warn!("Write lock wait timed out: {}", err);
                Self::Conflict {
                    message: "a concurrent write holds the store; retry the request".to_owned(),
                }
            }
            other => Self::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_422() {
        let err = ApiError::Validation(ValidationError::Empty { field: "name" });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["field"], "name");
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let err = ApiError::from(DbError::NotFound {
            resource: "student",
            id: "S9".into(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["message"], "student 'S9' not found");
    }

    #[tokio::test]
    async fn schedule_clash_is_409_and_cites_course() {
        let err = ApiError::from(DbError::ScheduleClash {
            student_id: "S1".into(),
            course_code: "C2".into(),
            conflicting_course: "C1".into(),
            slot: "Mon-9".into(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response).await;
        assert_eq!(body["error"], "schedule_clash");
        assert_eq!(body["conflicting_course"], "C1");
    }

    #[tokio::test]
    async fn duplicate_enrollment_is_409() {
        let err = ApiError::from(DbError::DuplicateEnrollment {
            student_id: "S1".into(),
            course_code: "C1".into(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["error"], "duplicate_enrollment");
    }

    #[tokio::test]
    async fn other_store_errors_are_500_with_generic_message() {
        let err = ApiError::from(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], "an internal error occurred");
    }

    #[tokio::test]
    async fn lock_timeout_is_409_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("busy.db").display());
        let pool = crate::db::create_pool_with_options(&url, 2).await.unwrap();

        let mut holder = pool.acquire().await.unwrap();
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *holder).await.unwrap();
        let mut other = pool.acquire().await.unwrap();
        sqlx::query("PRAGMA busy_timeout = 0")
            .execute(&mut *other)
            .await
            .unwrap();
        let busy = sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *other)
            .await
            .unwrap_err();

        let response = ApiError::from(DbError::Sqlx(busy)).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["error"], "conflict");

        sqlx::query("ROLLBACK").execute(&mut *holder).await.unwrap();
    }
}
