//! Enrollment endpoints
//!
//! Enrollments are created and removed by composite key in the request
//! body; there is no update.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::repos::{Enrollment, EnrollmentFilter, EnrollmentRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiPath, ApiQuery};
use crate::http::server::AppState;
use crate::models::{CourseCode, Listing, NationalId};

/// Composite enrollment key, used by both POST and DELETE
#[derive(Deserialize)]
pub struct EnrollmentRequest {
    pub student_id: String,
    pub course_code: String,
}

/// Query parameters for GET /enrollments
#[derive(Debug, Default, Deserialize)]
pub struct EnrollmentListParams {
    pub student_id: Option<String>,
    pub course_code: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

/// Enrollment response
#[derive(Serialize)]
pub struct EnrollmentResponse {
    pub id: i64,
    pub student_id: String,
    pub course_code: String,
    pub enrolled_at: String,
}

impl From<Enrollment> for EnrollmentResponse {
    fn from(e: Enrollment) -> Self {
        Self {
            id: e.id,
            student_id: e.student_id,
            course_code: e.course_code,
            enrolled_at: e.enrolled_at.to_rfc3339(),
        }
    }
}

/// GET /enrollments - list enrollments
async fn list_enrollments(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<EnrollmentListParams>,
) -> Result<Json<Vec<EnrollmentResponse>>, ApiError> {
    let filter = EnrollmentFilter {
        student_id: params.student_id,
        course_code: params.course_code,
    };
    let page = Listing::from_params(params.offset, params.limit);
    let enrollments = EnrollmentRepo::new(&state.pool).list(&filter, page).await?;

    Ok(Json(enrollments.into_iter().map(EnrollmentResponse::from).collect()))
}

/// GET /enrollments/{id} - one enrollment by id
async fn get_enrollment(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<EnrollmentResponse>, ApiError> {
    let enrollment = EnrollmentRepo::new(&state.pool).get(id).await?;
    Ok(Json(EnrollmentResponse::from(enrollment)))
}

/// POST /enrollments - enroll a student in a course
async fn enroll(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<EnrollmentRequest>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), ApiError> {
    let student = NationalId::new(&req.student_id)?;
    let course = CourseCode::new(&req.course_code)?;
    let enrollment = EnrollmentRepo::new(&state.pool).enroll(&student, &course).await?;

    Ok((StatusCode::CREATED, Json(EnrollmentResponse::from(enrollment))))
}

/// DELETE /enrollments - withdraw a student from a course
async fn withdraw(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<EnrollmentRequest>,
) -> Result<StatusCode, ApiError> {
    let student = NationalId::new(&req.student_id)?;
    let course = CourseCode::new(&req.course_code)?;
    EnrollmentRepo::new(&state.pool).withdraw(&student, &course).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Enrollment routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/enrollments",
            get(list_enrollments).post(enroll).delete(withdraw),
        )
        .route("/enrollments/{id}", get(get_enrollment))
}
