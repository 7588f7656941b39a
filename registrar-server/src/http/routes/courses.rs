//! Course endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use super::students::StudentResponse;
use crate::db::repos::{Course, CourseFilter, CourseRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiQuery, ValidCourseCode};
use crate::http::server::AppState;
use crate::models::{
    CourseCode, CoursePatch, Credits, Listing, NewCourse, PersonName, ScheduleSlot,
    ValidationError,
};

/// Create course request
#[derive(Deserialize)]
pub struct CreateCourseRequest {
    pub code: String,
    pub name: String,
    pub credits: i64,
    pub schedule: String,
}

impl CreateCourseRequest {
    fn validate(self) -> Result<NewCourse, ValidationError> {
        Ok(NewCourse {
            code: CourseCode::new(&self.code)?,
            name: PersonName::new(&self.name)?,
            credits: Credits::new(self.credits)?,
            schedule: ScheduleSlot::new(&self.schedule)?,
        })
    }
}

/// Partial update request. Omitted fields are left unchanged.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCourseRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub credits: Option<i64>,
    pub schedule: Option<String>,
}

impl UpdateCourseRequest {
    fn validate(self) -> Result<CoursePatch, ValidationError> {
        Ok(CoursePatch {
            code: self.code.as_deref().map(CourseCode::new).transpose()?,
            name: self.name.as_deref().map(PersonName::new).transpose()?,
            credits: self.credits.map(Credits::new).transpose()?,
            schedule: self.schedule.as_deref().map(ScheduleSlot::new).transpose()?,
        })
    }
}

/// Query parameters for GET /courses
#[derive(Debug, Default, Deserialize)]
pub struct CourseListParams {
    pub credits: Option<i64>,
    pub code: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

/// Course response
#[derive(Serialize)]
pub struct CourseResponse {
    pub code: String,
    pub name: String,
    pub credits: i64,
    pub schedule: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Course> for CourseResponse {
    fn from(c: Course) -> Self {
        Self {
            code: c.code,
            name: c.name,
            credits: c.credits,
            schedule: c.schedule,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

/// Course with enrolled students
#[derive(Serialize)]
pub struct CourseDetailResponse {
    #[serde(flatten)]
    pub course: CourseResponse,
    pub students: Vec<StudentResponse>,
}

/// GET /courses - list courses, optionally by credits and code
async fn list_courses(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<CourseListParams>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let filter = CourseFilter {
        credits: params.credits.map(Credits::new).transpose()?,
        code: params.code.as_deref().map(CourseCode::new).transpose()?,
    };
    let page = Listing::from_params(params.offset, params.limit);
    let courses = CourseRepo::new(&state.pool).list(&filter, page).await?;

    Ok(Json(courses.into_iter().map(CourseResponse::from).collect()))
}

/// POST /courses - create a course
async fn create_course(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    let new = req.validate()?;
    let course = CourseRepo::new(&state.pool).create(new).await?;

    Ok((StatusCode::CREATED, Json(CourseResponse::from(course))))
}

/// GET /courses/{code} - course with enrolled students
async fn get_course(
    State(state): State<Arc<AppState>>,
    ValidCourseCode(code): ValidCourseCode,
) -> Result<Json<CourseDetailResponse>, ApiError> {
    let view = CourseRepo::new(&state.pool).with_students(code.as_str()).await?;

    Ok(Json(CourseDetailResponse {
        course: CourseResponse::from(view.course),
        students: view.students.into_iter().map(StudentResponse::from).collect(),
    }))
}

/// PATCH /courses/{code} - partial update
async fn update_course(
    State(state): State<Arc<AppState>>,
    ValidCourseCode(code): ValidCourseCode,
    ApiJson(req): ApiJson<UpdateCourseRequest>,
) -> Result<Json<CourseResponse>, ApiError> {
    let patch = req.validate()?;
    let course = CourseRepo::new(&state.pool).update(code.as_str(), patch).await?;

    Ok(Json(CourseResponse::from(course)))
}

/// DELETE /courses/{code} - delete course and its enrollments
async fn delete_course(
    State(state): State<Arc<AppState>>,
    ValidCourseCode(code): ValidCourseCode,
) -> Result<StatusCode, ApiError> {
    CourseRepo::new(&state.pool).delete(code.as_str()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /courses/{code}/students - students enrolled in the course
async fn course_students(
    State(state): State<Arc<AppState>>,
    ValidCourseCode(code): ValidCourseCode,
) -> Result<Json<Vec<StudentResponse>>, ApiError> {
    let view = CourseRepo::new(&state.pool).with_students(code.as_str()).await?;
    Ok(Json(view.students.into_iter().map(StudentResponse::from).collect()))
}

/// Course routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/{code}",
            get(get_course).patch(update_course).delete(delete_course),
        )
        .route("/courses/{code}/students", get(course_students))
}
