//! Student endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use super::courses::CourseResponse;
use crate::db::repos::{Student, StudentFilter, StudentRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiQuery, ValidNationalId};
use crate::http::server::AppState;
use crate::models::patch::double_option;
use crate::models::{
    Email, Listing, NationalId, NewStudent, PersonName, Semester, StudentPatch, ValidationError,
};

/// Create student request
#[derive(Deserialize)]
pub struct CreateStudentRequest {
    pub national_id: String,
    pub name: String,
    pub email: Option<String>,
    pub semester: i64,
}

impl CreateStudentRequest {
    fn validate(self) -> Result<NewStudent, ValidationError> {
        Ok(NewStudent {
            national_id: NationalId::new(&self.national_id)?,
            name: PersonName::new(&self.name)?,
            email: self.email.as_deref().map(Email::new).transpose()?,
            semester: Semester::new(self.semester)?,
        })
    }
}

/// Partial update request. Omitted fields are left unchanged;
/// `"email": null` clears the email.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    pub semester: Option<i64>,
}

impl UpdateStudentRequest {
    fn validate(self) -> Result<StudentPatch, ValidationError> {
        Ok(StudentPatch {
            name: self.name.as_deref().map(PersonName::new).transpose()?,
            email: self
                .email
                .map(|email| email.as_deref().map(Email::new).transpose())
                .transpose()?,
            semester: self.semester.map(Semester::new).transpose()?,
        })
    }
}

/// Query parameters for GET /students
#[derive(Debug, Default, Deserialize)]
pub struct StudentListParams {
    pub semester: Option<i64>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

/// Student response
#[derive(Serialize)]
pub struct StudentResponse {
    pub national_id: String,
    pub name: String,
    pub email: Option<String>,
    pub semester: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Student> for StudentResponse {
    fn from(s: Student) -> Self {
        Self {
            national_id: s.national_id,
            name: s.name,
            email: s.email,
            semester: s.semester,
            created_at: s.created_at.to_rfc3339(),
            updated_at: s.updated_at.to_rfc3339(),
        }
    }
}

/// Student with enrolled courses
#[derive(Serialize)]
pub struct StudentDetailResponse {
    #[serde(flatten)]
    pub student: StudentResponse,
    pub courses: Vec<CourseResponse>,
}

/// GET /students - list students, optionally by semester
async fn list_students(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<StudentListParams>,
) -> Result<Json<Vec<StudentResponse>>, ApiError> {
    let filter = StudentFilter {
        semester: params.semester.map(Semester::new).transpose()?,
    };
    let page = Listing::from_params(params.offset, params.limit);
    let students = StudentRepo::new(&state.pool).list(&filter, page).await?;

    Ok(Json(students.into_iter().map(StudentResponse::from).collect()))
}

/// POST /students - create a student
async fn create_student(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateStudentRequest>,
) -> Result<(StatusCode, Json<StudentResponse>), ApiError> {
    let new = req.validate()?;
    let student = StudentRepo::new(&state.pool).create(new).await?;

    Ok((StatusCode::CREATED, Json(StudentResponse::from(student))))
}

/// GET /students/{id} - student with enrolled courses
async fn get_student(
    State(state): State<Arc<AppState>>,
    ValidNationalId(id): ValidNationalId,
) -> Result<Json<StudentDetailResponse>, ApiError> {
    let view = StudentRepo::new(&state.pool).with_courses(id.as_str()).await?;

    Ok(Json(StudentDetailResponse {
        student: StudentResponse::from(view.student),
        courses: view.courses.into_iter().map(CourseResponse::from).collect(),
    }))
}

/// PATCH /students/{id} - partial update
async fn update_student(
    State(state): State<Arc<AppState>>,
    ValidNationalId(id): ValidNationalId,
    ApiJson(req): ApiJson<UpdateStudentRequest>,
) -> Result<Json<StudentResponse>, ApiError> {
    let patch = req.validate()?;
    let student = StudentRepo::new(&state.pool).update(id.as_str(), patch).await?;

    Ok(Json(StudentResponse::from(student)))
}

/// DELETE /students/{id} - delete student and its enrollments
async fn delete_student(
    State(state): State<Arc<AppState>>,
    ValidNationalId(id): ValidNationalId,
) -> Result<StatusCode, ApiError> {
    StudentRepo::new(&state.pool).delete(id.as_str()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /students/{id}/courses - courses the student is enrolled in
async fn student_courses(
    State(state): State<Arc<AppState>>,
    ValidNationalId(id): ValidNationalId,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let view = StudentRepo::new(&state.pool).with_courses(id.as_str()).await?;
    Ok(Json(view.courses.into_iter().map(CourseResponse::from).collect()))
}

/// Student routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/{id}",
            get(get_student).patch(update_student).delete(delete_student),
        )
        .route("/students/{id}/courses", get(student_courses))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_support::{send, test_app};
    use axum::http::Method;
    use serde_json::json;

    #[test]
    fn update_request_tracks_presence() {
        let req: UpdateStudentRequest = serde_json::from_str(r#"{"semester": 4}"#).unwrap();
        let patch = req.validate().unwrap();
        assert!(patch.name.is_none());
        assert!(patch.email.is_none());
        assert_eq!(patch.semester, Some(Semester::new(4).unwrap()));

        let req: UpdateStudentRequest = serde_json::from_str(r#"{"email": null}"#).unwrap();
        assert!(matches!(req.validate().unwrap().email, Some(None)));
    }

    #[test]
    fn update_request_rejects_key_change() {
        let parsed = serde_json::from_str::<UpdateStudentRequest>(r#"{"national_id": "X"}"#);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn create_get_and_conflict() {
        let app = test_app().await;
        let body = json!({"national_id": "S1", "name": "Ana", "email": "ana@uni.edu", "semester": 3});

        let (status, created) = send(&app, Method::POST, "/students", Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["national_id"], "S1");

        let (status, fetched) = send(&app, Method::GET, "/students/S1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Ana");
        assert_eq!(fetched["courses"], json!([]));

        let (status, err) = send(&app, Method::POST, "/students", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["error"], "duplicate_key");
    }

    #[tokio::test]
    async fn invalid_fields_are_422() {
        let app = test_app().await;

        let (status, err) = send(
            &app,
            Method::POST,
            "/students",
            Some(json!({"national_id": "S1", "name": "Ana", "semester": 13})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["field"], "semester");

        let (status, err) = send(
            &app,
            Method::POST,
            "/students",
            Some(json!({"national_id": "S1", "semester": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["error"], "validation_error");
    }

    #[tokio::test]
    async fn patch_semester_only() {
        let app = test_app().await;
        send(
            &app,
            Method::POST,
            "/students",
            Some(json!({"national_id": "S1", "name": "Ana", "email": "ana@uni.edu", "semester": 3})),
        )
        .await;

        let (status, updated) = send(
            &app,
            Method::PATCH,
            "/students/S1",
            Some(json!({"semester": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["semester"], 5);
        assert_eq!(updated["name"], "Ana");
        assert_eq!(updated["email"], "ana@uni.edu");
    }

    #[tokio::test]
    async fn missing_student_paths_are_404() {
        let app = test_app().await;

        for (method, uri) in [
            (Method::GET, "/students/S404"),
            (Method::DELETE, "/students/S404"),
            (Method::GET, "/students/S404/courses"),
        ] {
            let (status, body) = send(&app, method, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["error"], "not_found");
        }

        let (status, _) = send(&app, Method::PATCH, "/students/S404", Some(json!({"semester": 2}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_by_semester() {
        let app = test_app().await;
        for (id, semester) in [("S1", 1), ("S2", 2), ("S3", 2)] {
            send(
                &app,
                Method::POST,
                "/students",
                Some(json!({"national_id": id, "name": id, "semester": semester})),
            )
            .await;
        }

        let (status, all) = send(&app, Method::GET, "/students", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all.as_array().unwrap().len(), 3);

        let (_, second) = send(&app, Method::GET, "/students?semester=2", None).await;
        let ids: Vec<_> = second
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["national_id"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(ids, ["S2", "S3"]);

        let (status, _) = send(&app, Method::GET, "/students?semester=99", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(&app, Method::GET, "/students?semester=abc", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn delete_is_204_then_404() {
        let app = test_app().await;
        send(
            &app,
            Method::POST,
            "/students",
            Some(json!({"national_id": "S1", "name": "Ana", "semester": 1})),
        )
        .await;

        let (status, _) = send(&app, Method::DELETE, "/students/S1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::DELETE, "/students/S1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
