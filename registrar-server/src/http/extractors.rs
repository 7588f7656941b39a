//! Custom Axum extractors

use axum::extract::{FromRequest, FromRequestParts, Path, Query};
use axum::http::request::Parts;
use axum::Json;

use super::error::ApiError;
use crate::models::{CourseCode, NationalId};

/// JSON body whose rejections render as `ApiError` (422 with a JSON body)
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections render as `ApiError`
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters whose rejections render as `ApiError`
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Extract and validate a student national id from path
pub struct ValidNationalId(pub NationalId);

impl<S> FromRequestParts<S> for ValidNationalId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ApiPath(id): ApiPath<String> = ApiPath::from_request_parts(parts, state).await?;

        Ok(Self(NationalId::new(&id)?))
    }
}

/// Extract and validate a course code from path
pub struct ValidCourseCode(pub CourseCode);

impl<S> FromRequestParts<S> for ValidCourseCode
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ApiPath(code): ApiPath<String> = ApiPath::from_request_parts(parts, state).await?;

        Ok(Self(CourseCode::new(&code)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationError;
    use axum::http::Request;

    #[tokio::test]
    async fn unmatched_path_reports_the_rejection() {
        let (mut parts, _) = Request::builder().uri("/students").body(()).unwrap().into_parts();

        let err = ValidNationalId::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        match err {
            ApiError::Validation(ValidationError::MalformedBody { reason }) => {
                assert!(!reason.contains("empty"), "{reason}");
            }
            other => panic!("unexpected rejection: {other:?}"),
        }
    }
}
