//! Enrollment repository
//!
//! `enroll` runs the rule engine and the insert in one transaction:
//! 1. student exists
//! 2. course exists
//! 3. no schedule clash (see `rules::evaluate`)
//! 4. not already enrolled
//!
//! Nothing is written unless all four pass. A concurrent duplicate that
//! gets past step 4 is stopped by `UNIQUE (student_id, course_code)`
//! and reported the same way.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::db::error::is_unique_violation;
use crate::db::pool::begin_write;
use crate::db::DbError;
use crate::models::{CourseCode, Listing, NationalId};
use crate::rules::{self, EnrolledCourse, RuleViolation, Target};

/// Enrollment record from database
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Enrollment {
    pub id: i64,
    pub student_id: String,
    pub course_code: String,
    pub enrolled_at: DateTime<Utc>,
}

/// Exact-match filters for enrollment listing
#[derive(Debug, Clone, Default)]
pub struct EnrollmentFilter {
    pub student_id: Option<String>,
    pub course_code: Option<String>,
}

/// Enrollment repository
pub struct EnrollmentRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> EnrollmentRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Enroll a student in a course, enforcing schedule and duplicate rules.
    pub async fn enroll(
        &self,
        student: &NationalId,
        course: &CourseCode,
    ) -> Result<Enrollment, DbError> {
        let mut tx = begin_write(self.pool).await?;

        let student_exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM students WHERE national_id = ?1)")
                .bind(student.as_str())
                .fetch_one(&mut *tx)
                .await?;
        if !student_exists.0 {
            return Err(DbError::not_found("student", student.as_str()));
        }

        let (schedule,): (String,) = sqlx::query_as("SELECT schedule FROM courses WHERE code = ?1")
            .bind(course.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("course", course.as_str()))?;

        let enrolled: Vec<EnrolledCourse> = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT c.code, c.schedule
            FROM enrollments e
            JOIN courses c ON c.code = e.course_code
            WHERE e.student_id = ?1
            ORDER BY e.id
            "#,
        )
        .bind(student.as_str())
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|(code, schedule)| EnrolledCourse { code, schedule })
        .collect();

        let target = Target {
            code: course.as_str(),
            schedule: &schedule,
        };
        if let Err(violation) = rules::evaluate(target, &enrolled) {
            tracing::debug!(
                student = %student.as_str(),
                course = %course.as_str(),
                ?violation,
                "enrollment rejected"
            );
            return Err(violation_error(violation, student, course));
        }

        let enrollment: Enrollment = sqlx::query_as(
            r#"
            INSERT INTO enrollments (student_id, course_code, enrolled_at)
            VALUES (?1, ?2, ?3)
            RETURNING id, student_id, course_code, enrolled_at
            "#,
        )
        .bind(student.as_str())
        .bind(course.as_str())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_insert_race(e, student, course))?;

        tx.commit()
            .await
            .map_err(|e| map_insert_race(e, student, course))?;

        tracing::info!(
            student = %enrollment.student_id,
            course = %enrollment.course_code,
            "student enrolled"
        );
        Ok(enrollment)
    }

    /// Remove the enrollment identified by the composite key.
    pub async fn withdraw(&self, student: &NationalId, course: &CourseCode) -> Result<(), DbError> {
        let result =
            sqlx::query("DELETE FROM enrollments WHERE student_id = ?1 AND course_code = ?2")
                .bind(student.as_str())
                .bind(course.as_str())
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "enrollment",
                format!("{}/{}", student.as_str(), course.as_str()),
            ));
        }

        tracing::info!(student = %student.as_str(), course = %course.as_str(), "student withdrawn");
        Ok(())
    }

    /// Fetch one enrollment by its surrogate id.
    pub async fn get(&self, id: i64) -> Result<Enrollment, DbError> {
        sqlx::query_as(
            r#"
            SELECT id, student_id, course_code, enrolled_at
            FROM enrollments
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("enrollment", id.to_string()))
    }

    /// List enrollments in insertion order.
    pub async fn list(
        &self,
        filter: &EnrollmentFilter,
        page: Listing,
    ) -> Result<Vec<Enrollment>, DbError> {
        let enrollments = sqlx::query_as(
            r#"
            SELECT id, student_id, course_code, enrolled_at
            FROM enrollments
            WHERE (?1 IS NULL OR student_id = ?1)
              AND (?2 IS NULL OR course_code = ?2)
            ORDER BY id
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(filter.student_id.as_deref())
        .bind(filter.course_code.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(enrollments)
    }
}

fn violation_error(violation: RuleViolation, student: &NationalId, course: &CourseCode) -> DbError {
    match violation {
        RuleViolation::ScheduleClash {
            slot,
            conflicting_course,
        } => DbError::ScheduleClash {
            student_id: student.as_str().to_owned(),
            course_code: course.as_str().to_owned(),
            conflicting_course,
            slot,
        },
        RuleViolation::DuplicateEnrollment => duplicate(student, course),
    }
}

fn map_insert_race(err: sqlx::Error, student: &NationalId, course: &CourseCode) -> DbError {
    if is_unique_violation(&err) {
        tracing::warn!(
            student = %student.as_str(),
            course = %course.as_str(),
            "concurrent enrollment caught by unique constraint"
        );
        duplicate(student, course)
    } else {
        err.into()
    }
}

fn duplicate(student: &NationalId, course: &CourseCode) -> DbError {
    DbError::DuplicateEnrollment {
        student_id: student.as_str().to_owned(),
        course_code: course.as_str().to_owned(),
    }
}
