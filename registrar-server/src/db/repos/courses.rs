//! Course repository
//!
//! CRUD for courses plus the course → students composite read.
//! A schedule change is refused when it would put an enrolled student
//! into two courses sharing a slot.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::db::error::unique_violation_on;
use crate::db::pool::begin_write;
use crate::db::DbError;
use crate::models::{CourseCode, CoursePatch, Credits, Listing, NewCourse};

use super::students::Student;

/// Course record from database
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Course {
    pub code: String,
    pub name: String,
    pub credits: i64,
    pub schedule: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Course with its enrolled students, in enrollment order
#[derive(Debug, Clone)]
pub struct CourseWithStudents {
    pub course: Course,
    pub students: Vec<Student>,
}

/// Exact-match filters for course listing
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    pub credits: Option<Credits>,
    pub code: Option<CourseCode>,
}

/// Course repository
pub struct CourseRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CourseRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a course. An existing code is a `DuplicateKey` conflict.
    pub async fn create(&self, new: NewCourse) -> Result<Course, DbError> {
        let mut tx = begin_write(self.pool).await?;

        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM courses WHERE code = ?1)")
            .bind(new.code.as_str())
            .fetch_one(&mut *tx)
            .await?;
        if exists.0 {
            return Err(duplicate_code(new.code.as_str()));
        }

        let now = Utc::now();
        let course: Course = sqlx::query_as(
            r#"
            INSERT INTO courses (code, name, credits, schedule, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            RETURNING code, name, credits, schedule, created_at, updated_at
            "#,
        )
        .bind(new.code.as_str())
        .bind(new.name.as_str())
        .bind(new.credits.get())
        .bind(new.schedule.as_str())
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if unique_violation_on(&e, "courses.code") {
                duplicate_code(new.code.as_str())
            } else {
                e.into()
            }
        })?;

        tx.commit().await?;
        Ok(course)
    }

    /// Get a single course by code.
    pub async fn get(&self, code: &str) -> Result<Course, DbError> {
        sqlx::query_as(
            r#"
            SELECT code, name, credits, schedule, created_at, updated_at
            FROM courses
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("course", code))
    }

    /// List courses in insertion order.
    pub async fn list(&self, filter: &CourseFilter, page: Listing) -> Result<Vec<Course>, DbError> {
        let courses = sqlx::query_as(
            r#"
            SELECT code, name, credits, schedule, created_at, updated_at
            FROM courses
            WHERE (?1 IS NULL OR credits = ?1)
              AND (?2 IS NULL OR code = ?2)
            ORDER BY rowid
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(filter.credits.map(Credits::get))
        .bind(filter.code.as_ref().map(CourseCode::as_str))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(courses)
    }

    /// Apply a partial update.
    ///
    /// A code rename carries existing enrollments along (`ON UPDATE CASCADE`).
    pub async fn update(&self, code: &str, patch: CoursePatch) -> Result<Course, DbError> {
        let mut tx = begin_write(self.pool).await?;

        let current: Course = sqlx::query_as(
            r#"
            SELECT code, name, credits, schedule, created_at, updated_at
            FROM courses
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("course", code))?;

        if patch.is_empty() {
            return Ok(current);
        }

        let new_code = patch
            .code
            .as_ref()
            .map_or(current.code.as_str(), CourseCode::as_str)
            .to_owned();

        if new_code != current.code {
            let taken: (bool,) =
                sqlx::query_as("SELECT EXISTS(SELECT 1 FROM courses WHERE code = ?1)")
                    .bind(&new_code)
                    .fetch_one(&mut *tx)
                    .await?;
            if taken.0 {
                return Err(duplicate_code(&new_code));
            }
        }

        if let Some(slot) = patch.schedule.as_ref().filter(|s| s.as_str() != current.schedule) {
            let clash: Option<(String, String)> = sqlx::query_as(
                r#"
                SELECT e.student_id, other.code
                FROM enrollments e
                JOIN enrollments oe
                    ON oe.student_id = e.student_id AND oe.course_code <> e.course_code
                JOIN courses other ON other.code = oe.course_code
                WHERE e.course_code = ?1 AND other.schedule = ?2
                ORDER BY e.id, oe.id
                LIMIT 1
                "#,
            )
            .bind(&current.code)
            .bind(slot.as_str())
            .fetch_optional(&mut *tx)
            .await?;

            if let Some((student_id, conflicting_course)) = clash {
                tracing::debug!(
                    course = %current.code,
                    student = %student_id,
                    conflicting = %conflicting_course,
                    "schedule change rejected"
                );
                return Err(DbError::ScheduleClash {
                    student_id,
                    course_code: current.code,
                    conflicting_course,
                    slot: slot.as_str().to_owned(),
                });
            }
        }

        let course: Course = sqlx::query_as(
            r#"
            UPDATE courses
            SET code = ?1, name = ?2, credits = ?3, schedule = ?4, updated_at = ?5
            WHERE code = ?6
            RETURNING code, name, credits, schedule, created_at, updated_at
            "#,
        )
        .bind(&new_code)
        .bind(patch.name.as_ref().map_or(current.name.as_str(), |n| n.as_str()))
        .bind(patch.credits.map_or(current.credits, Credits::get))
        .bind(
            patch
                .schedule
                .as_ref()
                .map_or(current.schedule.as_str(), |s| s.as_str()),
        )
        .bind(Utc::now())
        .bind(&current.code)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if unique_violation_on(&e, "courses.code") {
                duplicate_code(&new_code)
            } else {
                e.into()
            }
        })?;

        tx.commit().await?;
        Ok(course)
    }

    /// Delete a course and, by cascade, its enrollments.
    pub async fn delete(&self, code: &str) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM courses WHERE code = ?1")
            .bind(code)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("course", code));
        }

        tracing::info!(course = %code, "course deleted");
        Ok(())
    }

    /// Course plus enrolled students, read in one snapshot.
    pub async fn with_students(&self, code: &str) -> Result<CourseWithStudents, DbError> {
        let mut tx = self.pool.begin().await?;

        let course: Course = sqlx::query_as(
            r#"
            SELECT code, name, credits, schedule, created_at, updated_at
            FROM courses
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("course", code))?;

        let students: Vec<Student> = sqlx::query_as(
            r#"
            SELECT s.national_id, s.name, s.email, s.semester, s.created_at, s.updated_at
            FROM enrollments e
            JOIN students s ON s.national_id = e.student_id
            WHERE e.course_code = ?1
            ORDER BY e.id
            "#,
        )
        .bind(code)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(CourseWithStudents { course, students })
    }
}

fn duplicate_code(code: &str) -> DbError {
    DbError::DuplicateKey {
        resource: "course",
        field: "code",
        value: code.to_owned(),
    }
}
