//! Student repository
//!
//! Handles student CRUD and the student → courses composite read.
//! Key and email uniqueness are checked inside the write transaction;
//! a constraint violation that still fires is mapped to the same conflict.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::db::error::unique_violation_on;
use crate::db::pool::begin_write;
use crate::db::DbError;
use crate::models::{Email, Listing, NewStudent, Semester, StudentPatch};

use super::courses::Course;

/// Student record from database
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Student {
    pub national_id: String,
    pub name: String,
    pub email: Option<String>,
    pub semester: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Student with enrolled courses, in enrollment order
#[derive(Debug, Clone)]
pub struct StudentWithCourses {
    pub student: Student,
    pub courses: Vec<Course>,
}

/// Exact-match filters for student listing
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub semester: Option<Semester>,
}

/// Student repository
pub struct StudentRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> StudentRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a student.
    ///
    /// Fails with `DuplicateKey` if the national id or the email is taken.
    pub async fn create(&self, new: NewStudent) -> Result<Student, DbError> {
        let mut tx = begin_write(self.pool).await?;

        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM students WHERE national_id = ?1)")
                .bind(new.national_id.as_str())
                .fetch_one(&mut *tx)
                .await?;
        if exists.0 {
            return Err(duplicate_id(new.national_id.as_str()));
        }

        if let Some(email) = &new.email {
            let taken: (bool,) =
                sqlx::query_as("SELECT EXISTS(SELECT 1 FROM students WHERE email = ?1)")
                    .bind(email.as_str())
                    .fetch_one(&mut *tx)
                    .await?;
            if taken.0 {
                return Err(duplicate_email(email));
            }
        }

        let now = Utc::now();
        let student: Student = sqlx::query_as(
            r#"
            INSERT INTO students (national_id, name, email, semester, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            RETURNING national_id, name, email, semester, created_at, updated_at
            "#,
        )
        .bind(new.national_id.as_str())
        .bind(new.name.as_str())
        .bind(new.email.as_ref().map(Email::as_str))
        .bind(new.semester.get())
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if unique_violation_on(&e, "students.email") {
                tracing::warn!("email uniqueness enforced by constraint");
                new.email
                    .as_ref()
                    .map_or_else(|| DbError::from(e), duplicate_email)
            } else if unique_violation_on(&e, "students.national_id") {
                tracing::warn!("national id uniqueness enforced by constraint");
                duplicate_id(new.national_id.as_str())
            } else {
                e.into()
            }
        })?;

        tx.commit().await?;
        Ok(student)
    }

    /// Get a single student by national id.
    pub async fn get(&self, national_id: &str) -> Result<Student, DbError> {
        sqlx::query_as(
            r#"
            SELECT national_id, name, email, semester, created_at, updated_at
            FROM students
            WHERE national_id = ?1
            "#,
        )
        .bind(national_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("student", national_id))
    }

    /// List students in insertion order.
    pub async fn list(&self, filter: &StudentFilter, page: Listing) -> Result<Vec<Student>, DbError> {
        let students = sqlx::query_as(
            r#"
            SELECT national_id, name, email, semester, created_at, updated_at
            FROM students
            WHERE (?1 IS NULL OR semester = ?1)
            ORDER BY rowid
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(filter.semester.map(Semester::get))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(students)
    }

    /// Apply a partial update. Fields absent from `patch` keep their value.
    pub async fn update(&self, national_id: &str, patch: StudentPatch) -> Result<Student, DbError> {
        let mut tx = begin_write(self.pool).await?;

        let current: Student = sqlx::query_as(
            r#"
            SELECT national_id, name, email, semester, created_at, updated_at
            FROM students
            WHERE national_id = ?1
            "#,
        )
        .bind(national_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("student", national_id))?;

        if patch.is_empty() {
            return Ok(current);
        }

        if let Some(Some(email)) = &patch.email {
            let taken: (bool,) = sqlx::query_as(
                "SELECT EXISTS(SELECT 1 FROM students WHERE email = ?1 AND national_id <> ?2)",
            )
            .bind(email.as_str())
            .bind(national_id)
            .fetch_one(&mut *tx)
            .await?;
            if taken.0 {
                return Err(duplicate_email(email));
            }
        }

        let email = match &patch.email {
            None => current.email.clone(),
            Some(value) => value.as_ref().map(|e| e.as_str().to_owned()),
        };

        let student: Student = sqlx::query_as(
            r#"
            UPDATE students
            SET name = ?1, email = ?2, semester = ?3, updated_at = ?4
            WHERE national_id = ?5
            RETURNING national_id, name, email, semester, created_at, updated_at
            "#,
        )
        .bind(patch.name.as_ref().map_or(current.name.as_str(), |n| n.as_str()))
        .bind(email.as_deref())
        .bind(patch.semester.map_or(current.semester, Semester::get))
        .bind(Utc::now())
        .bind(national_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if unique_violation_on(&e, "students.email") {
                tracing::warn!(student = %national_id, "email uniqueness enforced by constraint");
                DbError::DuplicateKey {
                    resource: "student",
                    field: "email",
                    value: email.clone().unwrap_or_default(),
                }
            } else {
                e.into()
            }
        })?;

        tx.commit().await?;
        Ok(student)
    }

    /// Delete a student and, by cascade, its enrollments.
    pub async fn delete(&self, national_id: &str) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM students WHERE national_id = ?1")
            .bind(national_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("student", national_id));
        }

        tracing::info!(student = %national_id, "student deleted");
        Ok(())
    }

    /// Student plus enrolled courses, read in one snapshot.
    pub async fn with_courses(&self, national_id: &str) -> Result<StudentWithCourses, DbError> {
        let mut tx = self.pool.begin().await?;

        let student: Student = sqlx::query_as(
            r#"
            SELECT national_id, name, email, semester, created_at, updated_at
            FROM students
            WHERE national_id = ?1
            "#,
        )
        .bind(national_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("student", national_id))?;

        let courses: Vec<Course> = sqlx::query_as(
            r#"
            SELECT c.code, c.name, c.credits, c.schedule, c.created_at, c.updated_at
            FROM enrollments e
            JOIN courses c ON c.code = e.course_code
            WHERE e.student_id = ?1
            ORDER BY e.id
            "#,
        )
        .bind(national_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(StudentWithCourses { student, courses })
    }
}

fn duplicate_id(national_id: &str) -> DbError {
    DbError::DuplicateKey {
        resource: "student",
        field: "national_id",
        value: national_id.to_owned(),
    }
}

fn duplicate_email(email: &Email) -> DbError {
    DbError::DuplicateKey {
        resource: "student",
        field: "email",
        value: email.as_str().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;
    use crate::db::repos::test_support::{course, student};
    use crate::db::repos::{CourseRepo, EnrollmentRepo};
    use crate::models::{CourseCode, NationalId, PersonName};

    #[tokio::test]
    async fn listing_returns_exactly_created_set() {
        let pool = create_memory_pool().await.unwrap();
        let repo = StudentRepo::new(&pool);

        for id in ["S3", "S1", "S2"] {
            repo.create(student(id)).await.unwrap();
        }

        let listed = repo.list(&StudentFilter::default(), Listing::default()).await.unwrap();
        let mut ids: Vec<_> = listed.into_iter().map(|s| s.national_id).collect();
        ids.sort();
        assert_eq!(ids, ["S1", "S2", "S3"]);
    }

    #[tokio::test]
    async fn list_filters_by_semester() {
        let pool = create_memory_pool().await.unwrap();
        let repo = StudentRepo::new(&pool);

        let mut senior = student("S2");
        senior.semester = Semester::new(9).unwrap();
        repo.create(student("S1")).await.unwrap();
        repo.create(senior).await.unwrap();

        let filter = StudentFilter {
            semester: Some(Semester::new(9).unwrap()),
        };
        let listed = repo.list(&filter, Listing::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].national_id, "S2");
    }

    #[tokio::test]
    async fn duplicate_id_is_conflict() {
        let pool = create_memory_pool().await.unwrap();
        let repo = StudentRepo::new(&pool);
        repo.create(student("S1")).await.unwrap();

        let mut again = student("S1");
        again.name = PersonName::new("Someone Else").unwrap();
        let err = repo.create(again).await.unwrap_err();
        assert!(matches!(err, DbError::DuplicateKey { field: "national_id", .. }));

        assert_eq!(repo.get("S1").await.unwrap().name, "Student S1");
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let pool = create_memory_pool().await.unwrap();
        let repo = StudentRepo::new(&pool);

        let mut first = student("S1");
        first.email = Some(Email::new("ana@uni.edu").unwrap());
        repo.create(first).await.unwrap();

        let mut second = student("S2");
        second.email = Some(Email::new("ANA@uni.edu").unwrap());
        let err = repo.create(second).await.unwrap_err();
        assert!(matches!(err, DbError::DuplicateKey { field: "email", .. }));
    }

    #[tokio::test]
    async fn students_without_email_do_not_collide() {
        let pool = create_memory_pool().await.unwrap();
        let repo = StudentRepo::new(&pool);

        let mut a = student("S1");
        a.email = None;
        let mut b = student("S2");
        b.email = None;
        repo.create(a).await.unwrap();
        repo.create(b).await.unwrap();
    }

    #[tokio::test]
    async fn updating_semester_leaves_name_and_email() {
        let pool = create_memory_pool().await.unwrap();
        let repo = StudentRepo::new(&pool);
        let before = repo.create(student("S1")).await.unwrap();

        let patch = StudentPatch {
            semester: Some(Semester::new(7).unwrap()),
            ..Default::default()
        };
        let after = repo.update("S1", patch).await.unwrap();

        assert_eq!(after.semester, 7);
        assert_eq!(after.name, before.name);
        assert_eq!(after.email, before.email);
        assert!(after.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn email_can_be_cleared_explicitly() {
        let pool = create_memory_pool().await.unwrap();
        let repo = StudentRepo::new(&pool);
        repo.create(student("S1")).await.unwrap();

        let patch = StudentPatch {
            email: Some(None),
            ..Default::default()
        };
        let after = repo.update("S1", patch).await.unwrap();
        assert_eq!(after.email, None);
    }

    #[tokio::test]
    async fn update_email_clash_is_conflict() {
        let pool = create_memory_pool().await.unwrap();
        let repo = StudentRepo::new(&pool);
        repo.create(student("S1")).await.unwrap();
        repo.create(student("S2")).await.unwrap();

        let patch = StudentPatch {
            email: Some(Some(Email::new("s1@uni.edu").unwrap())),
            ..Default::default()
        };
        let err = repo.update("S2", patch).await.unwrap_err();
        assert!(matches!(err, DbError::DuplicateKey { field: "email", .. }));

        // Re-setting your own email is not a clash.
        let patch = StudentPatch {
            email: Some(Some(Email::new("s1@uni.edu").unwrap())),
            ..Default::default()
        };
        repo.update("S1", patch).await.unwrap();
    }

    #[tokio::test]
    async fn update_missing_student_is_not_found() {
        let pool = create_memory_pool().await.unwrap();
        let err = StudentRepo::new(&pool)
            .update("ghost", StudentPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "student", .. }));
    }

    #[tokio::test]
    async fn delete_cascades_to_enrollments() {
        let pool = create_memory_pool().await.unwrap();
        let students = StudentRepo::new(&pool);
        let courses = CourseRepo::new(&pool);
        students.create(student("S1")).await.unwrap();
        students.create(student("S2")).await.unwrap();
        courses.create(course("C1", "Mon-9")).await.unwrap();

        let enrollments = EnrollmentRepo::new(&pool);
        let c1 = CourseCode::new("C1").unwrap();
        enrollments.enroll(&NationalId::new("S1").unwrap(), &c1).await.unwrap();
        enrollments.enroll(&NationalId::new("S2").unwrap(), &c1).await.unwrap();

        students.delete("S1").await.unwrap();

        let view = courses.with_students("C1").await.unwrap();
        let ids: Vec<_> = view.students.iter().map(|s| s.national_id.as_str()).collect();
        assert_eq!(ids, ["S2"]);

        let (orphans,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM enrollments WHERE student_id = 'S1'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(orphans, 0);

        assert!(matches!(
            students.delete("S1").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn with_courses_orders_by_enrollment() {
        let pool = create_memory_pool().await.unwrap();
        let students = StudentRepo::new(&pool);
        let courses = CourseRepo::new(&pool);
        students.create(student("S1")).await.unwrap();
        courses.create(course("A", "T1")).await.unwrap();
        courses.create(course("B", "T2")).await.unwrap();

        let empty = students.with_courses("S1").await.unwrap();
        assert!(empty.courses.is_empty());

        let enrollments = EnrollmentRepo::new(&pool);
        let s1 = NationalId::new("S1").unwrap();
        enrollments.enroll(&s1, &CourseCode::new("B").unwrap()).await.unwrap();
        enrollments.enroll(&s1, &CourseCode::new("A").unwrap()).await.unwrap();

        let view = students.with_courses("S1").await.unwrap();
        let codes: Vec<_> = view.courses.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, ["B", "A"]);
    }
}
