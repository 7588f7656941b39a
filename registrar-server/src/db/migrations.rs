//! Schema migrations
//!
//! Idempotent: every statement is `IF NOT EXISTS`, so this runs on each
//! startup. The `UNIQUE (student_id, course_code)` constraint on
//! `enrollments` is what arbitrates racing enrollments and must be kept.

use sqlx::SqlitePool;

/// Run all migrations
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    tracing::info!("Running registrar migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            national_id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            email TEXT UNIQUE,
            semester INTEGER NOT NULL CHECK (semester BETWEEN 1 AND 12),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS courses (
            code TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            credits INTEGER NOT NULL CHECK (credits BETWEEN 1 AND 10),
            schedule TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS enrollments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id TEXT NOT NULL
                REFERENCES students(national_id) ON DELETE CASCADE,
            course_code TEXT NOT NULL
                REFERENCES courses(code) ON DELETE CASCADE ON UPDATE CASCADE,
            enrolled_at TEXT NOT NULL,
            UNIQUE (student_id, course_code)
        )
        "#,
    )
    .execute(pool)
    .await?;

    create_indexes(pool).await?;

    tracing::info!("Registrar migrations complete");
    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_students_semester ON students(semester)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_courses_schedule ON courses(schedule)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_enrollments_course ON enrollments(course_code)")
        .execute(pool)
        .await?;

    Ok(())
}
