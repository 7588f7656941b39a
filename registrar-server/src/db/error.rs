//! Store-level error type

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("{resource} with {field} '{value}' already exists")]
    DuplicateKey {
        resource: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("student '{student_id}' is already enrolled in course '{course_code}'")]
    DuplicateEnrollment {
        student_id: String,
        course_code: String,
    },

    #[error(
        "student '{student_id}' already holds course '{conflicting_course}' in slot '{slot}', \
         which clashes with course '{course_code}'"
    )]
    ScheduleClash {
        student_id: String,
        course_code: String,
        conflicting_course: String,
        slot: String,
    },
}

impl DbError {
    pub(crate) fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }
}

/// True if the error is a UNIQUE or PRIMARY KEY constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

/// True if the error is a unique violation naming `table.column`.
///
/// SQLite reports these as `UNIQUE constraint failed: table.column`.
pub(crate) fn unique_violation_on(err: &sqlx::Error, qualified_column: &str) -> bool {
    err.as_database_error().is_some_and(|db_err| {
        db_err.is_unique_violation() && db_err.message().contains(qualified_column)
    })
}

/// True if SQLite gave up waiting for a lock held by another writer.
///
/// Covers `SQLITE_BUSY`, `SQLITE_LOCKED` and their extended codes.
pub fn is_busy(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| matches!(code & 0xff, 5 | 6))
}
