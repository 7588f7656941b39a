//! Course field validation

use once_cell::sync::Lazy;
use regex::Regex;

use super::student::PersonName;
use super::validation::{bounded_int, bounded_text};
use super::ValidationError;

/// Maximum length for course codes
const MAX_CODE_LEN: usize = 20;

/// Maximum length for schedule slots
const MAX_SLOT_LEN: usize = 64;

pub const MIN_CREDITS: i64 = 1;
pub const MAX_CREDITS: i64 = 10;

static CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,19}$").expect("invalid course code regex")
});

/// Validated course code (natural primary key)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CourseCode(String);

impl CourseCode {
    /// Create a course code.
    ///
    /// # Rules
    /// - 1 to 20 characters
    /// - ASCII alphanumeric, hyphens, underscores
    /// - Must start with alphanumeric
    ///
    /// # Example
    /// ```
    /// use registrar_server::models::CourseCode;
    ///
    /// assert!(CourseCode::new("MAT-101").is_ok());
    /// assert!(CourseCode::new("MAT 101").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "code" });
        }

        if s.len() > MAX_CODE_LEN {
            return Err(ValidationError::TooLong {
                field: "code",
                max: MAX_CODE_LEN,
            });
        }

        if !CODE_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "code",
                reason: "must be alphanumeric with hyphens/underscores, starting with alphanumeric",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CourseCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Credit count, 1 through 10
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credits(i64);

impl Credits {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        bounded_int("credits", value, MIN_CREDITS, MAX_CREDITS).map(Self)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

/// Opaque schedule-slot label.
///
/// Two courses conflict iff their labels are equal after trimming.
/// No other interpretation is applied (`"Mon-9"` and `"mon-9"` differ).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScheduleSlot(String);

impl ScheduleSlot {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        bounded_text("schedule", s, MAX_SLOT_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated new course
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub code: CourseCode,
    pub name: PersonName,
    pub credits: Credits,
    pub schedule: ScheduleSlot,
}

/// Validated partial update for a course. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct CoursePatch {
    pub code: Option<CourseCode>,
    pub name: Option<PersonName>,
    pub credits: Option<Credits>,
    pub schedule: Option<ScheduleSlot>,
}

impl CoursePatch {
    pub fn is_empty(&self) -> bool {
        self.code.is_none()
            && self.name.is_none()
            && self.credits.is_none()
            && self.schedule.is_none()
    }
}
