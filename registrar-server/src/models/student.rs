//! Student field validation

use once_cell::sync::Lazy;
use regex::Regex;

use super::validation::{bounded_int, bounded_text};
use super::ValidationError;

/// Maximum length for national ids
const MAX_NATIONAL_ID_LEN: usize = 20;

/// Maximum length for person names
const MAX_NAME_LEN: usize = 100;

/// Maximum length for email addresses (RFC 5321 path limit)
const MAX_EMAIL_LEN: usize = 254;

pub const MIN_SEMESTER: i64 = 1;
pub const MAX_SEMESTER: i64 = 12;

/// Matches DB usage as primary key: ^[A-Za-z0-9][A-Za-z0-9-]{0,19}$
static NATIONAL_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-]{0,19}$").expect("invalid national id regex")
});

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("invalid email regex")
});

/// Validated student national id (natural primary key)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NationalId(String);

impl NationalId {
    /// Create a national id.
    ///
    /// # Rules
    /// - 1 to 20 characters
    /// - ASCII alphanumeric and hyphens, starting with alphanumeric
    ///
    /// # Example
    /// ```
    /// use registrar_server::models::NationalId;
    ///
    /// assert!(NationalId::new("1020-334").is_ok());
    /// assert!(NationalId::new("-1020").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "national_id" });
        }

        if s.len() > MAX_NATIONAL_ID_LEN {
            return Err(ValidationError::TooLong {
                field: "national_id",
                max: MAX_NATIONAL_ID_LEN,
            });
        }

        if !NATIONAL_ID_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "national_id",
                reason: "must be alphanumeric with hyphens, starting with alphanumeric",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NationalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validated display name, shared by students and courses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName(String);

impl PersonName {
    /// Trimmed, non-empty, at most 100 characters.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        bounded_text("name", s, MAX_NAME_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated email address, normalized to lowercase
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = bounded_text("email", s, MAX_EMAIL_LEN)?;

        if !EMAIL_RE.is_match(&trimmed) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "must look like local@domain.tld",
            });
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Semester number, 1 through 12
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Semester(i64);

impl Semester {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        bounded_int("semester", value, MIN_SEMESTER, MAX_SEMESTER).map(Self)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

/// Validated new student
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub national_id: NationalId,
    pub name: PersonName,
    pub email: Option<Email>,
    pub semester: Semester,
}

/// Validated partial update for a student.
///
/// `None` leaves the field untouched. For `email`, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct StudentPatch {
    pub name: Option<PersonName>,
    pub email: Option<Option<Email>>,
    pub semester: Option<Semester>,
}

impl StudentPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.semester.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_national_ids() {
        assert!(NationalId::new("S1").is_ok());
        assert!(NationalId::new("1020334455").is_ok());
        assert!(NationalId::new("ab-12-cd").is_ok());
        assert!(NationalId::new(&"9".repeat(20)).is_ok());
    }

    #[test]
    fn rejects_bad_national_ids() {
        assert!(matches!(
            NationalId::new("").unwrap_err(),
            ValidationError::Empty { .. }
        ));
        assert!(matches!(
            NationalId::new(&"9".repeat(21)).unwrap_err(),
            ValidationError::TooLong { max: 20, .. }
        ));
        assert!(matches!(
            NationalId::new("12 34").unwrap_err(),
            ValidationError::InvalidFormat { .. }
        ));
        assert!(matches!(
            NationalId::new("-1234").unwrap_err(),
            ValidationError::InvalidFormat { .. }
        ));
    }

    #[test]
    fn name_is_trimmed() {
        let name = PersonName::new("  Laura Gómez ").unwrap();
        assert_eq!(name.as_str(), "Laura Gómez");
        assert!(PersonName::new(&"x".repeat(101)).is_err());
    }

    #[test]
    fn email_is_normalized() {
        let email = Email::new(" Laura@Uni.EDU ").unwrap();
        assert_eq!(email.as_str(), "laura@uni.edu");
    }

    #[test]
    fn rejects_bad_emails() {
        for bad in ["laura", "laura@", "@uni.edu", "laura@uni", "la ura@uni.edu"] {
            assert!(
                matches!(Email::new(bad), Err(ValidationError::InvalidFormat { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn semester_bounds() {
        assert!(Semester::new(1).is_ok());
        assert!(Semester::new(12).is_ok());
        assert!(matches!(
            Semester::new(0).unwrap_err(),
            ValidationError::OutOfRange { min: 1, max: 12, value: 0, .. }
        ));
        assert!(Semester::new(13).is_err());
    }

    #[test]
    fn empty_patch() {
        assert!(StudentPatch::default().is_empty());
        let patch = StudentPatch {
            email: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
