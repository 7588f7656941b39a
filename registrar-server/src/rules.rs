//! Enrollment rule engine
//!
//! Pure decision over a snapshot of a student's current enrollments.
//! Existence of the student and course is checked by the caller before
//! this runs; the caller also performs the insert when the decision is
//! `Ok`. See `db::repos::enrollments::EnrollmentRepo::enroll`.
//!
//! Rule order:
//! 1. schedule clash against any *other* enrolled course with the same slot
//! 2. duplicate enrollment in the target course

/// A course the student already holds, as seen by the rule engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrolledCourse {
    pub code: String,
    pub schedule: String,
}

/// The course the student wants to join.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub code: &'a str,
    pub schedule: &'a str,
}

/// Why an enrollment was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    /// Another enrolled course already occupies the target's slot
    ScheduleClash {
        slot: String,
        conflicting_course: String,
    },

    /// The student is already enrolled in the target course
    DuplicateEnrollment,
}

/// Decide whether `target` may be added to `enrolled`.
///
/// `enrolled` must be in enrollment insertion order; the first clashing
/// course in that order is the one reported.
pub fn evaluate(target: Target<'_>, enrolled: &[EnrolledCourse]) -> Result<(), RuleViolation> {
    if let Some(clash) = enrolled
        .iter()
        .find(|c| c.code != target.code && c.schedule == target.schedule)
    {
        return Err(RuleViolation::ScheduleClash {
            slot: clash.schedule.clone(),
            conflicting_course: clash.code.clone(),
        });
    }

    if enrolled.iter().any(|c| c.code == target.code) {
        return Err(RuleViolation::DuplicateEnrollment);
    }

    Ok(())
}
