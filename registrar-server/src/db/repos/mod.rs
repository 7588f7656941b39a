//! Repository implementations for database access
//!
//! Each repository borrows the pool and follows these patterns:
//! - Writes run in a single transaction
//! - Composite reads use JOINs (no N+1)
//! - Unique-constraint violations surface as conflicts, never raw errors

pub mod courses;
pub mod enrollments;
pub mod students;

pub use courses::{Course, CourseFilter, CourseRepo, CourseWithStudents};
pub use enrollments::{Enrollment, EnrollmentFilter, EnrollmentRepo};
pub use students::{Student, StudentFilter, StudentRepo, StudentWithCourses};
