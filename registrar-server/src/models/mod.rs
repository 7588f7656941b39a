//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod student;
pub mod course;
pub mod listing;
pub mod patch;

pub use validation::ValidationError;
pub use student::{Email, NationalId, NewStudent, PersonName, Semester, StudentPatch};
pub use course::{CourseCode, CoursePatch, Credits, NewCourse, ScheduleSlot};
pub use listing::Listing;
