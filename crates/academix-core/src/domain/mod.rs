//! Domain types for the Academix client
//!
//! Pure data types and the error taxonomy shared by every layer of the
//! client. Nothing in this module performs I/O.

pub mod course;
pub mod errors;
pub mod session;

pub use course::{ApiEnvelope, Course, CourseDetail, CourseQuery, Enrollment, Lesson};
pub use errors::ApiError;
pub use session::{StoredSession, UserProfile};
