pub mod enrollments;

pub use enrollments::{EnrollmentsApi, SaveVideoProgress};
