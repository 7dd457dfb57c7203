//! Admission and cancellation of training-session enrollments.

mod clock;
mod gate;
pub mod memory;
pub mod policy;
mod postgres;
mod rejection;
mod store;

#[cfg(test)]
mod tests;

pub use clock::{Clock, SystemClock};
pub use gate::{
    Admission, AdmissionStatus, AttendanceOutcome, CancelOutcome, EnrollmentGate, EnrollmentRequest,
};
pub use postgres::{PgEnrollmentTx, PgNotifier, PgStore};
pub use rejection::{GateError, Rejection, RejectionKind};
pub use store::{EnrollmentStore, EnrollmentTx, EntitlementStore, Notifier, ProfileStore};
