mod enrollment_repository;
mod entitlement_repository;
mod notification_repository;
mod penalty_repository;
mod profile_repository;
mod session_repository;

pub use enrollment_repository::EnrollmentRepository;
pub use entitlement_repository::EntitlementRepository;
pub use notification_repository::NotificationRepository;
pub use penalty_repository::PenaltyRepository;
pub use profile_repository::ProfileRepository;
pub use session_repository::SessionRepository;
