mod entitlement;
mod notification;
mod penalty;
mod profile;
mod training_enrollment;
mod training_session;

pub use entitlement::*;
pub use notification::*;
pub use penalty::*;
pub use profile::*;
pub use training_enrollment::*;
pub use training_session::*;
