pub mod language;
pub mod tracing;
