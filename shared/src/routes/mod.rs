//! Request routing for the API Gateway Lambdas.
//!
//! Each handler matches `(method, path segments)` and delegates to a service;
//! service errors are turned into status-coded JSON bodies here.

pub mod schedules;
pub mod transcript_lines;

pub use schedules::handle_schedules;
pub use transcript_lines::handle_transcript_lines;
