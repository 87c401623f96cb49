//! Entity lifecycles
//!
//! The server owns every status transition. This module encodes the
//! application transition table the client pre-checks against, which cache
//! scopes a successful move affects, and the job statuses with advisory hints.

pub mod application;
pub mod job;

pub use application::{ApplicationStatus, ApplicationTransition};
pub use job::JobStatus;
