//! State module for crawl jobs and probe outcomes
//!
//! # Components
//!
//! - `JobStatus`: Lifecycle of a crawl job (in progress, completed, limit exceeded, cancelled)
//! - `FailureKind`: Closed taxonomy of request failures recorded on probe results

mod failure_kind;
mod job_status;

// Re-export main types
pub use failure_kind::FailureKind;
pub use job_status::JobStatus;
