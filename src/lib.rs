//! crpt-client - Rate-Limited Document Submission
//!
//! This crate implements a client-side admission-control pipeline for the
//! CRPT document-registration API. A bounded FIFO queue gates submissions
//! and a fixed-delay dispatch loop issues at most `max_requests_per_window`
//! network calls per window, no matter how many callers submit concurrently.

pub mod api;
pub mod config;
pub mod document;
pub mod error;
pub mod submit;
