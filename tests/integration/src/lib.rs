//! Integration test utilities for the conversation backend
//!
//! Helpers for running end-to-end tests against the REST API and the
//! realtime gateway over real PostgreSQL and Redis.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
