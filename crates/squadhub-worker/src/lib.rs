//! # squadhub-worker
//!
//! The background half of the Squadhub notification pipeline: the
//! polling queue consumer that drains delivery work items, the
//! table-based retry policy it applies on failure, and the cron
//! scheduler that triggers digest runs and subscription sweeps.

pub mod backoff;
pub mod consumer;
pub mod scheduler;
