//! Trait seams for external collaborators.
//!
//! Each sub-module defines one abstract contract the pipeline consumes:
//! wall-clock time, the user directory, the mail transport, the Web Push
//! provider, and the real-time fan-out transport. Concrete implementations
//! live in `squadhub-delivery`; tests substitute doubles.

pub mod clock;
pub mod directory;
pub mod mailer;
pub mod push;
pub mod realtime;
