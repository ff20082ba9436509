//! # squadhub-delivery
//!
//! Channel-level delivery for the Squadhub notification pipeline: one
//! sender per channel behind a closed trait and a registry, the presence
//! oracle that suppresses redundant email/push, the TTL-cached user
//! directory, per-kind email templates, the digest aggregator, the push
//! subscription registry, and the concrete SMTP and Web Push providers.

pub mod cache;
pub mod channel;
pub mod digest;
pub mod directory;
pub mod presence;
pub mod service;
pub mod smtp;
pub mod subscription;
pub mod template;
pub mod webpush;
