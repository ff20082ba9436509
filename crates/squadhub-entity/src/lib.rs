//! # squadhub-entity
//!
//! Domain entity models for the Squadhub notification pipeline. Every
//! struct in this crate represents a database table row or a domain value
//! object. All entities derive `Debug`, `Clone`, `Serialize`,
//! `Deserialize`, and database entities additionally derive
//! `sqlx::FromRow`.

pub mod delivery;
pub mod notification;
pub mod presence;
pub mod push;
