//! # squadhub-core
//!
//! Core crate for the Squadhub notification pipeline. Contains the trait
//! seams for external collaborators (stores, mail, web push, realtime,
//! user directory, clock), configuration schemas, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other Squadhub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
