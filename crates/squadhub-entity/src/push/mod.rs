//! Push subscription entity.

pub mod model;

pub use model::PushSubscription;
