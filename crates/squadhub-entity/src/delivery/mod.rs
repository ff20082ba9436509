//! Delivery work item entity.

pub mod model;
pub mod status;

pub use model::DeliveryItem;
pub use status::DeliveryStatus;
