//! External collaborator traits and their in-memory test doubles.

mod fulfillment;
mod notifications;

pub use fulfillment::{
    FulfillmentError, FulfillmentReceipt, InMemoryVirtualFulfillment, VirtualFulfillment,
};
pub use notifications::{
    LoggingNotifications, NotificationEvent, NotificationSink, RecordingNotifications,
};
