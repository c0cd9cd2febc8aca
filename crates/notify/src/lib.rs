//! CoreBank Notifications
//!
//! Outbound SMS/mail messages and the dispatcher boundary. Dispatch is
//! fire-and-forget: the transfer pipeline logs delivery failures and moves
//! on; a settlement outcome never depends on the messaging gateway.

mod dispatcher;
mod message;

pub use dispatcher::{dispatch_or_log, MemoryDispatcher, NotificationDispatcher, NotifyError};
pub use message::{Channel, Notification};
