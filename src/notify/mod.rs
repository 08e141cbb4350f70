//! Update notifications: permission handling and deduplicated dispatch.

mod dispatcher;
mod permission;

pub use dispatcher::{
    DispatchOutcome, LogSink, Notification, NotificationDispatcher, NotificationSink,
};
pub use permission::{Permission, PermissionPrompt, StaticPrompt, request_permission};
