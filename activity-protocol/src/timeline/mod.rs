mod entry;
mod namespace;
mod permissions;

pub use entry::{ExtraData, NewTimelineEntry, TimelineEntry};
pub use namespace::Namespace;
pub use permissions::{permission_for, VIEW_PERMISSIONS};
