//! Activity timeline for the project-management backend.
//!
//! Every tracked mutation becomes a row on the feeds of the project, the actor
//! and the people related to the changed entity. Rows are built by payload
//! extractors looked up in a [`Registry`], written through a [`TimelineSink`]
//! and read back through a [`TimelineReader`] that applies the viewer's
//! project permissions.

mod bulk;
mod dispatch;
pub mod extractors;
mod fanout;
pub mod filter;
mod hooks;
pub mod providers;
mod reader;
mod registry;
mod regenerate;
mod render;
pub mod store;
mod writer;

pub use bulk::{BulkStats, BulkWriter};
pub use dispatch::{Dispatch, DispatchedWriter};
pub use fanout::FanOut;
pub use filter::{apply_viewer_filter, VisibilityFilter};
pub use hooks::TimelineHooks;
pub use providers::{AccessProvider, MemoryDirectory, PgDirectory, UserDirectory};
pub use reader::TimelineReader;
pub use registry::{event_key, Extractor, Registry};
pub use regenerate::{regenerate_user_creation, RegenerationReport};
pub use render::{render_entries, render_payload};
pub use store::{MemoryTimelineStore, PgTimelineStore, TimelineStore};
pub use writer::{TimelineSink, TimelineWriter};
