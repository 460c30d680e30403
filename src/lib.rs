//! Activity timelines for collaborative project management.
//!
//! * `core`: configuration, errors, logging and the database pool
//! * `protocol`: entities, history snapshots, timeline rows and access types
//! * `timeline`: extractor registry, writers, fan-out, hooks and filtered feeds

pub use activity_core as core;
pub use activity_protocol as protocol;
pub use activity_timeline as timeline;

pub use activity_core::{CoreConfig, TimelineError};
pub use activity_protocol::prelude;
pub use activity_timeline::{
    FanOut, Registry, TimelineHooks, TimelineReader, TimelineSink, TimelineStore, TimelineWriter,
};
